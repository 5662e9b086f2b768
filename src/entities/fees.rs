use super::{date_only, lookup_id, lookup_name, num_field, opt_str_field, str_field, OpError};
use crate::model::{FeePayment, FeeStatus, PaymentMethod};
use crate::store::{Expand, ListStore, RawItem};
use serde::Deserialize;
use serde_json::{json, Map, Value};

pub const LIST_TITLE: &str = "FeePayments";

const EXPAND: &[Expand] = &[Expand {
    field: "StudentId",
    into: "Student",
    list: super::students::LIST_TITLE,
}];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeePaymentInput {
    #[serde(default)]
    pub id: Option<String>,
    pub student_id: String,
    pub amount: f64,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
}

fn list_id(store: &ListStore) -> Result<String, OpError> {
    store
        .ensure_list(LIST_TITLE)
        .map_err(|e| OpError::db("db_query_failed", e))
}

pub fn fetch_all(store: &ListStore) -> Result<Vec<FeePayment>, OpError> {
    let list = list_id(store)?;
    let items = store
        .items(&list, EXPAND)
        .map_err(|e| OpError::db("db_query_failed", e))?;
    Ok(items.into_iter().map(normalize).collect())
}

fn normalize(item: RawItem) -> FeePayment {
    let f = &item.fields;
    FeePayment {
        id: item.id.to_string(),
        student_id: lookup_id(f, "StudentId"),
        student_name: lookup_name(f, "Student"),
        amount: num_field(f, "Amount"),
        date: date_only(f, "Date"),
        status: FeeStatus::parse(&str_field(f, "Status")),
        payment_method: PaymentMethod::parse(&str_field(f, "PaymentMethod")),
        comments: opt_str_field(f, "Comments"),
    }
}

fn fields_for(input: &FeePaymentInput) -> Result<Map<String, Value>, OpError> {
    let student_id = super::parse_item_id(&input.student_id)?;
    if input.amount <= 0.0 || input.amount.is_nan() {
        return Err(OpError::bad_params("amount must be a positive number"));
    }
    let mut fields = Map::new();
    fields.insert("Title".into(), json!("Fee Payment"));
    fields.insert("StudentId".into(), json!(student_id));
    fields.insert("Amount".into(), json!(input.amount));
    fields.insert(
        "Date".into(),
        json!(input
            .date
            .clone()
            .unwrap_or_else(|| chrono::Local::now().date_naive().to_string())),
    );
    fields.insert(
        "Status".into(),
        json!(FeeStatus::parse(input.status.as_deref().unwrap_or("")).as_str()),
    );
    fields.insert(
        "PaymentMethod".into(),
        json!(PaymentMethod::parse(input.payment_method.as_deref().unwrap_or("")).as_str()),
    );
    fields.insert(
        "Comments".into(),
        input
            .comments
            .as_deref()
            .map(|c| json!(c.trim()))
            .unwrap_or(Value::Null),
    );
    Ok(fields)
}

pub fn add(store: &ListStore, input: &FeePaymentInput) -> Result<Vec<FeePayment>, OpError> {
    let list = list_id(store)?;
    let fields = fields_for(input)?;
    store
        .add_item(&list, &fields)
        .map_err(|e| OpError::db("db_insert_failed", e).with_details(json!({ "list": LIST_TITLE })))?;
    fetch_all(store)
}

pub fn update(store: &ListStore, input: &FeePaymentInput) -> Result<Vec<FeePayment>, OpError> {
    let id = input
        .id
        .as_deref()
        .ok_or_else(|| OpError::bad_params("missing id"))?;
    let item_id = super::parse_item_id(id)?;
    let list = list_id(store)?;
    let fields = fields_for(input)?;
    let updated = store
        .update_item(&list, item_id, &fields)
        .map_err(|e| OpError::db("db_update_failed", e).with_details(json!({ "list": LIST_TITLE })))?;
    if !updated {
        return Err(OpError::not_found("fee payment not found"));
    }
    fetch_all(store)
}

pub fn delete(store: &ListStore, id: &str) -> Result<Vec<FeePayment>, OpError> {
    let item_id = super::parse_item_id(id)?;
    let list = list_id(store)?;
    let deleted = store
        .delete_item(&list, item_id)
        .map_err(|e| OpError::db("db_delete_failed", e).with_details(json!({ "list": LIST_TITLE })))?;
    if !deleted {
        return Err(OpError::not_found("fee payment not found"));
    }
    fetch_all(store)
}
