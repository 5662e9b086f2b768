use super::{date_only, num_field, opt_str_field, str_field, OpError};
use crate::attach::{self, UploadKind};
use crate::model::{Expense, ExpenseCategory};
use crate::store::{Expand, ListStore, RawItem};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::path::Path;

pub const LIST_TITLE: &str = "Expenses";

const EXPAND: &[Expand] = &[Expand {
    field: "StaffId",
    into: "Staff",
    list: super::staff::LIST_TITLE,
}];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseInput {
    #[serde(default)]
    pub id: Option<String>,
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    pub amount: f64,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub staff_id: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub bill_path: Option<String>,
}

fn list_id(store: &ListStore) -> Result<String, OpError> {
    store
        .ensure_list(LIST_TITLE)
        .map_err(|e| OpError::db("db_query_failed", e))
}

pub fn fetch_all(store: &ListStore) -> Result<Vec<Expense>, OpError> {
    let list = list_id(store)?;
    let items = store
        .items(&list, EXPAND)
        .map_err(|e| OpError::db("db_query_failed", e))?;
    items
        .into_iter()
        .map(|item| normalize(store, &list, item))
        .collect()
}

fn normalize(store: &ListStore, list: &str, item: RawItem) -> Result<Expense, OpError> {
    let f = &item.fields;
    let staff_id = super::lookup_ids(f, "StaffId").into_iter().next();
    let staff_name = f
        .get("Staff")
        .and_then(|v| v.get("Title"))
        .and_then(Value::as_str)
        .map(str::to_string);
    Ok(Expense {
        id: item.id.to_string(),
        description: str_field(f, "Description"),
        category: ExpenseCategory::parse(&str_field(f, "Category")),
        amount: num_field(f, "Amount"),
        date: date_only(f, "Date"),
        staff_id,
        staff_name,
        bill_url: attach::first_attachment_url(store, list, item.id)?,
        comments: opt_str_field(f, "Comments"),
    })
}

fn fields_for(input: &ExpenseInput) -> Result<Map<String, Value>, OpError> {
    let description = input.description.trim();
    if description.is_empty() {
        return Err(OpError::bad_params("description must not be empty"));
    }
    if input.amount <= 0.0 || input.amount.is_nan() {
        return Err(OpError::bad_params("amount must be a positive number"));
    }
    let category = ExpenseCategory::parse(input.category.as_deref().unwrap_or(""));
    let staff_id = input
        .staff_id
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(super::parse_item_id)
        .transpose()?;
    if category == ExpenseCategory::Salary && staff_id.is_none() {
        return Err(OpError::bad_params(
            "staffId is required for Salary expenses",
        ));
    }
    let mut fields = Map::new();
    fields.insert("Title".into(), json!(description));
    fields.insert("Description".into(), json!(description));
    fields.insert("Category".into(), json!(category.as_str()));
    fields.insert("Amount".into(), json!(input.amount));
    fields.insert(
        "Date".into(),
        json!(input
            .date
            .clone()
            .unwrap_or_else(|| chrono::Local::now().date_naive().to_string())),
    );
    fields.insert(
        "StaffId".into(),
        staff_id.map(|id| json!(id)).unwrap_or(Value::Null),
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

pub fn add(store: &ListStore, input: &ExpenseInput) -> Result<Vec<Expense>, OpError> {
    let list = list_id(store)?;
    let fields = fields_for(input)?;
    if let Some(path) = &input.bill_path {
        attach::validate_upload(Path::new(path), UploadKind::Image)?;
    }
    let item_id = store
        .add_item(&list, &fields)
        .map_err(|e| OpError::db("db_insert_failed", e).with_details(json!({ "list": LIST_TITLE })))?;
    if let Some(path) = &input.bill_path {
        attach::replace_attachment(store, &list, item_id, Path::new(path), UploadKind::Image)?;
    }
    fetch_all(store)
}

pub fn update(store: &ListStore, input: &ExpenseInput) -> Result<Vec<Expense>, OpError> {
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
        return Err(OpError::not_found("expense not found"));
    }
    if let Some(path) = &input.bill_path {
        attach::replace_attachment(store, &list, item_id, Path::new(path), UploadKind::Image)?;
    }
    fetch_all(store)
}

pub fn delete(store: &ListStore, id: &str) -> Result<Vec<Expense>, OpError> {
    let item_id = super::parse_item_id(id)?;
    let list = list_id(store)?;
    let deleted = store
        .delete_item(&list, item_id)
        .map_err(|e| OpError::db("db_delete_failed", e).with_details(json!({ "list": LIST_TITLE })))?;
    if !deleted {
        return Err(OpError::not_found("expense not found"));
    }
    fetch_all(store)
}
