use super::{date_only, lookup_ids, lookup_names, num_field, str_field, OpError};
use crate::attach::{self, UploadKind};
use crate::ids;
use crate::model::{EmploymentType, Gender, PersonStatus, SalaryType, Staff, StaffRole};
use crate::store::{Expand, ListStore, RawItem};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::path::Path;

pub const LIST_TITLE: &str = "Staff";

/// Prefix of the human-readable staff code carried alongside the backend
/// item id.
pub const CODE_PREFIX: &str = "TSO-STF";

const EXPAND: &[Expand] = &[Expand {
    field: "ExpertiseId",
    into: "Expertise",
    list: super::courses::LIST_TITLE,
}];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffInput {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub expertise: Vec<String>,
    #[serde(default)]
    pub employment_type: Option<String>,
    #[serde(default)]
    pub salary: f64,
    #[serde(default)]
    pub salary_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub joining_date: Option<String>,
    #[serde(default)]
    pub about: String,
    #[serde(default)]
    pub image_path: Option<String>,
}

fn list_id(store: &ListStore) -> Result<String, OpError> {
    store
        .ensure_list(LIST_TITLE)
        .map_err(|e| OpError::db("db_query_failed", e))
}

pub fn fetch_all(store: &ListStore) -> Result<Vec<Staff>, OpError> {
    let list = list_id(store)?;
    let items = store
        .items(&list, EXPAND)
        .map_err(|e| OpError::db("db_query_failed", e))?;
    items
        .into_iter()
        .map(|item| normalize(store, &list, item))
        .collect()
}

fn normalize(store: &ListStore, list: &str, item: RawItem) -> Result<Staff, OpError> {
    let f = &item.fields;
    let name = str_field(f, "Title");
    let image_url = attach::first_attachment_url(store, list, item.id)?
        .unwrap_or_else(|| attach::avatar_url(&name));
    Ok(Staff {
        id: item.id.to_string(),
        code: str_field(f, "StaffCode"),
        name,
        email: str_field(f, "Email"),
        phone: str_field(f, "Phone"),
        address: str_field(f, "Address"),
        gender: Gender::parse(&str_field(f, "Gender")),
        role: StaffRole::parse(&str_field(f, "Role")),
        expertise: lookup_ids(f, "ExpertiseId"),
        expertise_names: lookup_names(f, "Expertise"),
        employment_type: EmploymentType::parse(&str_field(f, "EmploymentType")),
        salary: num_field(f, "Salary"),
        salary_type: SalaryType::parse(&str_field(f, "SalaryType")),
        status: PersonStatus::parse(&str_field(f, "Status")),
        joining_date: date_only(f, "JoiningDate"),
        about: str_field(f, "About"),
        image_url,
    })
}

fn fields_for(input: &StaffInput) -> Result<Map<String, Value>, OpError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(OpError::bad_params("name must not be empty"));
    }
    if input.salary < 0.0 {
        return Err(OpError::bad_params("salary must not be negative"));
    }
    let expertise: Vec<i64> = input
        .expertise
        .iter()
        .map(|id| super::parse_item_id(id))
        .collect::<Result<_, _>>()?;
    let mut fields = Map::new();
    fields.insert("Title".into(), json!(name));
    fields.insert("Email".into(), json!(input.email.trim()));
    fields.insert("Phone".into(), json!(input.phone.trim()));
    fields.insert("Address".into(), json!(input.address.trim()));
    fields.insert(
        "Gender".into(),
        json!(Gender::parse(input.gender.as_deref().unwrap_or("")).as_str()),
    );
    fields.insert(
        "Role".into(),
        json!(StaffRole::parse(input.role.as_deref().unwrap_or("")).as_str()),
    );
    fields.insert("ExpertiseId".into(), json!(expertise));
    fields.insert(
        "EmploymentType".into(),
        json!(EmploymentType::parse(input.employment_type.as_deref().unwrap_or("")).as_str()),
    );
    fields.insert("Salary".into(), json!(input.salary));
    fields.insert(
        "SalaryType".into(),
        json!(SalaryType::parse(input.salary_type.as_deref().unwrap_or("")).as_str()),
    );
    fields.insert(
        "Status".into(),
        json!(PersonStatus::parse(input.status.as_deref().unwrap_or("Active")).as_str()),
    );
    fields.insert(
        "JoiningDate".into(),
        json!(input
            .joining_date
            .clone()
            .unwrap_or_else(|| chrono::Local::now().date_naive().to_string())),
    );
    fields.insert("About".into(), json!(input.about.trim()));
    Ok(fields)
}

pub fn add(store: &ListStore, input: &StaffInput) -> Result<Vec<Staff>, OpError> {
    let list = list_id(store)?;
    let mut fields = fields_for(input)?;

    // The code is minted from the currently-loaded items (max-plus-one).
    let current = fetch_all(store)?;
    let code = ids::next_code(CODE_PREFIX, current.iter().map(|s| s.code.as_str()));
    fields.insert("StaffCode".into(), json!(code));

    if let Some(path) = &input.image_path {
        attach::validate_upload(Path::new(path), UploadKind::Image)?;
    }
    let item_id = store
        .add_item(&list, &fields)
        .map_err(|e| OpError::db("db_insert_failed", e).with_details(json!({ "list": LIST_TITLE })))?;
    if let Some(path) = &input.image_path {
        attach::replace_attachment(store, &list, item_id, Path::new(path), UploadKind::Image)?;
    }
    fetch_all(store)
}

pub fn update(store: &ListStore, input: &StaffInput) -> Result<Vec<Staff>, OpError> {
    let id = input
        .id
        .as_deref()
        .ok_or_else(|| OpError::bad_params("missing id"))?;
    let item_id = super::parse_item_id(id)?;
    let list = list_id(store)?;
    // StaffCode is assigned once at creation and never rewritten.
    let fields = fields_for(input)?;
    let updated = store
        .update_item(&list, item_id, &fields)
        .map_err(|e| OpError::db("db_update_failed", e).with_details(json!({ "list": LIST_TITLE })))?;
    if !updated {
        return Err(OpError::not_found("staff member not found"));
    }
    if let Some(path) = &input.image_path {
        attach::replace_attachment(store, &list, item_id, Path::new(path), UploadKind::Image)?;
    }
    fetch_all(store)
}

pub fn delete(store: &ListStore, id: &str) -> Result<Vec<Staff>, OpError> {
    let item_id = super::parse_item_id(id)?;
    let list = list_id(store)?;
    let deleted = store
        .delete_item(&list, item_id)
        .map_err(|e| OpError::db("db_delete_failed", e).with_details(json!({ "list": LIST_TITLE })))?;
    if !deleted {
        return Err(OpError::not_found("staff member not found"));
    }
    fetch_all(store)
}
