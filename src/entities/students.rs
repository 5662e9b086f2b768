use super::{date_only, lookup_ids, lookup_names, str_field, OpError};
use crate::attach::{self, UploadKind};
use crate::model::{Gender, PersonStatus, Student};
use crate::store::{Expand, ListStore, RawItem};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::path::Path;

pub const LIST_TITLE: &str = "Students";

const EXPAND: &[Expand] = &[
    Expand {
        field: "coursesId",
        into: "courses",
        list: super::courses::LIST_TITLE,
    },
    Expand {
        field: "batchesId",
        into: "batches",
        list: super::batches::LIST_TITLE,
    },
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentInput {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub course_ids: Vec<String>,
    #[serde(default)]
    pub batch_ids: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub admission_date: Option<String>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub image_path: Option<String>,
}

fn list_id(store: &ListStore) -> Result<String, OpError> {
    store
        .ensure_list(LIST_TITLE)
        .map_err(|e| OpError::db("db_query_failed", e))
}

pub fn fetch_all(store: &ListStore) -> Result<Vec<Student>, OpError> {
    let list = list_id(store)?;
    let items = store
        .items(&list, EXPAND)
        .map_err(|e| OpError::db("db_query_failed", e))?;
    items
        .into_iter()
        .map(|item| normalize(store, &list, item))
        .collect()
}

fn normalize(store: &ListStore, list: &str, item: RawItem) -> Result<Student, OpError> {
    let f = &item.fields;
    let name = str_field(f, "Title");
    let image_url = attach::first_attachment_url(store, list, item.id)?
        .unwrap_or_else(|| attach::avatar_url(&name));
    Ok(Student {
        id: item.id.to_string(),
        name,
        email: str_field(f, "emailAddress"),
        phone: str_field(f, "phoneNumber"),
        course_ids: lookup_ids(f, "coursesId"),
        course_names: lookup_names(f, "courses"),
        batch_ids: lookup_ids(f, "batchesId"),
        batch_names: lookup_names(f, "batches"),
        status: PersonStatus::parse(&str_field(f, "status")),
        gender: Gender::parse(&str_field(f, "gender")),
        admission_date: date_only(f, "joinDate"),
        address: str_field(f, "address"),
        image_url,
    })
}

fn fields_for(input: &StudentInput) -> Result<Map<String, Value>, OpError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(OpError::bad_params("name must not be empty"));
    }
    let course_ids = id_numbers(&input.course_ids)?;
    let batch_ids = id_numbers(&input.batch_ids)?;
    let mut fields = Map::new();
    fields.insert("Title".into(), json!(name));
    fields.insert("emailAddress".into(), json!(input.email.trim()));
    fields.insert("phoneNumber".into(), json!(input.phone.trim()));
    fields.insert("gender".into(), json!(parse_gender(&input.gender)));
    fields.insert("address".into(), json!(input.address.trim()));
    fields.insert(
        "status".into(),
        json!(PersonStatus::parse(input.status.as_deref().unwrap_or("Active")).as_str()),
    );
    fields.insert(
        "joinDate".into(),
        json!(input
            .admission_date
            .clone()
            .unwrap_or_else(|| chrono::Local::now().date_naive().to_string())),
    );
    fields.insert("coursesId".into(), json!(course_ids));
    fields.insert("batchesId".into(), json!(batch_ids));
    Ok(fields)
}

fn parse_gender(raw: &Option<String>) -> &'static str {
    Gender::parse(raw.as_deref().unwrap_or("")).as_str()
}

fn id_numbers(ids: &[String]) -> Result<Vec<i64>, OpError> {
    ids.iter().map(|id| super::parse_item_id(id)).collect()
}

pub fn add(store: &ListStore, input: &StudentInput) -> Result<Vec<Student>, OpError> {
    let list = list_id(store)?;
    let fields = fields_for(input)?;
    // Validate the upload before the row exists; a rejected file must not
    // leave a half-created record behind.
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

pub fn update(store: &ListStore, input: &StudentInput) -> Result<Vec<Student>, OpError> {
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
        return Err(OpError::not_found("student not found"));
    }
    if let Some(path) = &input.image_path {
        attach::replace_attachment(store, &list, item_id, Path::new(path), UploadKind::Image)?;
    }
    fetch_all(store)
}

pub fn delete(store: &ListStore, id: &str) -> Result<Vec<Student>, OpError> {
    let item_id = super::parse_item_id(id)?;
    let list = list_id(store)?;
    let deleted = store
        .delete_item(&list, item_id)
        .map_err(|e| OpError::db("db_delete_failed", e).with_details(json!({ "list": LIST_TITLE })))?;
    if !deleted {
        return Err(OpError::not_found("student not found"));
    }
    fetch_all(store)
}
