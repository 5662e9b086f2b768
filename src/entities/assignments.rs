use super::{date_only, lookup_id, lookup_name, str_field, OpError};
use crate::attach::{self, UploadKind};
use crate::model::{Assignment, AssignmentStatus};
use crate::store::{Expand, ListStore, RawItem};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::path::Path;

pub const LIST_TITLE: &str = "Assignments";

const EXPAND: &[Expand] = &[
    Expand {
        field: "CourseId",
        into: "Course",
        list: super::courses::LIST_TITLE,
    },
    Expand {
        field: "StudentId",
        into: "Student",
        list: super::students::LIST_TITLE,
    },
    Expand {
        field: "TrainerId",
        into: "Trainer",
        list: super::staff::LIST_TITLE,
    },
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentInput {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub course_id: Option<String>,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub staff_id: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
}

fn list_id(store: &ListStore) -> Result<String, OpError> {
    store
        .ensure_list(LIST_TITLE)
        .map_err(|e| OpError::db("db_query_failed", e))
}

pub fn fetch_all(store: &ListStore) -> Result<Vec<Assignment>, OpError> {
    let list = list_id(store)?;
    let items = store
        .items(&list, EXPAND)
        .map_err(|e| OpError::db("db_query_failed", e))?;
    items
        .into_iter()
        .map(|item| normalize(store, &list, item))
        .collect()
}

fn normalize(store: &ListStore, list: &str, item: RawItem) -> Result<Assignment, OpError> {
    let f = &item.fields;
    Ok(Assignment {
        id: item.id.to_string(),
        title: str_field(f, "Title"),
        course_id: lookup_id(f, "CourseId"),
        course_name: lookup_name(f, "Course"),
        student_id: lookup_id(f, "StudentId"),
        student_name: lookup_name(f, "Student"),
        staff_id: lookup_id(f, "TrainerId"),
        staff_name: lookup_name(f, "Trainer"),
        due_date: date_only(f, "DueDate"),
        status: AssignmentStatus::parse(&str_field(f, "Status")),
        file_url: attach::first_attachment_url(store, list, item.id)?,
    })
}

fn fields_for(input: &AssignmentInput) -> Result<Map<String, Value>, OpError> {
    let title = input.title.trim();
    if title.is_empty() {
        return Err(OpError::bad_params("title must not be empty"));
    }
    let mut fields = Map::new();
    fields.insert("Title".into(), json!(title));
    for (key, raw) in [
        ("CourseId", &input.course_id),
        ("StudentId", &input.student_id),
        ("TrainerId", &input.staff_id),
    ] {
        let id = raw
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(super::parse_item_id)
            .transpose()?;
        fields.insert(key.into(), id.map(|v| json!(v)).unwrap_or(Value::Null));
    }
    fields.insert(
        "DueDate".into(),
        json!(input
            .due_date
            .clone()
            .unwrap_or_else(|| chrono::Local::now().date_naive().to_string())),
    );
    fields.insert(
        "Status".into(),
        json!(AssignmentStatus::parse(input.status.as_deref().unwrap_or("")).as_str()),
    );
    Ok(fields)
}

pub fn add(store: &ListStore, input: &AssignmentInput) -> Result<Vec<Assignment>, OpError> {
    let list = list_id(store)?;
    let fields = fields_for(input)?;
    if let Some(path) = &input.file_path {
        attach::validate_upload(Path::new(path), UploadKind::Document)?;
    }
    let item_id = store
        .add_item(&list, &fields)
        .map_err(|e| OpError::db("db_insert_failed", e).with_details(json!({ "list": LIST_TITLE })))?;
    if let Some(path) = &input.file_path {
        attach::replace_attachment(store, &list, item_id, Path::new(path), UploadKind::Document)?;
    }
    fetch_all(store)
}

pub fn update(store: &ListStore, input: &AssignmentInput) -> Result<Vec<Assignment>, OpError> {
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
        return Err(OpError::not_found("assignment not found"));
    }
    if let Some(path) = &input.file_path {
        attach::replace_attachment(store, &list, item_id, Path::new(path), UploadKind::Document)?;
    }
    fetch_all(store)
}

pub fn delete(store: &ListStore, id: &str) -> Result<Vec<Assignment>, OpError> {
    let item_id = super::parse_item_id(id)?;
    let list = list_id(store)?;
    let deleted = store
        .delete_item(&list, item_id)
        .map_err(|e| OpError::db("db_delete_failed", e).with_details(json!({ "list": LIST_TITLE })))?;
    if !deleted {
        return Err(OpError::not_found("assignment not found"));
    }
    fetch_all(store)
}
