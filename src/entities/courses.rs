use super::{num_field, str_field, OpError};
use crate::model::Course;
use crate::store::{ListStore, RawItem};
use serde::Deserialize;
use serde_json::{json, Map, Value};

pub const LIST_TITLE: &str = "Courses";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseInput {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub total_fee: f64,
}

fn list_id(store: &ListStore) -> Result<String, OpError> {
    store
        .ensure_list(LIST_TITLE)
        .map_err(|e| OpError::db("db_query_failed", e))
}

pub fn fetch_all(store: &ListStore) -> Result<Vec<Course>, OpError> {
    let list = list_id(store)?;
    let items = store
        .items(&list, &[])
        .map_err(|e| OpError::db("db_query_failed", e))?;
    Ok(items.into_iter().map(normalize).collect())
}

fn normalize(item: RawItem) -> Course {
    let f = &item.fields;
    Course {
        id: item.id.to_string(),
        name: str_field(f, "Title"),
        category: str_field(f, "category"),
        level: str_field(f, "level"),
        duration: str_field(f, "duration"),
        total_fee: num_field(f, "totalFee"),
    }
}

fn fields_for(input: &CourseInput) -> Result<Map<String, Value>, OpError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(OpError::bad_params("name must not be empty"));
    }
    if input.total_fee < 0.0 {
        return Err(OpError::bad_params("totalFee must not be negative"));
    }
    let mut fields = Map::new();
    fields.insert("Title".into(), json!(name));
    fields.insert("category".into(), json!(input.category.trim()));
    fields.insert("level".into(), json!(input.level.trim()));
    fields.insert("duration".into(), json!(input.duration.trim()));
    fields.insert("totalFee".into(), json!(input.total_fee));
    Ok(fields)
}

pub fn add(store: &ListStore, input: &CourseInput) -> Result<Vec<Course>, OpError> {
    let list = list_id(store)?;
    let fields = fields_for(input)?;
    store
        .add_item(&list, &fields)
        .map_err(|e| OpError::db("db_insert_failed", e).with_details(json!({ "list": LIST_TITLE })))?;
    fetch_all(store)
}

pub fn update(store: &ListStore, input: &CourseInput) -> Result<Vec<Course>, OpError> {
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
        return Err(OpError::not_found("course not found"));
    }
    fetch_all(store)
}

/// No cascade: batches, assignments and leads referencing the course keep
/// their now-dangling id and render "N/A".
pub fn delete(store: &ListStore, id: &str) -> Result<Vec<Course>, OpError> {
    let item_id = super::parse_item_id(id)?;
    let list = list_id(store)?;
    let deleted = store
        .delete_item(&list, item_id)
        .map_err(|e| OpError::db("db_delete_failed", e).with_details(json!({ "list": LIST_TITLE })))?;
    if !deleted {
        return Err(OpError::not_found("course not found"));
    }
    fetch_all(store)
}
