use super::{date_only, lookup_id, lookup_name, str_field, OpError};
use crate::model::{Batch, BatchStatus, Weekday};
use crate::store::{Expand, ListStore, RawItem};
use serde::Deserialize;
use serde_json::{json, Map, Value};

pub const LIST_TITLE: &str = "Batches";

const EXPAND: &[Expand] = &[
    Expand {
        field: "CourseId",
        into: "Course",
        list: super::courses::LIST_TITLE,
    },
    Expand {
        field: "TrainerId",
        into: "Trainer",
        list: super::staff::LIST_TITLE,
    },
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchInput {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub course_id: String,
    // The trainer/expertise pairing is a selection-level concern of the
    // front end; the data layer stores whatever it is given.
    #[serde(default)]
    pub staff_id: Option<String>,
    #[serde(default)]
    pub weekdays: Vec<String>,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

fn list_id(store: &ListStore) -> Result<String, OpError> {
    store
        .ensure_list(LIST_TITLE)
        .map_err(|e| OpError::db("db_query_failed", e))
}

pub fn fetch_all(store: &ListStore) -> Result<Vec<Batch>, OpError> {
    let list = list_id(store)?;
    let items = store
        .items(&list, EXPAND)
        .map_err(|e| OpError::db("db_query_failed", e))?;
    Ok(items.into_iter().map(normalize).collect())
}

fn normalize(item: RawItem) -> Batch {
    let f = &item.fields;
    let weekdays = match f.get("Weekdays") {
        Some(Value::Array(arr)) => arr
            .iter()
            .filter_map(Value::as_str)
            .map(Weekday::parse)
            .collect(),
        _ => Vec::new(),
    };
    Batch {
        id: item.id.to_string(),
        name: str_field(f, "Title"),
        course_id: lookup_id(f, "CourseId"),
        course_name: lookup_name(f, "Course"),
        staff_id: lookup_id(f, "TrainerId"),
        staff_name: lookup_name(f, "Trainer"),
        weekdays,
        time: str_field(f, "Time"),
        start_date: date_only(f, "StartDate"),
        status: BatchStatus::parse(&str_field(f, "Status")),
    }
}

fn fields_for(input: &BatchInput) -> Result<Map<String, Value>, OpError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(OpError::bad_params("name must not be empty"));
    }
    let course_id = super::parse_item_id(&input.course_id)?;
    let trainer_id = input
        .staff_id
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(super::parse_item_id)
        .transpose()?;
    let weekdays: Vec<&str> = input
        .weekdays
        .iter()
        .map(|d| Weekday::parse(d).as_str())
        .collect();
    let mut fields = Map::new();
    fields.insert("Title".into(), json!(name));
    fields.insert("CourseId".into(), json!(course_id));
    fields.insert(
        "TrainerId".into(),
        trainer_id.map(|id| json!(id)).unwrap_or(Value::Null),
    );
    fields.insert("Weekdays".into(), json!(weekdays));
    fields.insert("Time".into(), json!(input.time.trim()));
    fields.insert(
        "StartDate".into(),
        json!(input
            .start_date
            .clone()
            .unwrap_or_else(|| chrono::Local::now().date_naive().to_string())),
    );
    fields.insert(
        "Status".into(),
        json!(BatchStatus::parse(input.status.as_deref().unwrap_or("")).as_str()),
    );
    Ok(fields)
}

pub fn add(store: &ListStore, input: &BatchInput) -> Result<Vec<Batch>, OpError> {
    let list = list_id(store)?;
    let fields = fields_for(input)?;
    store
        .add_item(&list, &fields)
        .map_err(|e| OpError::db("db_insert_failed", e).with_details(json!({ "list": LIST_TITLE })))?;
    fetch_all(store)
}

pub fn update(store: &ListStore, input: &BatchInput) -> Result<Vec<Batch>, OpError> {
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
        return Err(OpError::not_found("batch not found"));
    }
    fetch_all(store)
}

pub fn delete(store: &ListStore, id: &str) -> Result<Vec<Batch>, OpError> {
    let item_id = super::parse_item_id(id)?;
    let list = list_id(store)?;
    let deleted = store
        .delete_item(&list, item_id)
        .map_err(|e| OpError::db("db_delete_failed", e).with_details(json!({ "list": LIST_TITLE })))?;
    if !deleted {
        return Err(OpError::not_found("batch not found"));
    }
    fetch_all(store)
}
