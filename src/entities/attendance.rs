use super::{date_only, num_field, str_field, OpError};
use crate::model::{AttendanceRecord, PersonType};
use crate::store::{ListStore, RawItem};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};

pub const LIST_TITLE: &str = "Attendance";

fn list_id(store: &ListStore) -> Result<String, OpError> {
    store
        .ensure_list(LIST_TITLE)
        .map_err(|e| OpError::db("db_query_failed", e))
}

pub fn fetch_all(store: &ListStore) -> Result<Vec<AttendanceRecord>, OpError> {
    let list = list_id(store)?;
    let items = store
        .items(&list, &[])
        .map_err(|e| OpError::db("db_query_failed", e))?;
    let names = person_names(store)?;
    Ok(items
        .into_iter()
        .map(|item| normalize(item, &names))
        .collect())
}

/// Person names come from whichever roster the record's type points at;
/// a deleted person shows as "N/A", never an error.
fn person_names(store: &ListStore) -> Result<HashMap<(PersonType, String), String>, OpError> {
    let mut names = HashMap::new();
    for (person_type, title) in [
        (PersonType::Student, super::students::LIST_TITLE),
        (PersonType::Staff, super::staff::LIST_TITLE),
    ] {
        let list = store
            .ensure_list(title)
            .map_err(|e| OpError::db("db_query_failed", e))?;
        let items = store
            .items(&list, &[])
            .map_err(|e| OpError::db("db_query_failed", e))?;
        for item in items {
            names.insert(
                (person_type, item.id.to_string()),
                str_field(&item.fields, "Title"),
            );
        }
    }
    Ok(names)
}

fn normalize(item: RawItem, names: &HashMap<(PersonType, String), String>) -> AttendanceRecord {
    let f = &item.fields;
    let person_type = PersonType::parse(&str_field(f, "PersonType"));
    let person_id = str_field(f, "PersonId");
    let person_name = names
        .get(&(person_type, person_id.clone()))
        .cloned()
        .unwrap_or_else(|| "N/A".to_string());
    AttendanceRecord {
        id: item.id.to_string(),
        date: date_only(f, "Date"),
        person_type,
        person_id,
        person_name,
        hours_present: num_field(f, "HoursPresent"),
    }
}

/// Upserts one day's sheet for one person type. Zero-hour entries are
/// stored as real records: an explicit zero is a statement, not an
/// omission. People absent from `records` are left untouched.
pub fn save(
    store: &ListStore,
    date: &str,
    person_type: PersonType,
    records: &BTreeMap<String, f64>,
) -> Result<Vec<AttendanceRecord>, OpError> {
    let date = super::normalize_date(date);
    if date.is_empty() {
        return Err(OpError::bad_params("date must be YYYY-MM-DD"));
    }
    for hours in records.values() {
        if *hours < 0.0 || hours.is_nan() {
            return Err(OpError::bad_params("hours must be a non-negative number"));
        }
    }

    let list = list_id(store)?;
    let existing = store
        .items(&list, &[])
        .map_err(|e| OpError::db("db_query_failed", e))?;
    let mut by_person: BTreeMap<String, i64> = BTreeMap::new();
    for item in &existing {
        let f = &item.fields;
        if date_only(f, "Date") == date
            && PersonType::parse(&str_field(f, "PersonType")) == person_type
        {
            by_person.insert(str_field(f, "PersonId"), item.id);
        }
    }

    for (person_id, hours) in records {
        let mut fields = Map::new();
        fields.insert("Title".into(), json!(format!("{} {}", date, person_id)));
        fields.insert("Date".into(), json!(date));
        fields.insert("PersonType".into(), json!(person_type.as_str()));
        fields.insert("PersonId".into(), json!(person_id));
        fields.insert("HoursPresent".into(), json!(hours));
        match by_person.get(person_id) {
            Some(item_id) => {
                store.update_item(&list, *item_id, &fields).map_err(|e| {
                    OpError::db("db_update_failed", e).with_details(json!({ "list": LIST_TITLE }))
                })?;
            }
            None => {
                store.add_item(&list, &fields).map_err(|e| {
                    OpError::db("db_insert_failed", e).with_details(json!({ "list": LIST_TITLE }))
                })?;
            }
        }
    }
    fetch_all(store)
}

pub fn filtered(
    all: &[AttendanceRecord],
    date: Option<&str>,
    person_type: Option<PersonType>,
) -> Vec<AttendanceRecord> {
    all.iter()
        .filter(|r| date.map(|d| r.date == d).unwrap_or(true))
        .filter(|r| person_type.map(|t| r.person_type == t).unwrap_or(true))
        .cloned()
        .collect()
}
