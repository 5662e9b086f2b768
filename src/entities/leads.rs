use super::{date_only, lookup_id, opt_str_field, str_field, OpError};
use crate::model::{Lead, LeadComment, LeadSource, LeadStatus};
use crate::store::{Expand, ListStore, RawItem};
use serde::Deserialize;
use serde_json::{json, Map, Value};

pub const LIST_TITLE: &str = "Leads";

const EXPAND: &[Expand] = &[
    Expand {
        field: "CourseId",
        into: "Course",
        list: super::courses::LIST_TITLE,
    },
    Expand {
        field: "AssignedToId",
        into: "AssignedTo",
        list: super::staff::LIST_TITLE,
    },
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadInput {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone: String,
    pub interested_course_id: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub enquiry_date: Option<String>,
    #[serde(default)]
    pub next_follow_up_date: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
}

fn list_id(store: &ListStore) -> Result<String, OpError> {
    store
        .ensure_list(LIST_TITLE)
        .map_err(|e| OpError::db("db_query_failed", e))
}

pub fn fetch_all(store: &ListStore) -> Result<Vec<Lead>, OpError> {
    let list = list_id(store)?;
    let items = store
        .items(&list, EXPAND)
        .map_err(|e| OpError::db("db_query_failed", e))?;
    Ok(items.into_iter().map(normalize).collect())
}

fn normalize(item: RawItem) -> Lead {
    let f = &item.fields;
    let assigned_to = super::lookup_ids(f, "AssignedToId").into_iter().next();
    let assigned_to_name = f
        .get("AssignedTo")
        .and_then(|v| v.get("Title"))
        .and_then(Value::as_str)
        .map(str::to_string);
    Lead {
        id: item.id.to_string(),
        name: str_field(f, "Title"),
        email: str_field(f, "Email"),
        phone: str_field(f, "Phone"),
        interested_course_id: lookup_id(f, "CourseId"),
        interested_course_name: super::lookup_name(f, "Course"),
        source: LeadSource::parse(&str_field(f, "Source")),
        status: LeadStatus::parse(&str_field(f, "Status")),
        enquiry_date: date_only(f, "EnquiryDate"),
        next_follow_up_date: opt_str_field(f, "NextFollowUpDate").map(|s| super::normalize_date(&s)),
        assigned_to,
        assigned_to_name,
        comments: parse_comments(f.get("Comments")),
    }
}

/// The comment list arrives as a native array, a JSON-encoded string, or
/// not at all. The string form has been observed with raw line breaks
/// inside the encoded text, which plain parsing rejects; those are escaped
/// before the retry. Anything still unreadable becomes an empty list.
pub fn parse_comments(raw: Option<&Value>) -> Vec<LeadComment> {
    let value = match raw {
        None | Some(Value::Null) => return Vec::new(),
        Some(v @ Value::Array(_)) => v.clone(),
        Some(Value::String(s)) => {
            let t = s.trim();
            if t.is_empty() {
                return Vec::new();
            }
            match serde_json::from_str::<Value>(t) {
                Ok(v) => v,
                Err(_) => {
                    let repaired = t.replace('\r', "\\r").replace('\n', "\\n");
                    match serde_json::from_str::<Value>(&repaired) {
                        Ok(v) => v,
                        Err(_) => return Vec::new(),
                    }
                }
            }
        }
        Some(_) => return Vec::new(),
    };
    match value {
        Value::Array(arr) => arr
            .into_iter()
            .filter_map(|v| serde_json::from_value::<LeadComment>(v).ok())
            .collect(),
        _ => Vec::new(),
    }
}

fn fields_for(input: &LeadInput) -> Result<Map<String, Value>, OpError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(OpError::bad_params("name must not be empty"));
    }
    if input.phone.trim().is_empty() {
        return Err(OpError::bad_params("phone must not be empty"));
    }
    let course_id = super::parse_item_id(&input.interested_course_id)?;
    let assigned_to = input
        .assigned_to
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(super::parse_item_id)
        .transpose()?;
    let mut fields = Map::new();
    fields.insert("Title".into(), json!(name));
    fields.insert("Email".into(), json!(input.email.trim()));
    fields.insert("Phone".into(), json!(input.phone.trim()));
    fields.insert("CourseId".into(), json!(course_id));
    fields.insert(
        "Source".into(),
        json!(LeadSource::parse(input.source.as_deref().unwrap_or("")).as_str()),
    );
    fields.insert(
        "Status".into(),
        json!(LeadStatus::parse(input.status.as_deref().unwrap_or("")).as_str()),
    );
    fields.insert(
        "EnquiryDate".into(),
        json!(input
            .enquiry_date
            .clone()
            .unwrap_or_else(|| chrono::Local::now().date_naive().to_string())),
    );
    fields.insert(
        "NextFollowUpDate".into(),
        input
            .next_follow_up_date
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| json!(s))
            .unwrap_or(Value::Null),
    );
    fields.insert(
        "AssignedToId".into(),
        assigned_to.map(|id| json!(id)).unwrap_or(Value::Null),
    );
    Ok(fields)
}

pub fn add(store: &ListStore, input: &LeadInput) -> Result<Vec<Lead>, OpError> {
    let list = list_id(store)?;
    let mut fields = fields_for(input)?;
    fields.insert("Comments".into(), json!("[]"));
    store
        .add_item(&list, &fields)
        .map_err(|e| OpError::db("db_insert_failed", e).with_details(json!({ "list": LIST_TITLE })))?;
    fetch_all(store)
}

/// The comment list is append-only; update never touches it.
pub fn update(store: &ListStore, input: &LeadInput) -> Result<Vec<Lead>, OpError> {
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
        return Err(OpError::not_found("lead not found"));
    }
    fetch_all(store)
}

pub fn add_comment(
    store: &ListStore,
    lead_id: &str,
    text: &str,
    author_staff_id: &str,
) -> Result<Vec<Lead>, OpError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(OpError::bad_params("comment text must not be empty"));
    }
    let item_id = super::parse_item_id(lead_id)?;
    let list = list_id(store)?;
    let item = store
        .get_item(&list, item_id)
        .map_err(|e| OpError::db("db_query_failed", e))?
        .ok_or_else(|| OpError::not_found("lead not found"))?;

    let mut comments = parse_comments(item.fields.get("Comments"));
    comments.push(LeadComment {
        text: text.to_string(),
        author_staff_id: author_staff_id.trim().to_string(),
        timestamp: chrono::Local::now().to_rfc3339(),
    });
    let encoded = serde_json::to_string(&comments)
        .map_err(|e| OpError::new("db_update_failed", e.to_string()))?;

    let mut fields = Map::new();
    fields.insert("Comments".into(), json!(encoded));
    store
        .update_item(&list, item_id, &fields)
        .map_err(|e| OpError::db("db_update_failed", e).with_details(json!({ "list": LIST_TITLE })))?;
    fetch_all(store)
}

pub fn delete(store: &ListStore, id: &str) -> Result<Vec<Lead>, OpError> {
    let item_id = super::parse_item_id(id)?;
    let list = list_id(store)?;
    let deleted = store
        .delete_item(&list, item_id)
        .map_err(|e| OpError::db("db_delete_failed", e).with_details(json!({ "list": LIST_TITLE })))?;
    if !deleted {
        return Err(OpError::not_found("lead not found"));
    }
    fetch_all(store)
}

#[cfg(test)]
mod tests {
    use super::parse_comments;
    use serde_json::json;

    #[test]
    fn missing_and_null_comments_are_empty() {
        assert!(parse_comments(None).is_empty());
        assert!(parse_comments(Some(&json!(null))).is_empty());
        assert!(parse_comments(Some(&json!(""))).is_empty());
    }

    #[test]
    fn native_array_form_is_accepted() {
        let raw = json!([{ "text": "called back", "authorStaffId": "4", "timestamp": "t" }]);
        let parsed = parse_comments(Some(&raw));
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].text, "called back");
        assert_eq!(parsed[0].author_staff_id, "4");
    }

    #[test]
    fn json_string_form_is_accepted() {
        let raw = json!("[{\"text\":\"will visit\",\"authorStaffId\":\"2\",\"timestamp\":\"t\"}]");
        let parsed = parse_comments(Some(&raw));
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].text, "will visit");
    }

    #[test]
    fn embedded_line_breaks_are_tolerated() {
        let raw = json!("[{\"text\":\"line one\nline two\",\"authorStaffId\":\"2\",\"timestamp\":\"t\"}]");
        let parsed = parse_comments(Some(&raw));
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].text, "line one\nline two");
    }

    #[test]
    fn garbage_defaults_to_empty() {
        assert!(parse_comments(Some(&json!("not json at all"))).is_empty());
        assert!(parse_comments(Some(&json!(42))).is_empty());
        assert!(parse_comments(Some(&json!("{\"text\":\"an object, not a list\"}"))).is_empty());
    }
}
