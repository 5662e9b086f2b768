use serde_json::{Map, Value};

pub mod assignments;
pub mod attendance;
pub mod batches;
pub mod courses;
pub mod expenses;
pub mod fees;
pub mod leads;
pub mod staff;
pub mod students;

/// Typed operation failure surfaced to the IPC layer. Remote-call errors
/// are never swallowed; every mutation either succeeds or reports one of
/// these.
#[derive(Debug)]
pub struct OpError {
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
}

impl OpError {
    pub fn new(code: &'static str, message: impl Into<String>) -> OpError {
        OpError {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_params(message: impl Into<String>) -> OpError {
        OpError::new("bad_params", message)
    }

    pub fn not_found(message: impl Into<String>) -> OpError {
        OpError::new("not_found", message)
    }

    pub fn db(code: &'static str, err: anyhow::Error) -> OpError {
        OpError::new(code, err.to_string())
    }

    pub fn with_details(mut self, details: Value) -> OpError {
        self.details = Some(details);
        self
    }
}

/// Item ids used for update/delete must be numeric-parseable: the backend
/// keys items by integer id.
pub fn parse_item_id(id: &str) -> Result<i64, OpError> {
    id.trim()
        .parse::<i64>()
        .map_err(|_| OpError::bad_params(format!("id must be numeric: {:?}", id)))
}

pub fn str_field(fields: &Map<String, Value>, key: &str) -> String {
    fields
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

pub fn opt_str_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn num_field(fields: &Map<String, Value>, key: &str) -> f64 {
    match fields.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Dates arrive as date-only strings or full ISO timestamps; the UI and
/// form round-tripping want `YYYY-MM-DD`.
pub fn date_only(fields: &Map<String, Value>, key: &str) -> String {
    let Some(s) = fields.get(key).and_then(Value::as_str) else {
        return String::new();
    };
    normalize_date(s)
}

pub fn normalize_date(s: &str) -> String {
    let t = s.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(t) {
        return dt.date_naive().to_string();
    }
    let head = t.split('T').next().unwrap_or("");
    if chrono::NaiveDate::parse_from_str(head, "%Y-%m-%d").is_ok() {
        head.to_string()
    } else {
        String::new()
    }
}

/// Ids as stored in a raw lookup field (single integer, integer array, or
/// a stringified id), flattened to id strings. Survives dangling
/// references: the id is kept even when expansion found no target.
pub fn lookup_ids(fields: &Map<String, Value>, key: &str) -> Vec<String> {
    match fields.get(key) {
        Some(Value::Number(n)) => vec![n.to_string()],
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        Some(Value::Array(arr)) => arr
            .iter()
            .filter_map(|v| v.as_i64().map(|n| n.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}

/// Titles from an expanded multi-lookup field.
pub fn lookup_names(fields: &Map<String, Value>, expanded_key: &str) -> Vec<String> {
    match fields.get(expanded_key) {
        Some(Value::Array(arr)) => arr
            .iter()
            .filter_map(|v| v.get("Title").and_then(Value::as_str))
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Display name from an expanded single lookup; "N/A" when the reference
/// is unset or dangling.
pub fn lookup_name(fields: &Map<String, Value>, expanded_key: &str) -> String {
    fields
        .get(expanded_key)
        .and_then(|v| v.get("Title"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or("N/A")
        .to_string()
}

/// First id from a single-valued lookup field, empty when unset.
pub fn lookup_id(fields: &Map<String, Value>, key: &str) -> String {
    lookup_ids(fields, key).into_iter().next().unwrap_or_default()
}
