pub mod assignments;
pub mod attendance;
pub mod batches;
pub mod core;
pub mod courses;
pub mod expenses;
pub mod fees;
pub mod leads;
pub mod staff;
pub mod students;

use crate::entities::OpError;
use crate::ipc::error::{ok, op_err};
use crate::table::{self, SortConfig, SortDirection};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;

/// Sort requested by a list call. An explicit direction wins; a bare key
/// toggles against whatever the table last used.
fn resolve_sort(
    sorts: &mut HashMap<String, SortConfig>,
    family: &str,
    params: &serde_json::Value,
) -> Option<SortConfig> {
    let key = params.get("sortKey").and_then(|v| v.as_str());
    let dir = params
        .get("sortDir")
        .and_then(|v| v.as_str())
        .and_then(|s| match s {
            "ascending" => Some(SortDirection::Ascending),
            "descending" => Some(SortDirection::Descending),
            _ => None,
        });
    match (key, dir) {
        (Some(k), Some(d)) => {
            let cfg = SortConfig {
                key: k.to_string(),
                direction: d,
            };
            sorts.insert(family.to_string(), cfg.clone());
            Some(cfg)
        }
        (Some(k), None) => {
            let cfg = table::request_sort(sorts.get(family), k);
            sorts.insert(family.to_string(), cfg.clone());
            Some(cfg)
        }
        (None, _) => sorts.get(family).cloned(),
    }
}

/// Runs a refreshed collection through the shared search + sort pipeline
/// and returns the rows in render order.
fn derive_rows<T: Serialize>(
    sorts: &mut HashMap<String, SortConfig>,
    family: &str,
    params: &serde_json::Value,
    rows: &[T],
    searchable: &[&str],
) -> Result<Vec<serde_json::Value>, OpError> {
    let items: Vec<serde_json::Value> = rows
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<_, _>>()
        .map_err(|e| OpError::new("internal", e.to_string()))?;
    let term = params
        .get("search")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    let sort = resolve_sort(sorts, family, params);
    Ok(table::derive_view(&items, searchable, term, sort.as_ref()))
}

fn rows_value<T: Serialize>(rows: &[T]) -> Result<serde_json::Value, OpError> {
    serde_json::to_value(rows).map_err(|e| OpError::new("internal", e.to_string()))
}

/// Every mutation refetches its whole list; the refreshed mirror is the
/// response. Centralizes the assign-then-echo step all four verbs share.
fn refreshed<T: Serialize>(
    id: &str,
    family: &str,
    result: Result<Vec<T>, OpError>,
    slot: &mut Vec<T>,
) -> serde_json::Value {
    match result {
        Ok(rows) => {
            *slot = rows;
            match rows_value(slot) {
                Ok(v) => ok(id, json!({ family: v })),
                Err(e) => op_err(id, e),
            }
        }
        Err(e) => op_err(id, e),
    }
}
