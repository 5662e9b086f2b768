use crate::entities::attendance;
use crate::ipc::error::{err, ok, op_err};
use crate::ipc::types::{AppState, Request};
use crate::model::PersonType;
use serde_json::json;
use std::collections::BTreeMap;

use super::{derive_rows, refreshed};

const SEARCHABLE: &[&str] = &["personName", "date", "personType"];

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let rows = match attendance::fetch_all(store) {
        Ok(rows) => rows,
        Err(e) => return op_err(&req.id, e),
    };
    state.data.attendance = rows;

    let date = req.params.get("date").and_then(|v| v.as_str());
    let person_type = req
        .params
        .get("personType")
        .and_then(|v| v.as_str())
        .map(PersonType::parse);
    let subset = attendance::filtered(&state.data.attendance, date, person_type);
    match derive_rows(
        &mut state.data.sorts,
        "attendance",
        &req.params,
        &subset,
        SEARCHABLE,
    ) {
        Ok(view) => ok(&req.id, json!({ "attendance": view })),
        Err(e) => op_err(&req.id, e),
    }
}

fn handle_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(date) = req.params.get("date").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing params.date", None);
    };
    let Some(person_type) = req.params.get("personType").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing params.personType", None);
    };
    let records: BTreeMap<String, f64> = match req.params.get("records") {
        Some(v) => match serde_json::from_value(v.clone()) {
            Ok(m) => m,
            Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
        },
        None => return err(&req.id, "bad_params", "missing params.records", None),
    };
    refreshed(
        &req.id,
        "attendance",
        attendance::save(store, date, PersonType::parse(person_type), &records),
        &mut state.data.attendance,
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.list" => Some(handle_list(state, req)),
        "attendance.save" => Some(handle_save(state, req)),
        _ => None,
    }
}
