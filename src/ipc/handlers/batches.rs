use crate::entities::batches;
use crate::ipc::error::{err, ok, op_err};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

use super::{derive_rows, refreshed};

const SEARCHABLE: &[&str] = &["name", "courseName", "staffName", "status", "time"];

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let rows = match batches::fetch_all(store) {
        Ok(rows) => rows,
        Err(e) => return op_err(&req.id, e),
    };
    state.data.batches = rows;
    match derive_rows(
        &mut state.data.sorts,
        "batches",
        &req.params,
        &state.data.batches,
        SEARCHABLE,
    ) {
        Ok(view) => ok(&req.id, json!({ "batches": view })),
        Err(e) => op_err(&req.id, e),
    }
}

fn handle_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let input: batches::BatchInput = match serde_json::from_value(req.params.clone()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    refreshed(
        &req.id,
        "batches",
        batches::add(store, &input),
        &mut state.data.batches,
    )
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let input: batches::BatchInput = match serde_json::from_value(req.params.clone()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    refreshed(
        &req.id,
        "batches",
        batches::update(store, &input),
        &mut state.data.batches,
    )
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(id) = req.params.get("id").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing params.id", None);
    };
    refreshed(
        &req.id,
        "batches",
        batches::delete(store, id),
        &mut state.data.batches,
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "batches.list" => Some(handle_list(state, req)),
        "batches.add" => Some(handle_add(state, req)),
        "batches.update" => Some(handle_update(state, req)),
        "batches.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}
