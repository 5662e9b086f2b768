use crate::entities::fees;
use crate::ipc::error::{err, ok, op_err};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

use super::{derive_rows, refreshed};

const SEARCHABLE: &[&str] = &["studentName", "status", "paymentMethod", "date"];

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let rows = match fees::fetch_all(store) {
        Ok(rows) => rows,
        Err(e) => return op_err(&req.id, e),
    };
    state.data.fees = rows;
    match derive_rows(
        &mut state.data.sorts,
        "fees",
        &req.params,
        &state.data.fees,
        SEARCHABLE,
    ) {
        Ok(view) => ok(&req.id, json!({ "fees": view })),
        Err(e) => op_err(&req.id, e),
    }
}

fn handle_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let input: fees::FeePaymentInput = match serde_json::from_value(req.params.clone()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    refreshed(
        &req.id,
        "fees",
        fees::add(store, &input),
        &mut state.data.fees,
    )
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let input: fees::FeePaymentInput = match serde_json::from_value(req.params.clone()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    refreshed(
        &req.id,
        "fees",
        fees::update(store, &input),
        &mut state.data.fees,
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
        "fees",
        fees::delete(store, id),
        &mut state.data.fees,
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "fees.list" => Some(handle_list(state, req)),
        "fees.add" => Some(handle_add(state, req)),
        "fees.update" => Some(handle_update(state, req)),
        "fees.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}
