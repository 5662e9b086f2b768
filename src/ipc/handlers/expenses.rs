use crate::entities::expenses;
use crate::ipc::error::{err, ok, op_err};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

use super::{derive_rows, refreshed};

const SEARCHABLE: &[&str] = &["description", "category", "staffName", "date"];

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let rows = match expenses::fetch_all(store) {
        Ok(rows) => rows,
        Err(e) => return op_err(&req.id, e),
    };
    state.data.expenses = rows;
    match derive_rows(
        &mut state.data.sorts,
        "expenses",
        &req.params,
        &state.data.expenses,
        SEARCHABLE,
    ) {
        Ok(view) => ok(&req.id, json!({ "expenses": view })),
        Err(e) => op_err(&req.id, e),
    }
}

fn handle_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let input: expenses::ExpenseInput = match serde_json::from_value(req.params.clone()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    refreshed(
        &req.id,
        "expenses",
        expenses::add(store, &input),
        &mut state.data.expenses,
    )
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let input: expenses::ExpenseInput = match serde_json::from_value(req.params.clone()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    refreshed(
        &req.id,
        "expenses",
        expenses::update(store, &input),
        &mut state.data.expenses,
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
        "expenses",
        expenses::delete(store, id),
        &mut state.data.expenses,
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "expenses.list" => Some(handle_list(state, req)),
        "expenses.add" => Some(handle_add(state, req)),
        "expenses.update" => Some(handle_update(state, req)),
        "expenses.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}
