use crate::entities::courses;
use crate::ipc::error::{err, ok, op_err};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

use super::{derive_rows, refreshed};

const SEARCHABLE: &[&str] = &["name", "category", "level", "duration"];

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let rows = match courses::fetch_all(store) {
        Ok(rows) => rows,
        Err(e) => return op_err(&req.id, e),
    };
    state.data.courses = rows;
    match derive_rows(
        &mut state.data.sorts,
        "courses",
        &req.params,
        &state.data.courses,
        SEARCHABLE,
    ) {
        Ok(view) => ok(&req.id, json!({ "courses": view })),
        Err(e) => op_err(&req.id, e),
    }
}

fn handle_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let input: courses::CourseInput = match serde_json::from_value(req.params.clone()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    refreshed(
        &req.id,
        "courses",
        courses::add(store, &input),
        &mut state.data.courses,
    )
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let input: courses::CourseInput = match serde_json::from_value(req.params.clone()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    refreshed(
        &req.id,
        "courses",
        courses::update(store, &input),
        &mut state.data.courses,
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
        "courses",
        courses::delete(store, id),
        &mut state.data.courses,
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "courses.list" => Some(handle_list(state, req)),
        "courses.add" => Some(handle_add(state, req)),
        "courses.update" => Some(handle_update(state, req)),
        "courses.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}
