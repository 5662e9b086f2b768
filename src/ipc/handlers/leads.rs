use crate::entities::leads;
use crate::import;
use crate::ipc::error::{err, ok, op_err};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::Path;

use super::{derive_rows, refreshed, rows_value};

const SEARCHABLE: &[&str] = &[
    "name",
    "email",
    "phone",
    "interestedCourseName",
    "source",
    "status",
    "assignedToName",
];

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let rows = match leads::fetch_all(store) {
        Ok(rows) => rows,
        Err(e) => return op_err(&req.id, e),
    };
    state.data.leads = rows;
    match derive_rows(
        &mut state.data.sorts,
        "leads",
        &req.params,
        &state.data.leads,
        SEARCHABLE,
    ) {
        Ok(view) => ok(&req.id, json!({ "leads": view })),
        Err(e) => op_err(&req.id, e),
    }
}

fn handle_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let input: leads::LeadInput = match serde_json::from_value(req.params.clone()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    refreshed(
        &req.id,
        "leads",
        leads::add(store, &input),
        &mut state.data.leads,
    )
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let input: leads::LeadInput = match serde_json::from_value(req.params.clone()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    refreshed(
        &req.id,
        "leads",
        leads::update(store, &input),
        &mut state.data.leads,
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
        "leads",
        leads::delete(store, id),
        &mut state.data.leads,
    )
}

fn handle_add_comment(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(id) = req.params.get("id").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing params.id", None);
    };
    let Some(text) = req.params.get("text").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing params.text", None);
    };
    let author = req
        .params
        .get("authorStaffId")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    refreshed(
        &req.id,
        "leads",
        leads::add_comment(store, id, text, author),
        &mut state.data.leads,
    )
}

fn handle_import_csv(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(path) = req.params.get("path").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };
    let outcome = match import::import_leads(store, Path::new(path)) {
        Ok(o) => o,
        Err(e) => return op_err(&req.id, e),
    };
    let rows = match leads::fetch_all(store) {
        Ok(rows) => rows,
        Err(e) => return op_err(&req.id, e),
    };
    state.data.leads = rows;
    match rows_value(&state.data.leads) {
        Ok(v) => ok(
            &req.id,
            json!({
                "imported": outcome.imported,
                "errors": outcome.errors,
                "leads": v,
            }),
        ),
        Err(e) => op_err(&req.id, e),
    }
}

fn handle_export_template(state: &mut AppState, req: &Request) -> serde_json::Value {
    if state.store.is_none() {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    }
    let Some(path) = req.params.get("path").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };
    match import::export_template(Path::new(path)) {
        Ok(()) => ok(&req.id, json!({ "path": path })),
        Err(e) => op_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "leads.list" => Some(handle_list(state, req)),
        "leads.add" => Some(handle_add(state, req)),
        "leads.update" => Some(handle_update(state, req)),
        "leads.delete" => Some(handle_delete(state, req)),
        "leads.addComment" => Some(handle_add_comment(state, req)),
        "leads.importCsv" => Some(handle_import_csv(state, req)),
        "leads.exportTemplate" => Some(handle_export_template(state, req)),
        _ => None,
    }
}
