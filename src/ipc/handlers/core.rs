use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Mirror, Request};
use crate::store::ListStore;
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };
    let origin = req
        .params
        .get("origin")
        .and_then(|v| v.as_str())
        .unwrap_or_default();

    match ListStore::open(&path, origin) {
        Ok(store) => {
            state.workspace = Some(path.clone());
            state.store = Some(store);
            // Stale mirrors from a previous workspace must not leak through.
            state.data = Mirror::default();
            ok(&req.id, json!({ "workspacePath": path.to_string_lossy() }))
        }
        Err(e) => err(&req.id, "db_open_failed", format!("{e:?}"), None),
    }
}

fn handle_theme_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match store.setting_get("theme") {
        Ok(v) => {
            let theme = v
                .as_ref()
                .and_then(|t| t.as_str())
                .unwrap_or("light")
                .to_string();
            ok(&req.id, json!({ "theme": theme }))
        }
        Err(e) => err(&req.id, "db_query_failed", format!("{e:?}"), None),
    }
}

fn handle_theme_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let theme = req.params.get("theme").and_then(|v| v.as_str());
    let Some(theme @ ("light" | "dark")) = theme else {
        return err(&req.id, "bad_params", "theme must be \"light\" or \"dark\"", None);
    };
    match store.setting_set("theme", &json!(theme)) {
        Ok(()) => ok(&req.id, json!({ "theme": theme })),
        Err(e) => err(&req.id, "db_update_failed", format!("{e:?}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "theme.get" => Some(handle_theme_get(state, req)),
        "theme.set" => Some(handle_theme_set(state, req)),
        _ => None,
    }
}
