use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_orbitd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn orbitd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn error_code(resp: &serde_json::Value) -> &str {
    resp.get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("orbit-router-smoke");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health.get("ok").and_then(|v| v.as_bool()), Some(true));
    assert!(health["result"]["workspacePath"].is_null());

    // Every data method refuses to run before a workspace is selected.
    let early = request(&mut stdin, &mut reader, "2", "students.list", json!({}));
    assert_eq!(early.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(error_code(&early), "no_workspace");

    let selected = request(
        &mut stdin,
        &mut reader,
        "3",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(selected.get("ok").and_then(|v| v.as_bool()), Some(true));

    let families = [
        ("students.list", "students"),
        ("staff.list", "staff"),
        ("courses.list", "courses"),
        ("batches.list", "batches"),
        ("fees.list", "fees"),
        ("expenses.list", "expenses"),
        ("assignments.list", "assignments"),
        ("leads.list", "leads"),
        ("attendance.list", "attendance"),
    ];
    for (i, (method, key)) in families.iter().enumerate() {
        let resp = request(
            &mut stdin,
            &mut reader,
            &format!("list-{}", i),
            method,
            json!({}),
        );
        assert_eq!(
            resp.get("ok").and_then(|v| v.as_bool()),
            Some(true),
            "{} failed: {}",
            method,
            resp
        );
        let rows = resp["result"][key].as_array().expect("rows array");
        assert!(rows.is_empty(), "{} should start empty", method);
    }

    let unknown = request(&mut stdin, &mut reader, "9", "planets.list", json!({}));
    assert_eq!(unknown.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(error_code(&unknown), "not_implemented");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn theme_setting_survives_workspace_reselect() {
    let workspace = temp_dir("orbit-theme");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let initial = request(&mut stdin, &mut reader, "2", "theme.get", json!({}));
    assert_eq!(initial["result"]["theme"], json!("light"));

    let set = request(
        &mut stdin,
        &mut reader,
        "3",
        "theme.set",
        json!({ "theme": "dark" }),
    );
    assert_eq!(set.get("ok").and_then(|v| v.as_bool()), Some(true));

    let bad = request(
        &mut stdin,
        &mut reader,
        "4",
        "theme.set",
        json!({ "theme": "solarized" }),
    );
    assert_eq!(bad.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(error_code(&bad), "bad_params");

    // Reopening the same workspace reads the stored value back.
    let _ = request(
        &mut stdin,
        &mut reader,
        "5",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let after = request(&mut stdin, &mut reader, "6", "theme.get", json!({}));
    assert_eq!(after["result"]["theme"], json!("dark"));

    drop(stdin);
    let _ = child.wait();
}
