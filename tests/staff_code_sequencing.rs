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

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn staff_by_name<'a>(result: &'a serde_json::Value, name: &str) -> &'a serde_json::Value {
    result["staff"]
        .as_array()
        .expect("staff rows")
        .iter()
        .find(|s| s["name"] == json!(name))
        .expect("staff row")
}

#[test]
fn staff_codes_are_max_plus_one_and_never_rewritten() {
    let workspace = temp_dir("orbit-staff-codes");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let first = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "staff.add",
        json!({ "name": "Priya Nair", "role": "Trainer", "salary": 42000.0 }),
    );
    assert_eq!(staff_by_name(&first, "Priya Nair")["code"], json!("TSO-STF-001"));

    let second = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "staff.add",
        json!({ "name": "Rahul Menon", "role": "Front Desk" }),
    );
    let rahul = staff_by_name(&second, "Rahul Menon");
    assert_eq!(rahul["code"], json!("TSO-STF-002"));
    assert_eq!(rahul["role"], json!("Front Desk"));
    let rahul_id = rahul["id"].as_str().expect("id").to_string();

    // The counter follows the highest surviving code, so a freed number
    // can be reissued.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "staff.delete",
        json!({ "id": rahul_id }),
    );
    let third = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "staff.add",
        json!({ "name": "Sana Khan" }),
    );
    assert_eq!(staff_by_name(&third, "Sana Khan")["code"], json!("TSO-STF-002"));

    // Updates keep the code assigned at creation.
    let priya_id = staff_by_name(&third, "Priya Nair")["id"]
        .as_str()
        .expect("id")
        .to_string();
    let renamed = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "staff.update",
        json!({ "id": priya_id, "name": "Priya N.", "salary": 45000.0 }),
    );
    assert_eq!(staff_by_name(&renamed, "Priya N.")["code"], json!("TSO-STF-001"));

    let negative = request(
        &mut stdin,
        &mut reader,
        "7",
        "staff.add",
        json!({ "name": "Broke", "salary": -1.0 }),
    );
    assert_eq!(negative.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(negative["error"]["code"], json!("bad_params"));

    drop(stdin);
    let _ = child.wait();
}
