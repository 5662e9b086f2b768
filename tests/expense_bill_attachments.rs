use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
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

fn file_exists_under(dir: &Path, file_name: &str) -> bool {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return false;
    };
    for entry in entries.flatten() {
        let p = entry.path();
        if p.is_dir() {
            if file_exists_under(&p, file_name) {
                return true;
            }
        } else if p.file_name().and_then(|n| n.to_str()) == Some(file_name) {
            return true;
        }
    }
    false
}

#[test]
fn expense_bill_replacement_leaves_exactly_one_file() {
    let workspace = temp_dir("orbit-expense-bills");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let first_bill = workspace.join("bill-jan.png");
    std::fs::write(&first_bill, b"not a real png but close enough").expect("write bill");

    let added = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "expenses.add",
        json!({
            "description": "Projector lamp",
            "category": "Equipment",
            "amount": 3200.0,
            "billPath": first_bill.to_string_lossy(),
        }),
    );
    let expense = &added["expenses"][0];
    let bill_url = expense["billUrl"].as_str().expect("billUrl");
    assert!(bill_url.contains("/attachments/"), "url: {}", bill_url);
    assert!(bill_url.ends_with("/bill-jan.png"), "url: {}", bill_url);
    let expense_id = expense["id"].as_str().expect("id").to_string();

    let attachments_root = workspace.join("attachments");
    assert!(file_exists_under(&attachments_root, "bill-jan.png"));

    // The corrected scan replaces the first: new file lands before the
    // old one is removed.
    let second_bill = workspace.join("bill-jan-rescan.png");
    std::fs::write(&second_bill, b"sharper scan").expect("write bill");
    let updated = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "expenses.update",
        json!({
            "id": expense_id,
            "description": "Projector lamp",
            "category": "Equipment",
            "amount": 3200.0,
            "billPath": second_bill.to_string_lossy(),
        }),
    );
    let bill_url = updated["expenses"][0]["billUrl"].as_str().expect("billUrl");
    assert!(bill_url.ends_with("/bill-jan-rescan.png"), "url: {}", bill_url);
    assert!(file_exists_under(&attachments_root, "bill-jan-rescan.png"));
    assert!(
        !file_exists_under(&attachments_root, "bill-jan.png"),
        "old bill should be gone"
    );

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn upload_validation_rejects_wrong_type_and_oversize() {
    let workspace = temp_dir("orbit-upload-validation");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let text_file = workspace.join("bill.txt");
    std::fs::write(&text_file, b"plain text").expect("write file");
    let not_image = request(
        &mut stdin,
        &mut reader,
        "2",
        "expenses.add",
        json!({
            "description": "Stationery",
            "amount": 250.0,
            "billPath": text_file.to_string_lossy(),
        }),
    );
    assert_eq!(not_image.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(not_image["error"]["code"], json!("bad_params"));

    let huge = workspace.join("huge.png");
    let f = std::fs::File::create(&huge).expect("create huge file");
    f.set_len(10 * 1024 * 1024 + 1).expect("grow huge file");
    drop(f);
    let oversize = request(
        &mut stdin,
        &mut reader,
        "3",
        "expenses.add",
        json!({
            "description": "Poster",
            "amount": 900.0,
            "billPath": huge.to_string_lossy(),
        }),
    );
    assert_eq!(oversize.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(oversize["error"]["code"], json!("bad_params"));

    // An assignment file is a document upload: any extension goes,
    // the size ceiling still applies.
    let doc = workspace.join("brief.txt");
    std::fs::write(&doc, b"assignment brief").expect("write file");
    let assignment = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "assignments.add",
        json!({ "title": "Reading list", "filePath": doc.to_string_lossy() }),
    );
    let file_url = assignment["assignments"][0]["fileUrl"]
        .as_str()
        .expect("fileUrl");
    assert!(file_url.ends_with("/brief.txt"), "url: {}", file_url);

    let salary_without_staff = request(
        &mut stdin,
        &mut reader,
        "5",
        "expenses.add",
        json!({ "description": "March payroll", "category": "Salary", "amount": 42000.0 }),
    );
    assert_eq!(
        salary_without_staff.get("ok").and_then(|v| v.as_bool()),
        Some(false)
    );
    assert_eq!(salary_without_staff["error"]["code"], json!("bad_params"));

    drop(stdin);
    let _ = child.wait();
}
