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

#[test]
fn students_crud_roundtrip_with_lookup_expansion() {
    let workspace = temp_dir("orbit-students-crud");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let courses = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "courses.add",
        json!({ "name": "Spoken English Basic", "category": "Language", "level": "Beginner", "duration": "3 months", "totalFee": 4500.0 }),
    );
    let course_id = courses["courses"][0]["id"]
        .as_str()
        .expect("course id")
        .to_string();

    let added = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.add",
        json!({
            "name": "Asha Verma",
            "email": "asha@example.com",
            "phone": "9876500001",
            "courseIds": [course_id],
            "admissionDate": "2026-01-15T00:00:00Z",
        }),
    );
    let students = added["students"].as_array().expect("students");
    assert_eq!(students.len(), 1);
    let asha = &students[0];
    assert_eq!(asha["name"], json!("Asha Verma"));
    assert_eq!(asha["courseNames"], json!(["Spoken English Basic"]));
    assert_eq!(asha["admissionDate"], json!("2026-01-15"));
    assert_eq!(asha["status"], json!("Active"));
    let image = asha["imageUrl"].as_str().expect("imageUrl");
    assert!(image.contains("ui-avatars.com"), "placeholder: {}", image);
    assert!(image.contains("Asha+Verma"), "placeholder: {}", image);
    let asha_id = asha["id"].as_str().expect("student id").to_string();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "students.add",
        json!({ "name": "Bikram Rao", "phone": "9876500002" }),
    );

    let filtered = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "students.list",
        json!({ "search": "ASHA" }),
    );
    let rows = filtered["students"].as_array().expect("rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], json!("Asha Verma"));

    let updated = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "students.update",
        json!({ "id": asha_id, "name": "Asha V.", "status": "Discontinued" }),
    );
    let rows = updated["students"].as_array().expect("rows");
    let asha = rows
        .iter()
        .find(|s| s["id"] == json!(asha_id))
        .expect("updated student");
    assert_eq!(asha["name"], json!("Asha V."));
    assert_eq!(asha["status"], json!("Discontinued"));

    let no_id = request(
        &mut stdin,
        &mut reader,
        "7",
        "students.update",
        json!({ "name": "Nobody" }),
    );
    assert_eq!(no_id.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(no_id["error"]["code"], json!("bad_params"));

    let after_delete = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "students.delete",
        json!({ "id": asha_id }),
    );
    let rows = after_delete["students"].as_array().expect("rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], json!("Bikram Rao"));

    let missing = request(
        &mut stdin,
        &mut reader,
        "9",
        "students.delete",
        json!({ "id": asha_id }),
    );
    assert_eq!(missing.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(missing["error"]["code"], json!("not_found"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn students_list_sort_toggles_on_repeated_key() {
    let workspace = temp_dir("orbit-students-sort");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    for (i, name) in ["Meera", "Arjun", "Zoya"].iter().enumerate() {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            &format!("add-{}", i),
            "students.add",
            json!({ "name": name, "phone": format!("900000000{}", i) }),
        );
    }

    let names = |result: &serde_json::Value| -> Vec<String> {
        result["students"]
            .as_array()
            .expect("rows")
            .iter()
            .map(|s| s["name"].as_str().expect("name").to_string())
            .collect()
    };

    let first = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.list",
        json!({ "sortKey": "name" }),
    );
    assert_eq!(names(&first), vec!["Arjun", "Meera", "Zoya"]);

    // Same key again flips the direction.
    let second = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.list",
        json!({ "sortKey": "name" }),
    );
    assert_eq!(names(&second), vec!["Zoya", "Meera", "Arjun"]);

    // An explicit direction wins over the toggle.
    let explicit = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "students.list",
        json!({ "sortKey": "name", "sortDir": "ascending" }),
    );
    assert_eq!(names(&explicit), vec!["Arjun", "Meera", "Zoya"]);

    drop(stdin);
    let _ = child.wait();
}
