//! End-to-end runs of the `schemata` binary.

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const USER_SCHEMA: &str = r#"{
    "type": "object",
    "title": "User",
    "keys": {
        "name": {"type": "string", "min": 1},
        "age": {"type": "number", "integer": true, "optional": true}
    }
}"#;

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn schemata() -> Command {
    let mut cmd = Command::cargo_bin("schemata").unwrap();
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

#[test]
fn check_accepts_valid_documents() {
    let dir = TempDir::new().unwrap();
    let schema = write(&dir, "user.json", USER_SCHEMA);
    let doc = write(&dir, "ann.json", r#"{"name": "ann", "age": 31}"#);

    schemata()
        .args(["check", "--schema"])
        .arg(&schema)
        .arg("--input")
        .arg(&doc)
        .assert()
        .success()
        .stdout(predicate::str::contains("ann.json"));
}

#[test]
fn check_reports_issues_and_exits_one() {
    let dir = TempDir::new().unwrap();
    let schema = write(&dir, "user.json", USER_SCHEMA);
    let doc = write(&dir, "bad.json", r#"{"name": "", "age": 1.5}"#);

    schemata()
        .args(["check", "--schema"])
        .arg(&schema)
        .arg("--input")
        .arg(&doc)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("[string.min]"))
        .stdout(predicate::str::contains("[number.integer]"));
}

#[test]
fn check_abort_early_keeps_one_issue() {
    let dir = TempDir::new().unwrap();
    let schema = write(&dir, "user.json", USER_SCHEMA);
    let doc = write(&dir, "bad.json", r#"{"name": "", "age": 1.5}"#);

    schemata()
        .args(["check", "--abort-early", "--schema"])
        .arg(&schema)
        .arg("--input")
        .arg(&doc)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("[string.min]"))
        .stdout(predicate::str::contains("[number.integer]").not());
}

#[test]
fn check_json_format_emits_one_line_per_record() {
    let dir = TempDir::new().unwrap();
    let schema = write(&dir, "user.json", USER_SCHEMA);
    let docs = write(&dir, "users.ndjson", "{\"name\": \"ann\"}\n\n{\"age\": 2}\n");

    let output = schemata()
        .args(["check", "--ndjson", "--format", "json", "--schema"])
        .arg(&schema)
        .arg("--input")
        .arg(&docs)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let lines: Vec<serde_json::Value> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["ok"], true);
    assert_eq!(lines[0]["value"], serde_json::json!({"name": "ann"}));
    assert_eq!(lines[1]["ok"], false);
    assert_eq!(lines[1]["issues"][0]["code"], "any.required");
    assert!(lines[1]["source"].as_str().unwrap().ends_with("users.ndjson:3"));
}

#[test]
fn check_with_custom_messages() {
    let dir = TempDir::new().unwrap();
    let schema = write(&dir, "user.json", USER_SCHEMA);
    let prefs = write(&dir, "prefs.json", r#"{"messages": {"string.min": "{{#label}} is too short"}}"#);
    let doc = write(&dir, "bad.json", r#"{"name": ""}"#);

    schemata()
        .args(["check", "--schema"])
        .arg(&schema)
        .arg("--prefs")
        .arg(&prefs)
        .arg("--input")
        .arg(&doc)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"name\" is too short"));
}

#[test]
fn describe_prints_hint_and_manifest() {
    let dir = TempDir::new().unwrap();
    let schema = write(&dir, "user.json", USER_SCHEMA);

    schemata()
        .args(["describe", "--schema"])
        .arg(&schema)
        .assert()
        .success()
        .stdout(predicate::str::contains("name: string"))
        .stdout(predicate::str::contains("\"title\": \"User\""));
}

#[test]
fn bad_descriptor_exits_two() {
    let dir = TempDir::new().unwrap();
    let schema = write(&dir, "broken.json", r#"{"type": "strin"}"#);

    schemata()
        .args(["describe", "--schema"])
        .arg(&schema)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid schema descriptor"));
}

#[test]
fn missing_glob_matches_exit_two() {
    let dir = TempDir::new().unwrap();
    let schema = write(&dir, "user.json", USER_SCHEMA);
    let pattern = dir.path().join("*.nothing");

    schemata()
        .args(["check", "--schema"])
        .arg(&schema)
        .arg("--input")
        .arg(pattern)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("matched no files"));
}
