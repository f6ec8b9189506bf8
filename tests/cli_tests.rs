//! End-to-end tests for the turnscope binary.

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// A command with storage isolated to `data_dir` and no user config file.
fn turnscope(data_dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("turnscope").unwrap();
    cmd.env_remove("TURNSCOPE_CONFIG")
        .env_remove("TURNSCOPE_OUTPUT")
        .env_remove("TURNSCOPE_JSON")
        .env("TURNSCOPE_DATA_DIR", data_dir);
    cmd
}

#[test]
fn test_help_lists_commands() {
    let dir = tempfile::tempdir().unwrap();
    turnscope(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("analyze"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("prune"));
}

#[test]
fn test_validate_clean_file() {
    let dir = tempfile::tempdir().unwrap();
    turnscope(dir.path())
        .args(["validate"])
        .arg(fixture_path("simple_session.jsonl"))
        .assert()
        .success()
        .stdout(predicate::str::contains("All lines parsed successfully."));
}

#[test]
fn test_validate_corrupt_file_exits_with_parse_code() {
    let dir = tempfile::tempdir().unwrap();
    turnscope(dir.path())
        .args(["validate"])
        .arg(fixture_path("corrupt_session.jsonl"))
        .assert()
        .code(2)
        .stdout(predicate::str::contains("line 2"));
}

#[test]
fn test_validate_reports_dangling_parent() {
    let dir = tempfile::tempdir().unwrap();
    turnscope(dir.path())
        .args(["--json", "validate"])
        .arg(fixture_path("branching_session.jsonl"))
        .assert()
        .success()
        .stdout(predicate::str::contains("reference a missing parent"));
}

#[test]
fn test_analyze_json_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = turnscope(dir.path())
        .args(["--json", "analyze"])
        .arg(fixture_path("simple_session.jsonl"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["sessions"][0]["id"], "simple");
    assert_eq!(value["sessions"][0]["metrics"]["totalTokens"], 30);
    assert!(value.get("profile").is_none());
}

#[test]
fn test_analyze_strict_rejects_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    turnscope(dir.path())
        .args(["analyze"])
        .arg(fixture_path("corrupt_session.jsonl"))
        .assert()
        .code(2);

    turnscope(dir.path())
        .args(["analyze", "--lenient"])
        .arg(fixture_path("corrupt_session.jsonl"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped 1 malformed line(s)"));
}

#[test]
fn test_analyze_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    turnscope(dir.path())
        .args(["analyze", "no/such/file.jsonl"])
        .assert()
        .code(3);
}

#[test]
fn test_profile_round_trip_through_storage() {
    let dir = tempfile::tempdir().unwrap();

    turnscope(dir.path())
        .args(["analyze", "--user", "dev"])
        .arg(fixture_path("multi_session.jsonl"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Profile 'dev' updated: 2 sessions"));

    turnscope(dir.path())
        .args(["sessions"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alpha"))
        .stdout(predicate::str::contains("beta"));

    let output = turnscope(dir.path())
        .args(["--json", "profile", "dev", "--full"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let profile: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(profile["userId"], "dev");
    assert_eq!(profile["totalSessions"], 2);
}

#[test]
fn test_profile_unknown_user_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    turnscope(dir.path())
        .args(["profile", "nobody"])
        .assert()
        .code(64);
}

#[test]
fn test_prune_deletes_old_sessions() {
    let dir = tempfile::tempdir().unwrap();

    turnscope(dir.path())
        .args(["analyze", "--save"])
        .arg(fixture_path("simple_session.jsonl"))
        .assert()
        .success();

    turnscope(dir.path())
        .args(["--json", "prune", "--older-than", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"deleted\":1"));

    turnscope(dir.path())
        .args(["sessions"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No stored sessions."));
}

#[test]
fn test_prune_requires_retention() {
    let dir = tempfile::tempdir().unwrap();
    turnscope(dir.path()).args(["prune"]).assert().code(64);
}

#[test]
fn test_completions() {
    let dir = tempfile::tempdir().unwrap();
    turnscope(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("turnscope"));
}
