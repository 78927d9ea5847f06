//! End-to-end tests of the `projctl` binary
//!
//! Every test points the binary at its own temp directory through
//! `PROJCTL_CONFIG_DIR` and uses the insecure keyring, so no test touches
//! the user's real connection file or OS keyring.

mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn projctl(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("projctl").unwrap();
    cmd.env("PROJCTL_CONFIG_DIR", dir.path())
        .env("PROJCTL_INSECURE_KEYRING", "true")
        .env_remove("PROJCTL_PASSWORD")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(dir.path().join("config.yaml"));
    cmd
}

#[test]
fn test_version() {
    let mut cmd = Command::cargo_bin("projctl").unwrap();
    cmd.arg("--version");
    cmd.assert().success();
}

#[test]
fn test_connections_list_json_on_first_run() {
    let dir = TempDir::new().unwrap();

    let output = projctl(&dir)
        .args(["--json", "connections", "list"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let connections: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let connections = connections.as_array().unwrap();
    assert_eq!(connections.len(), 1);
    assert_eq!(connections[0]["id"], "local");
    assert!(dir.path().join("connections.json").exists());
}

#[test]
fn test_connections_list_table() {
    let dir = TempDir::new().unwrap();

    projctl(&dir)
        .args(["connections", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("local"));
}

#[test]
fn test_remove_local_fails_with_json_error() {
    let dir = TempDir::new().unwrap();

    projctl(&dir)
        .args(["connections", "remove", "LOCAL", "--json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(r#""error":"con_protected""#));
}

#[test]
fn test_get_unknown_connection_plain_error() {
    let dir = TempDir::new().unwrap();

    projctl(&dir)
        .args(["connections", "get", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error [con_not_found]"));
}

#[test]
fn test_local_transport_failure_is_reported_distinctly() {
    let dir = TempDir::new().unwrap();

    projctl(&dir)
        .args([
            "--json",
            "request",
            "--conid",
            "local",
            "http://127.0.0.1:1/health",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains(r#""error":"local_request_failed""#));
}

#[test]
fn test_secure_logout_of_active_connection() {
    let dir = TempDir::new().unwrap();

    projctl(&dir)
        .args(["--json", "secure", "logout"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""connection_id": "local""#));
}

#[test]
fn test_invalid_config_value_is_rejected() {
    let dir = TempDir::new().unwrap();
    let (_config_dir, config_path) = common::temp_config_file(
        r#"
auth:
  rejected_token_status: 200
"#,
    );

    let mut cmd = Command::cargo_bin("projctl").unwrap();
    cmd.env("PROJCTL_CONFIG_DIR", dir.path())
        .env("PROJCTL_INSECURE_KEYRING", "true")
        .arg("--config")
        .arg(config_path)
        .args(["connections", "list"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("config_error"));
}

#[test]
fn test_config_file_selects_directory() {
    let data_dir = TempDir::new().unwrap();
    let (_config_dir, config_path) = common::temp_config_file(&format!(
        "paths:\n  config_dir: {}\nkeyring:\n  insecure: true\n",
        data_dir.path().display()
    ));

    let mut cmd = Command::cargo_bin("projctl").unwrap();
    cmd.env_remove("PROJCTL_CONFIG_DIR")
        .arg("--config")
        .arg(config_path)
        .args(["--json", "connections", "active"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(r#""id": "local""#));
    assert!(data_dir.path().join("connections.json").exists());
}
