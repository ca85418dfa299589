//! Integration tests for the `lokictl` binary.
//!
//! Argument parsing, help output, completions and error exit codes run
//! without a backend; list commands run against a wiremock server.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `lokictl` binary with env isolation.
///
/// Clears all `LOKIWATCH_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn lokictl_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("lokictl");
    cmd.env("HOME", "/tmp/lokictl-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/lokictl-cli-test-nonexistent")
        .env_remove("LOKIWATCH_PROFILE")
        .env_remove("LOKIWATCH_URL")
        .env_remove("LOKIWATCH_OUTPUT")
        .env_remove("LOKIWATCH_INSECURE")
        .env_remove("LOKIWATCH_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run the binary off the async runtime so the mock server keeps serving.
async fn run(args: Vec<String>) -> std::process::Output {
    tokio::task::spawn_blocking(move || lokictl_cmd().args(&args).output().unwrap())
        .await
        .unwrap()
}

fn args(uri: &str, rest: &[&str]) -> Vec<String> {
    let mut v = vec!["--url".to_owned(), uri.to_owned()];
    v.extend(rest.iter().map(|s| (*s).to_owned()));
    v
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = lokictl_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    lokictl_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("Loki IDS")
            .and(predicate::str::contains("alerts"))
            .and(predicate::str::contains("signatures"))
            .and(predicate::str::contains("blacklist")),
    );
}

#[test]
fn test_version_flag() {
    lokictl_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("lokictl"));
}

#[test]
fn test_invalid_subcommand() {
    let output = lokictl_cmd().arg("nonexistent").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("unrecognized subcommand"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    lokictl_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    lokictl_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_completions_fish() {
    lokictl_cmd()
        .args(["completions", "fish"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lokictl"));
}

// ── Config and usage errors ─────────────────────────────────────────

#[test]
fn test_missing_config_is_usage_error() {
    let output = lokictl_cmd().args(["alerts", "list"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("config init"), "Expected setup hint in:\n{text}");
}

#[test]
fn test_config_path() {
    lokictl_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_delete_without_tty_requires_yes() {
    let output = lokictl_cmd()
        .args(["--url", "http://127.0.0.1:9", "alerts", "delete", "3"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--yes"));
}

#[test]
fn test_blacklist_add_rejects_bad_ip() {
    let output = lokictl_cmd()
        .args(["--url", "http://127.0.0.1:9", "-y", "blacklist", "add", "not-an-ip"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("not an IP address"));
}

#[test]
fn test_page_size_out_of_range() {
    let output = lokictl_cmd()
        .args(["--url", "http://127.0.0.1:9", "alerts", "list", "-l", "0"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Against a mock backend ──────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_alerts_list_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/alerts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "alerts": [{
                "id": 11,
                "timestamp": "2025-03-01T10:00:00",
                "type": "SIGNATURE",
                "pattern": "SQL Injection",
                "src_ip": "192.168.1.50",
                "dst_port": 80,
                "message": "UNION SELECT in payload",
                "severity": "high"
            }],
            "total": 1,
            "page": 1,
            "page_size": 25
        })))
        .mount(&server)
        .await;

    let output = run(args(&server.uri(), &["-o", "json", "alerts", "list"])).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body[0]["id"], 11);
    assert_eq!(body[0]["src_ip"], "192.168.1.50");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_signatures_list_plain() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/signatures"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "signatures": [
                { "id": 4, "name": "sqli", "pattern": "UNION SELECT", "enabled": 1 },
                { "id": 9, "name": "xss", "pattern": "<script>", "enabled": 0 }
            ],
            "total": 2,
            "page": 1,
            "page_size": 25
        })))
        .mount(&server)
        .await;

    let output = run(args(&server.uri(), &["-o", "plain", "signatures", "list"])).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "4\n9\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_alert_exits_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/alerts/404"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "Alert not found" })))
        .mount(&server)
        .await;

    let output = run(args(&server.uri(), &["alerts", "get", "404"])).await;
    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unreachable_backend_is_connection_error() {
    let output = run(vec![
        "--url".into(),
        "http://127.0.0.1:9".into(),
        "--timeout".into(),
        "2".into(),
        "health".into(),
    ])
    .await;
    assert_eq!(output.status.code(), Some(7), "{}", combined_output(&output));
}
