//! Integration tests for the `sensorlink` binary.
//!
//! Argument parsing, config resolution and exit codes run without a backend;
//! the remaining tests drive the binary against a wiremock backend.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NODE: u32 = 12345;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `sensorlink` binary with env isolation.
///
/// Clears all `SENSORLINK_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn sensorlink_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("sensorlink");
    cmd.env("HOME", "/tmp/sensorlink-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/sensorlink-cli-test-nonexistent")
        .env_remove("SENSORLINK_PROFILE")
        .env_remove("SENSORLINK_BACKEND")
        .env_remove("SENSORLINK_NODE")
        .env_remove("SENSORLINK_OUTPUT")
        .env_remove("SENSORLINK_INSECURE")
        .env_remove("SENSORLINK_TIMEOUT");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run the binary off the async runtime so the mock server keeps serving.
async fn run_blocking(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = sensorlink_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    sensorlink_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("sensor node")
            .and(predicate::str::contains("node"))
            .and(predicate::str::contains("sampling"))
            .and(predicate::str::contains("base")),
    );
}

#[test]
fn test_version_flag() {
    sensorlink_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sensorlink"));
}

#[test]
fn test_write_help_lists_field_flags() {
    sensorlink_cmd()
        .args(["node", "write", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--rate")
                .and(predicate::str::contains("--channels"))
                .and(predicate::str::contains("--dry-run")),
        );
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_zsh() {
    sensorlink_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_completions_bash() {
    sensorlink_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Usage errors ────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = sensorlink_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_invalid_output_format() {
    let output = sensorlink_cmd()
        .args(["--output", "xml", "logs"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("xml"));
}

#[test]
fn test_continuous_conflicts_with_duration() {
    let output = sensorlink_cmd()
        .args(["sampling", "start", "--continuous", "--duration", "10"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Config resolution ───────────────────────────────────────────────

#[test]
fn test_no_backend_configured() {
    let output = sensorlink_cmd().args(["base", "status"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("config init"), "Expected init hint:\n{text}");
}

#[test]
fn test_node_command_without_node() {
    let output = sensorlink_cmd()
        .args(["--backend", "http://127.0.0.1:9", "node", "read"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--node"));
}

#[test]
fn test_unknown_profile() {
    let output = sensorlink_cmd()
        .args(["--profile", "lab", "base", "status"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("lab"));
}

#[test]
fn test_invalid_backend_url() {
    let output = sensorlink_cmd()
        .args(["--backend", "not a url", "base", "status"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_sleep_requires_yes_without_tty() {
    let output = sensorlink_cmd()
        .args(["-b", "http://127.0.0.1:9", "-n", "7", "node", "sleep"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--yes"));
}

#[test]
fn test_config_path() {
    sensorlink_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_init_then_show() {
    let dir = tempfile::tempdir().unwrap();
    let with_home = |cmd: &mut assert_cmd::Command| {
        cmd.env("HOME", dir.path()).env("XDG_CONFIG_HOME", dir.path());
    };

    let mut init = sensorlink_cmd();
    with_home(&mut init);
    init.args([
        "--yes",
        "-b",
        "http://10.0.0.5:5000",
        "-n",
        "42",
        "config",
        "init",
        "--name",
        "lab",
    ])
    .assert()
    .success();

    let mut again = sensorlink_cmd();
    with_home(&mut again);
    let output = again
        .args(["--yes", "config", "init", "--name", "lab"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--force"));

    let mut show = sensorlink_cmd();
    with_home(&mut show);
    show.args(["config", "show"]).assert().success().stdout(
        predicate::str::contains("[profiles.lab]")
            .and(predicate::str::contains("http://10.0.0.5:5000"))
            .and(predicate::str::contains("node_id = 42")),
    );
}

// ── Against a backend ───────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_node_read_plain() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/api/node_idle/{NODE}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "idle_confirmed": true,
            "idle_status": {"command_sent": true, "state_confirmed": true},
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/api/read/{NODE}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "model": "G-Link-200",
            "fw": "12.1",
            "state": 0,
            "state_text": "Idle",
            "current_rate": 1,
            "supported_rates": [{"enum_val": 1, "str_val": "1Hz"}],
            "current_power": 10,
            "channels": [{"id": 1, "enabled": true}],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = sensorlink_cmd();
    cmd.args([
        "-o",
        "plain",
        "-b",
        &server.uri(),
        "-n",
        &NODE.to_string(),
        "node",
        "read",
    ]);
    let output = run_blocking(cmd).await;
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(stdout.contains("Model: G-Link-200"), "{stdout}");
    assert!(stdout.contains("Radio Power: 10 dBm"), "{stdout}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_node_read_failure_is_general_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/api/node_idle/{NODE}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "idle_confirmed": true,
            "idle_status": {"state_confirmed": true},
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/api/read/{NODE}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": "Node 12345 did not respond",
        })))
        .mount(&server)
        .await;

    let mut cmd = sensorlink_cmd();
    cmd.args(["-b", &server.uri(), "-n", &NODE.to_string(), "node", "read"]);
    let output = run_blocking(cmd).await;
    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("did not respond"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_logs_tail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/logs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "logs": ["boot", "connected", "beacon on", "read 12345"],
        })))
        .mount(&server)
        .await;

    let mut cmd = sensorlink_cmd();
    cmd.args(["-o", "plain", "-b", &server.uri(), "logs", "--tail", "2"]);
    let output = run_blocking(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "beacon on\nread 12345"
    );
}

#[test]
fn test_connection_refused() {
    // Port 9 (discard) is not expected to accept connections.
    let output = sensorlink_cmd()
        .args(["-b", "http://127.0.0.1:9", "--timeout", "5", "base", "status"])
        .output()
        .unwrap();
    assert_eq!(
        output.status.code(),
        Some(7),
        "{}",
        combined_output(&output)
    );
}
