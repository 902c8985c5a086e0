//! Integration tests for the `coursedesk` CLI binary.
//!
//! Argument parsing, offline commands and error exits run without any
//! server; the API-backed tests point `--api-url` at a wiremock server.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `coursedesk` binary with env isolation.
///
/// Clears all `COURSEDESK_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn coursedesk_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("coursedesk");
    cmd.env("HOME", "/tmp/coursedesk-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/coursedesk-cli-test-nonexistent")
        .env_remove("COURSEDESK_PROFILE")
        .env_remove("COURSEDESK_API_URL")
        .env_remove("COURSEDESK_OUTPUT")
        .env_remove("COURSEDESK_INSECURE")
        .env_remove("COURSEDESK_TIMEOUT")
        .env_remove("COURSEDESK_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

/// Same, but aimed at `server` with a bearer token in the environment.
fn api_cmd(server: &MockServer) -> assert_cmd::Command {
    let mut cmd = coursedesk_cmd();
    cmd.env("COURSEDESK_TOKEN", "t0k")
        .args(["--api-url", &server.uri()]);
    cmd
}

/// Run a blocking command off the async test runtime.
async fn run(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn users_page() -> Value {
    json!({
        "records": [
            { "id": 1, "name": "ana", "email": "ana@example.com", "role": "admin", "status": "approved" },
            { "id": 2, "name": "ben", "email": "ben@example.com", "role": "trainee", "status": "pending" }
        ],
        "current_page": 1,
        "last_page": 1,
        "page_size": 10,
        "total_count": 2
    })
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = coursedesk_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    coursedesk_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("users")
            .and(predicate::str::contains("subjects"))
            .and(predicate::str::contains("tasks")),
    );
}

#[test]
fn test_version_flag() {
    coursedesk_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("coursedesk"));
}

#[test]
fn test_completions_bash() {
    coursedesk_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Offline commands ────────────────────────────────────────────────

#[test]
fn test_token_encode() {
    coursedesk_cmd()
        .args(["token", "encode", "42"])
        .assert()
        .success()
        .stdout("NDI=\n");
}

#[test]
fn test_token_decode() {
    coursedesk_cmd()
        .args(["token", "decode", "NDI="])
        .assert()
        .success()
        .stdout("42\n");
}

#[test]
fn test_token_decode_rejects_garbage() {
    coursedesk_cmd()
        .args(["token", "decode", "not-valid"])
        .assert()
        .code(2);
}

#[test]
fn test_token_encode_rejects_non_integer() {
    coursedesk_cmd()
        .args(["token", "encode", "4.2"])
        .assert()
        .code(2);
}

#[test]
fn test_invalid_role_is_usage_error() {
    coursedesk_cmd()
        .args(["users", "update", "1", "--role", "owner"])
        .assert()
        .code(2);
}

#[test]
fn test_list_without_config_fails() {
    let output = coursedesk_cmd().args(["users", "list"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let text = combined_output(&output);
    assert!(text.contains("config init"), "Expected setup hint:\n{text}");
}

#[test]
fn test_unknown_profile_is_reported() {
    let output = coursedesk_cmd()
        .args(["--profile", "nope", "subjects", "list"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("nope"));
}

#[test]
fn test_delete_requires_yes_when_not_interactive() {
    coursedesk_cmd()
        .env("COURSEDESK_TOKEN", "t0k")
        .args(["--api-url", "http://127.0.0.1:9", "subjects", "delete", "42"])
        .write_stdin("")
        .assert()
        .code(2);
}

// ── Against a mock API ──────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_users_list_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/users"))
        .and(query_param("page", "1"))
        .and(query_param("filter[name][contains]", "a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(users_page()))
        .mount(&server)
        .await;

    let mut cmd = api_cmd(&server);
    cmd.args(["-o", "json", "users", "list", "--filter", "name=a"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let rows: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 2);
    assert_eq!(rows[0]["email"], "ana@example.com");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_client_side_list_sorts_locally() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(users_page()))
        .mount(&server)
        .await;

    let mut cmd = api_cmd(&server);
    cmd.args(["-o", "plain", "users", "list", "--client-side", "--sort", "-name"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "2\n1\n");

    let requests = server.received_requests().await.unwrap();
    assert!(
        requests
            .iter()
            .all(|r| r.url.query().is_none_or(|q| !q.contains("sort")))
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_api_error_message_is_shown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/tasks"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({ "message": "Validation failed" })),
        )
        .mount(&server)
        .await;

    let mut cmd = api_cmd(&server);
    cmd.args(["tasks", "list"]);
    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("Validation failed"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unauthorized_exits_with_auth_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/subjects"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Bad token" })))
        .mount(&server)
        .await;

    let mut cmd = api_cmd(&server);
    cmd.args(["subjects", "list"]);
    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(3));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_accepts_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/subjects/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "subject": { "id": 42, "name": "Rust", "description": "Ownership" }
        })))
        .mount(&server)
        .await;

    let mut cmd = api_cmd(&server);
    cmd.args(["-o", "json", "subjects", "get", "NDI="]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    let subject: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(subject["name"], "Rust");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_with_yes() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/admin/subjects/42"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = api_cmd(&server);
    cmd.args(["--yes", "subjects", "delete", "NDI="]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_incomplete_create_sends_nothing() {
    let server = MockServer::start().await;

    let mut cmd = api_cmd(&server);
    cmd.args(["tasks", "create", "--title", "Borrowing"]);
    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("required"));
    assert!(server.received_requests().await.unwrap().is_empty());
}
