//! Integration tests for the `agroai` CLI binary.
//!
//! Argument parsing, help, completions, and config handling run without a
//! backend; the rest talk to a wiremock server through a temp config file.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `agroai` binary with env isolation.
///
/// Clears all `AGROAI_*` env vars and points config and data directories
/// into `home` so tests never touch the user's real config or session.
fn agroai_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("agroai");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env("AGROAI_CONFIG", home.join("config.toml"))
        .env_remove("AGROAI_PROFILE")
        .env_remove("AGROAI_API_URL")
        .env_remove("AGROAI_OUTPUT")
        .env_remove("AGROAI_TIMEOUT")
        .env_remove("AGROAI_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

/// Write a config whose default profile points at `api_url`.
fn write_config(home: &Path, api_url: &str, guest_token: Option<&str>) {
    let mut raw = format!("[profiles.default]\napi_url = \"{api_url}\"\n");
    if let Some(token) = guest_token {
        raw.push_str(&format!("guest_token = \"{token}\"\n"));
    }
    std::fs::write(home.join("config.toml"), raw).unwrap();
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn greenhouse(id: i64, name: &str, ai_mode: bool) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "aiMode": ai_mode,
        "stats": { "temperature": 22, "humidity": "string", "fan": 1, "led": 0 }
    })
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = TempDir::new().unwrap();
    let output = agroai_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn test_help_lists_commands() {
    let home = TempDir::new().unwrap();
    agroai_cmd(home.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("greenhouses")
            .and(predicate::str::contains("device"))
            .and(predicate::str::contains("watch"))
            .and(predicate::str::contains("plants")),
    );
}

#[test]
fn test_version_flag() {
    let home = TempDir::new().unwrap();
    agroai_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("agroai"));
}

#[test]
fn test_completions_bash() {
    let home = TempDir::new().unwrap();
    agroai_cmd(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Argument errors ─────────────────────────────────────────────────

#[test]
fn test_unknown_device_kind_is_usage_error() {
    let home = TempDir::new().unwrap();
    agroai_cmd(home.path())
        .args(["device", "1", "sprinkler", "on"])
        .assert()
        .code(2);
}

#[test]
fn test_non_numeric_greenhouse_id_is_usage_error() {
    let home = TempDir::new().unwrap();
    agroai_cmd(home.path())
        .args(["greenhouses", "get", "north"])
        .assert()
        .code(2);
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honors_env() {
    let home = TempDir::new().unwrap();
    agroai_cmd(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_show_masks_guest_token() {
    let home = TempDir::new().unwrap();
    write_config(home.path(), "http://farm.local:8000", Some("kiosk-secret"));
    agroai_cmd(home.path())
        .args(["config", "show", "-o", "json"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("http://farm.local:8000")
                .and(predicate::str::contains("****"))
                .and(predicate::str::contains("kiosk-secret").not()),
        );
}

#[test]
fn test_unknown_profile_is_usage_error() {
    let home = TempDir::new().unwrap();
    let output = agroai_cmd(home.path())
        .args(["-p", "staging", "greenhouses", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("staging"));
}

// ── Auth ────────────────────────────────────────────────────────────

#[test]
fn test_whoami_without_session_exits_auth() {
    let home = TempDir::new().unwrap();
    let output = agroai_cmd(home.path()).arg("whoami").output().unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("Not logged in"));
}

#[tokio::test]
async fn test_login_persists_session_for_later_commands() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({ "email": "ana@farm.io", "password": "pw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-1",
            "user": { "id": 7, "email": "ana@farm.io", "first_name": "Ana", "last_name": "Ruiz", "is_active": true }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/whoami"))
        .and(header("Authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7, "email": "ana@farm.io", "first_name": "Ana", "last_name": "Ruiz", "is_active": true
        })))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    write_config(home.path(), &server.uri(), None);

    agroai_cmd(home.path())
        .args(["login", "--email", "ana@farm.io", "--password", "pw"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Logged in as Ana Ruiz"));

    agroai_cmd(home.path())
        .args(["whoami", "-o", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ana@farm.io"));
}

#[tokio::test]
async fn test_rejected_login_exits_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "detail": "Incorrect email or password" })),
        )
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    write_config(home.path(), &server.uri(), None);

    let output = agroai_cmd(home.path())
        .args(["login", "--email", "ana@farm.io", "--password", "nope"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("Incorrect email or password"));
}

#[tokio::test]
async fn test_register_then_profile_uses_new_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .and(body_json(json!({
            "email": "ana@farm.io",
            "password": "pw",
            "first_name": "Ana",
            "last_name": "Ruiz"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-2",
            "user": { "id": 7, "email": "ana@farm.io", "first_name": "Ana", "last_name": "Ruiz" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("Authorization", "Bearer tok-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7, "email": "ana@farm.io", "first_name": "Ana", "last_name": "Ruiz"
        })))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    write_config(home.path(), &server.uri(), None);

    agroai_cmd(home.path())
        .args(["register", "-e", "ana@farm.io", "--password", "pw"])
        .args(["--first-name", "Ana", "--last-name", "Ruiz"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Registered as Ana Ruiz"));

    agroai_cmd(home.path())
        .args(["profile", "-o", "plain"])
        .assert()
        .success()
        .stdout("ana@farm.io\n");
}

#[tokio::test]
async fn test_profile_update_sends_put() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/users/me"))
        .and(body_json(json!({ "first_name": "Anabel" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7, "email": "ana@farm.io", "first_name": "Anabel", "last_name": "Ruiz"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    write_config(home.path(), &server.uri(), Some("guest"));

    agroai_cmd(home.path())
        .args(["profile", "update", "--first-name", "Anabel"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Anabel Ruiz"));
}

#[test]
fn test_empty_profile_update_is_usage_error() {
    let home = TempDir::new().unwrap();
    write_config(home.path(), "http://127.0.0.1:9", Some("guest"));
    agroai_cmd(home.path())
        .args(["profile", "update"])
        .assert()
        .code(2);
}

// ── Assistant ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_chat_one_shot_prints_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ai/chat"))
        .and(body_json(json!({
            "message": "Should I open the vents?",
            "history": [{ "role": "model", "content": agroai_core::CHAT_WELCOME }]
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "reply": "Yes, it is 31 °C inside." })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    write_config(home.path(), &server.uri(), Some("guest"));

    agroai_cmd(home.path())
        .args(["chat", "Should I open the vents?"])
        .assert()
        .success()
        .stdout("Yes, it is 31 °C inside.\n");
}

#[tokio::test]
async fn test_chat_failure_exits_nonzero() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ai/chat"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    write_config(home.path(), &server.uri(), Some("guest"));

    agroai_cmd(home.path())
        .args(["chat", "Hello"])
        .assert()
        .code(1);
}

#[test]
fn test_chat_without_message_needs_terminal() {
    let home = TempDir::new().unwrap();
    write_config(home.path(), "http://127.0.0.1:9", Some("guest"));
    agroai_cmd(home.path()).arg("chat").assert().code(2);
}

// ── Greenhouses & devices ───────────────────────────────────────────

#[tokio::test]
async fn test_greenhouses_list_plain() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/greenhouses"))
        .and(header("Authorization", "Bearer guest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            greenhouse(1, "North", false),
            greenhouse(2, "South", true),
        ])))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    write_config(home.path(), &server.uri(), Some("guest"));

    agroai_cmd(home.path())
        .args(["greenhouses", "list", "-o", "plain"])
        .assert()
        .success()
        .stdout("1\n2\n");
}

#[tokio::test]
async fn test_greenhouse_get_shows_offline_placeholder() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/greenhouses/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(greenhouse(1, "North", false)))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    write_config(home.path(), &server.uri(), Some("guest"));

    agroai_cmd(home.path())
        .args(["greenhouses", "get", "1", "--color", "never"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("North")
                .and(predicate::str::contains("--"))
                .and(predicate::str::contains("22 °C")),
        );
}

#[tokio::test]
async fn test_device_on_uses_command_segment() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/greenhouses/1/devices/moisture/switch/on/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    write_config(home.path(), &server.uri(), Some("guest"));

    agroai_cmd(home.path())
        .args(["device", "1", "pump", "on"])
        .assert()
        .success()
        .stderr(predicate::str::contains("switched on"));
}

#[tokio::test]
async fn test_toggle_refused_in_ai_mode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/greenhouses/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(greenhouse(2, "South", true)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    write_config(home.path(), &server.uri(), Some("guest"));

    let output = agroai_cmd(home.path())
        .args(["device", "2", "fan", "toggle"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("AI mode"));
}

#[tokio::test]
async fn test_expired_token_exits_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/greenhouses"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    write_config(home.path(), &server.uri(), Some("stale"));

    agroai_cmd(home.path())
        .args(["greenhouses", "list"])
        .assert()
        .code(3);
}

#[test]
fn test_unreachable_backend_exits_connection() {
    let home = TempDir::new().unwrap();
    write_config(home.path(), "http://127.0.0.1:9", Some("guest"));
    agroai_cmd(home.path())
        .args(["greenhouses", "list", "--timeout", "2"])
        .assert()
        .code(predicate::in_iter([7, 8]));
}

#[test]
fn test_delete_requires_yes_without_terminal() {
    let home = TempDir::new().unwrap();
    write_config(home.path(), "http://127.0.0.1:9", Some("guest"));
    let output = agroai_cmd(home.path())
        .args(["greenhouses", "delete", "4"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--yes"));
}
