//! CLI integration tests for sky

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to escape path for TOML on Windows
fn escape_path_for_toml(path: &str) -> String {
    path.replace('\\', "\\\\")
}

/// Config pointing at an unreachable PDS and a private session directory
fn setup_test_env() -> (TempDir, String) {
    let temp_dir = TempDir::new().unwrap();
    let sessions = temp_dir.path().join("sessions");
    let config_path = temp_dir.path().join("config.toml");

    let config_content = format!(
        r#"
[service]
pds_url = "http://127.0.0.1:9"
timeout_secs = 2

[store]
path = "{}"
"#,
        escape_path_for_toml(&sessions.to_string_lossy())
    );
    fs::write(&config_path, config_content).unwrap();

    (temp_dir, config_path.to_string_lossy().to_string())
}

fn sky(config_path: &str) -> Command {
    let mut cmd = Command::cargo_bin("sky").unwrap();
    cmd.env("SKYPOST_CONFIG", config_path)
        .env_remove("BLUESKY_APP_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let (_temp_dir, config_path) = setup_test_env();

    sky(&config_path)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("post"))
        .stdout(predicate::str::contains("refresh"));
}

#[test]
fn test_post_empty_message_is_invalid_input() {
    let (_temp_dir, config_path) = setup_test_env();

    sky(&config_path)
        .args(["post", ""])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Content cannot be empty"));
}

#[test]
fn test_post_too_long_is_invalid_input() {
    let (_temp_dir, config_path) = setup_test_env();

    sky(&config_path)
        .args(["post", &"a".repeat(301)])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("300 character limit"));
}

#[test]
fn test_post_bad_escape_is_invalid_input() {
    let (_temp_dir, config_path) = setup_test_env();

    sky(&config_path)
        .args(["post", r"hello \q"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("escape"));
}

#[test]
fn test_post_without_stored_session_fails() {
    let (_temp_dir, config_path) = setup_test_env();

    sky(&config_path)
        .args(["post", "hello world"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No stored sessions"));
}

#[test]
fn test_post_unknown_handle_fails() {
    let (temp_dir, config_path) = setup_test_env();
    let sessions = temp_dir.path().join("sessions");
    fs::create_dir_all(&sessions).unwrap();
    fs::write(
        sessions.join("auth_response_alice.bsky.social.json"),
        r#"{"accessJwt":"a","refreshJwt":"r","handle":"alice.bsky.social","did":"did:plc:abc123"}"#,
    )
    .unwrap();

    sky(&config_path)
        .args(["post", "hello", "-u", "@nobody.test"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("nobody.test"));
}

#[test]
fn test_create_without_password_off_terminal_fails() {
    let (_temp_dir, config_path) = setup_test_env();

    sky(&config_path)
        .args(["create", "alice.bsky.social"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("password"));
}

#[test]
fn test_refresh_without_stored_session_fails() {
    let (_temp_dir, config_path) = setup_test_env();

    sky(&config_path)
        .args(["refresh", "alice.bsky.social"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("alice.bsky.social"));
}

#[test]
fn test_invalid_config_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "[service]\ntimeout_secs = 0\n").unwrap();

    sky(&config_path.to_string_lossy())
        .args(["post", "hello"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("timeout_secs"));
}

#[test]
fn test_unknown_log_format_rejected() {
    let (_temp_dir, config_path) = setup_test_env();

    sky(&config_path)
        .args(["--log-format", "xml", "post", "hello"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid log format"));
}

#[test]
fn test_post_unicode_escape_is_accepted() {
    let (_temp_dir, config_path) = setup_test_env();

    // Unescaping succeeds; the run then stops at the empty session store
    sky(&config_path)
        .args(["post", r"caf\u00e9"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No stored sessions"));
}

#[test]
fn test_post_invalid_code_point_is_invalid_input() {
    let (_temp_dir, config_path) = setup_test_env();

    sky(&config_path)
        .args(["post", r"\ud800"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("code point"));
}
