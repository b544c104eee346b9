//! End-to-end CLI tests for the wisedu binary.

#![allow(deprecated)]

mod support;
use support::socket_guard::start_mock_server_or_skip;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

/// Writes a config pointing every host at `base` and returns its path.
fn write_config(dir: &TempDir, base: &str) -> std::path::PathBuf {
    let config = dir.path().join("config.json");
    let body = serde_json::json!({
        "endpoints": {"sso_base": base, "portal_base": base, "gateway_base": base},
        "request_timeout_secs": 5
    });
    std::fs::write(&config, body.to_string()).unwrap();
    config
}

#[test]
fn test_binary_help_displays_usage() {
    let mut cmd = Command::cargo_bin("wisedu").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("captcha"))
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("grades"));
}

#[test]
fn test_binary_version_displays_version() {
    let mut cmd = Command::cargo_bin("wisedu").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("wisedu"));
}

#[test]
fn test_binary_without_subcommand_fails() {
    let mut cmd = Command::cargo_bin("wisedu").unwrap();
    cmd.assert().failure().stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_grades_with_empty_cookie_file_fails_before_network() {
    let dir = TempDir::new().unwrap();
    // Unroutable base: any request would fail with a network error instead.
    let config = write_config(&dir, "http://127.0.0.1:9");
    let cookies = dir.path().join("cookies.json");
    std::fs::write(&cookies, "{}").unwrap();

    let mut cmd = Command::cargo_bin("wisedu").unwrap();
    cmd.arg("--config")
        .arg(&config)
        .arg("-q")
        .arg("grades")
        .arg("--cookies")
        .arg(&cookies)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid argument"))
        .stderr(predicate::str::contains("Fix: Log in first"));
}

#[test]
fn test_malformed_config_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");
    std::fs::write(&config, "{ not json").unwrap();

    let mut cmd = Command::cargo_bin("wisedu").unwrap();
    cmd.arg("--config")
        .arg(&config)
        .arg("captcha")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid config file"));
}

#[tokio::test]
async fn test_captcha_command_prints_json() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/sso/apis/v2/open/captcha"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"img":"data:image/png;base64,AA","token":"cli-token"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &server.uri());

    let output = tokio::task::spawn_blocking(move || {
        Command::cargo_bin("wisedu")
            .unwrap()
            .arg("--config")
            .arg(&config)
            .arg("-q")
            .arg("captcha")
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success());
    let printed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(printed["token"], "cli-token");
    assert_eq!(printed["img"], "data:image/png;base64,AA");
}

#[tokio::test]
async fn test_grades_command_writes_report_file() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/jwapp/sys/emaphome/appShow.do"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/jwapp/sys/cjcx/modules/cjcx/xscjcx.do"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"datas":{"rows":[]}}"#))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &server.uri());
    let cookies = dir.path().join("cookies.json");
    std::fs::write(
        &cookies,
        r#"{"GS_SESSIONID":{"name":"GS_SESSIONID","value":"gs"},"_WEU":{"name":"_WEU","value":"w"}}"#,
    )
    .unwrap();
    let report = dir.path().join("out.json");

    let report_arg = report.clone();
    let output = tokio::task::spawn_blocking(move || {
        Command::cargo_bin("wisedu")
            .unwrap()
            .arg("--config")
            .arg(&config)
            .arg("-q")
            .arg("grades")
            .arg("--cookies")
            .arg(&cookies)
            .arg("--output")
            .arg(&report_arg)
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("out.json"));
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(written["data"]["datas"]["rows"], serde_json::json!([]));
    assert_eq!(written["cookies"]["_WEU"]["value"], "w");
}
