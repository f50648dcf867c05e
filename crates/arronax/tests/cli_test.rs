//! Integration tests for the `arronax` CLI binary.
//!
//! Parsing, help and error handling run without a server; query commands
//! run against a wiremock Conseil instance through a temporary config file.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `arronax` binary with env isolation.
///
/// Clears all `ARRONAX_*` env vars and points the config file at
/// `config` so tests never touch the user's real configuration.
fn arronax_cmd(config: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("arronax");
    cmd.env("HOME", "/tmp/arronax-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/arronax-cli-test-nonexistent")
        .env("ARRONAX_CONFIG", config)
        .env("NO_COLOR", "1")
        .env_remove("ARRONAX_NETWORK")
        .env_remove("ARRONAX_URL")
        .env_remove("ARRONAX_API_KEY")
        .env_remove("ARRONAX_OUTPUT")
        .env_remove("ARRONAX_INSECURE")
        .env_remove("ARRONAX_TIMEOUT")
        .env_remove("ARRONAX_DEFAULT_NETWORK")
        .env_remove("RUST_LOG");
    cmd
}

/// A command whose config file does not exist.
fn unconfigured() -> (TempDir, assert_cmd::Command) {
    let dir = TempDir::new().unwrap();
    let cmd = arronax_cmd(&dir.path().join("missing.toml"));
    (dir, cmd)
}

/// A command configured with a single `mainnet` network at `server`.
fn configured(server: &MockServer) -> (TempDir, assert_cmd::Command) {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("config.toml");
    std::fs::write(
        &file,
        format!(
            "default_network = \"mainnet\"\n\n\
             [networks.mainnet]\n\
             url = \"{}\"\n\
             platform = \"tezos\"\n\
             display_name = \"Mainnet\"\n\
             api_key = \"hooman\"\n",
            server.uri()
        ),
    )
    .unwrap();
    let cmd = arronax_cmd(&file);
    (dir, cmd)
}

/// Run a command off the async runtime so the mock server keeps serving.
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

fn attribute(name: &str, data_type: &str, key_type: &str) -> Value {
    json!({
        "name": name,
        "displayName": name,
        "dataType": data_type,
        "keyType": key_type,
        "entity": "blocks"
    })
}

async fn mount_block_attributes(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v2/metadata/tezos/mainnet/blocks/attributes"))
        .and(header("apiKey", "hooman"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            attribute("hash", "Hash", "UniqueKey"),
            attribute("level", "Int", "NonKey"),
            attribute("timestamp", "DateTime", "NonKey"),
            attribute("predecessor", "Hash", "NonKey"),
            attribute("protocol", "String", "NonKey"),
        ])))
        .mount(server)
        .await;
}

fn block_rows() -> Value {
    json!([
        {"hash": "BLnewest", "level": 101, "timestamp": 1_600_000_060_000_i64, "predecessor": "BLolder", "protocol": "PsCARTHA"},
        {"hash": "BLolder", "level": 100, "timestamp": 1_600_000_000_000_i64, "predecessor": "BLfirst", "protocol": "PsCARTHA"},
    ])
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let (_dir, mut cmd) = unconfigured();
    let output = cmd.output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let (_dir, mut cmd) = unconfigured();
    cmd.arg("--help").assert().success().stdout(
        predicate::str::contains("Conseil")
            .and(predicate::str::contains("query"))
            .and(predicate::str::contains("attributes"))
            .and(predicate::str::contains("export")),
    );
}

#[test]
fn test_version_flag() {
    let (_dir, mut cmd) = unconfigured();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("arronax"));
}

#[test]
fn test_completions_zsh() {
    let (_dir, mut cmd) = unconfigured();
    cmd.args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let (_dir, mut cmd) = unconfigured();
    let output = cmd.arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_query_without_config_is_usage_error() {
    let (_dir, mut cmd) = unconfigured();
    cmd.args(["query", "blocks"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("config"));
}

#[test]
fn test_invalid_entity() {
    let (_dir, mut cmd) = unconfigured();
    let output = cmd.args(["query", "bakers"]).output().unwrap();
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("possible values"));
}

#[test]
fn test_field_and_all_fields_conflict() {
    let (_dir, mut cmd) = unconfigured();
    cmd.args(["query", "blocks", "--field", "hash", "--all-fields"])
        .assert()
        .code(2);
}

#[test]
fn test_config_show_no_config() {
    let (_dir, mut cmd) = unconfigured();
    cmd.args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[defaults]"));
}

#[test]
fn test_config_use_and_set_round_trip() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("config.toml");
    std::fs::write(
        &file,
        "[networks.mainnet]\nurl = \"https://a.example\"\n\n\
         [networks.carthagenet]\nurl = \"https://b.example\"\n",
    )
    .unwrap();

    arronax_cmd(&file)
        .args(["config", "use", "carthagenet"])
        .assert()
        .success();
    arronax_cmd(&file)
        .args(["config", "set", "defaults.row_count", "25"])
        .assert()
        .success();
    arronax_cmd(&file)
        .args(["config", "set", "display_name", "Carthage"])
        .assert()
        .success();

    let written = std::fs::read_to_string(&file).unwrap();
    assert!(written.contains("default_network = \"carthagenet\""));
    assert!(written.contains("row_count = 25"));
    assert!(written.contains("display_name = \"Carthage\""));

    arronax_cmd(&file)
        .args(["config", "networks"])
        .assert()
        .success()
        .stdout(predicate::str::contains("carthagenet *"));
    arronax_cmd(&file)
        .args(["config", "use", "zeronet"])
        .assert()
        .code(4);
}

#[test]
fn test_config_subcommands_exist() {
    let (_dir, mut cmd) = unconfigured();
    cmd.args(["config", "--help"]).assert().success().stdout(
        predicate::str::contains("init")
            .and(predicate::str::contains("show"))
            .and(predicate::str::contains("networks"))
            .and(predicate::str::contains("set-key")),
    );
}

// ── Against a mock server ───────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_query_csv_with_filter_and_sort() {
    let server = MockServer::start().await;
    mount_block_attributes(&server).await;
    Mock::given(method("POST"))
        .and(path("/v2/data/tezos/mainnet/blocks"))
        .and(body_partial_json(json!({
            "predicates": [{
                "field": "level",
                "operation": "between",
                "set": ["100", "101"],
                "inverse": false
            }],
            "orderBy": [{"field": "level", "direction": "asc"}],
            "limit": 5
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(block_rows()))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, mut cmd) = configured(&server);
    cmd.args([
        "-o",
        "csv",
        "query",
        "blocks",
        "-f",
        "level",
        "-f",
        "hash",
        "-w",
        "level:between:100,101",
        "-s",
        "level:asc",
        "-l",
        "5",
    ]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim_end(), "level,hash\n101,BLnewest\n100,BLolder");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_query_json_uses_default_columns() {
    let server = MockServer::start().await;
    mount_block_attributes(&server).await;
    Mock::given(method("POST"))
        .and(path("/v2/data/tezos/mainnet/blocks"))
        .and(body_partial_json(json!({"limit": 10})))
        .respond_with(ResponseTemplate::new(200).set_body_json(block_rows()))
        .mount(&server)
        .await;

    let (_dir, mut cmd) = configured(&server);
    cmd.args(["-o", "json-compact", "query", "blocks"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let rows: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 2);
    assert_eq!(rows[0]["hash"], "BLnewest");
    assert!(rows[0].get("protocol").is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_query_unknown_attribute_is_not_found() {
    let server = MockServer::start().await;
    mount_block_attributes(&server).await;

    let (_dir, mut cmd) = configured(&server);
    cmd.args(["query", "blocks", "-w", "baker:eq:tz1"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("baker"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_missing_record_exits_not_found() {
    let server = MockServer::start().await;
    mount_block_attributes(&server).await;
    Mock::given(method("POST"))
        .and(path("/v2/data/tezos/mainnet/blocks"))
        .and(body_partial_json(json!({"limit": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let (_dir, mut cmd) = configured(&server);
    cmd.args(["get", "blocks", "hash", "BLnothing"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("hash=BLnothing"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_prints_plain_key() {
    let server = MockServer::start().await;
    mount_block_attributes(&server).await;
    Mock::given(method("POST"))
        .and(path("/v2/data/tezos/mainnet/blocks"))
        .and(body_partial_json(json!({
            "predicates": [{"field": "hash", "operation": "eq", "set": ["BLolder"]}],
            "limit": 1
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([block_rows()[1]])))
        .mount(&server)
        .await;

    let (_dir, mut cmd) = configured(&server);
    cmd.args(["-o", "plain", "get", "blocks", "hash", "BLolder"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "BLolder");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_export_writes_csv_file() {
    let server = MockServer::start().await;
    mount_block_attributes(&server).await;
    Mock::given(method("POST"))
        .and(path("/v2/data/tezos/mainnet/blocks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(block_rows()))
        .mount(&server)
        .await;

    let (dir, mut cmd) = configured(&server);
    let out = dir.path().join("blocks.csv");
    cmd.args(["export", "blocks", "--file"]).arg(&out);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Exported 2 row(s)"));
    let written = std::fs::read_to_string(&out).unwrap();
    let mut lines = written.lines();
    assert_eq!(lines.next(), Some("level,timestamp,hash,predecessor"));
    assert_eq!(lines.next(), Some("101,1600000060000,BLnewest,BLolder"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_auth_failure_exit_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/metadata/tezos/mainnet/blocks/attributes"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let (_dir, mut cmd) = configured(&server);
    cmd.args(["attributes", "blocks"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
}
