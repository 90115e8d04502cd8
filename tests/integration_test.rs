// Integration tests for the podmanager-cli binary

use assert_cmd::cargo::cargo_bin_cmd;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use httpmock::prelude::*;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn store_session(dir: &Path, server: &str) {
    let session = json!({
        "target_server": server,
        "access_token": "test-token",
        "expire_at": "4102444800",
    });
    fs::write(dir.join("config"), STANDARD.encode(session.to_string())).unwrap();
}

#[test]
fn test_listing_commands_expose_pipeline_flags() {
    for args in [["infra", "list"], ["provision", "osimg-list"]] {
        let mut cmd = cargo_bin_cmd!("podmanager-cli");
        cmd.args(args).arg("--help");
        cmd.assert()
            .success()
            .stdout(predicate::str::contains("--format"))
            .stdout(predicate::str::contains("--filter"))
            .stdout(predicate::str::contains("--sort-key"))
            .stdout(predicate::str::contains("--sort-order"))
            .stdout(predicate::str::contains("--columns"));
    }
}

#[test]
fn test_missing_login_reports_authentication_error() {
    let dir = tempdir().unwrap();
    let mut cmd = cargo_bin_cmd!("podmanager-cli");
    cmd.env("PODMANAGER_CLI_CONFIG_DIR", dir.path())
        .args(["provision", "osimg-list", "--format", "table"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Authentication error"))
        .stdout(predicate::str::contains("No data found.").not());
}

#[test]
fn test_delete_without_login_reports_authentication_error() {
    let dir = tempdir().unwrap();
    let mut cmd = cargo_bin_cmd!("podmanager-cli");
    cmd.env("PODMANAGER_CLI_CONFIG_DIR", dir.path())
        .args(["provision", "osimg-delete", "--id", "42"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Authentication error"))
        .stdout(predicate::str::contains("success").not());
}

#[test]
fn test_list_filters_sorts_and_renders_csv() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/provision/osimg")
            .header("Authorization", "Bearer test-token");
        then.status(200).json_body(json!([
            {"name": "y", "ver": "1.10", "meta": {"arch": "x86_64"}},
            {"name": "z", "ver": "2.0", "meta": {"arch": "arm64"}},
            {"name": "x", "ver": "1.2", "meta": {"arch": "x86_64"}},
        ]));
    });

    let dir = tempdir().unwrap();
    store_session(dir.path(), &server.base_url());

    let mut cmd = cargo_bin_cmd!("podmanager-cli");
    cmd.env("PODMANAGER_CLI_CONFIG_DIR", dir.path()).args([
        "provision",
        "osimg-list",
        "--format",
        "csv",
        "--filter",
        "meta.arch=x86_64",
        "--sort-key",
        "ver",
        "--columns",
        "name,meta.arch,missing",
    ]);
    cmd.assert()
        .success()
        .stdout("name,meta.arch,missing\nx,x86_64,\ny,x86_64,\n");
    mock.assert();
}

#[test]
fn test_invalid_filter_renders_no_data() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/gsm/gsm/common/getNodeList");
        then.status(200)
            .json_body(json!({"data": [{"name": "node-1"}]}));
    });

    let dir = tempdir().unwrap();
    store_session(dir.path(), &server.base_url());

    let mut cmd = cargo_bin_cmd!("podmanager-cli");
    cmd.env("PODMANAGER_CLI_CONFIG_DIR", dir.path())
        .args(["infra", "list", "--filter", "badcondition"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("invalid filter expression `badcondition`"))
        .stdout(predicate::str::contains("No data found."));
}

#[test]
fn test_http_error_exits_non_zero() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/gsm/gsm/common/getNodeList");
        then.status(500).body("backend down");
    });

    let dir = tempdir().unwrap();
    store_session(dir.path(), &server.base_url());

    let mut cmd = cargo_bin_cmd!("podmanager-cli");
    cmd.env("PODMANAGER_CLI_CONFIG_DIR", dir.path())
        .args(["infra", "list"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("500"))
        .stderr(predicate::str::contains("backend down"));
}

#[test]
fn test_logout_clears_session() {
    let dir = tempdir().unwrap();
    store_session(dir.path(), "https://pod.example");

    let mut cmd = cargo_bin_cmd!("podmanager-cli");
    cmd.env("PODMANAGER_CLI_CONFIG_DIR", dir.path()).arg("logout");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Logout successful."));
    assert!(!dir.path().join("config").exists());
}
