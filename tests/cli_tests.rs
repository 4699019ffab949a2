use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn acct_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("acct"))
}

#[test]
fn test_help() {
    acct_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Accounting back-office reports from the command line",
        ));
}

#[test]
fn test_version() {
    acct_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("acct"));
}

#[test]
fn test_init_creates_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("acct-config");

    acct_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized acct config"));

    assert!(config_path.join("config.toml").exists());
    assert!(config_path.join("output").is_dir());
    assert!(config_path.join("fonts").is_dir());
}

#[test]
fn test_init_fails_if_exists() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("acct-config");

    acct_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();

    acct_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_status_without_init() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("nonexistent");

    acct_cmd()
        .args(["-C", config_path.to_str().unwrap(), "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_status_before_login() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("acct-config");

    acct_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();

    acct_cmd()
        .args(["-C", config_path.to_str().unwrap(), "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(not logged in)"))
        .stdout(predicate::str::contains("(none selected)"));
}

#[test]
fn test_report_requires_login() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("acct-config");

    acct_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();

    acct_cmd()
        .args(["-C", config_path.to_str().unwrap(), "report", "vat-sale"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));
}

#[test]
fn test_debtors_require_login() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("acct-config");

    acct_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();

    acct_cmd()
        .args(["-C", config_path.to_str().unwrap(), "debtors"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));
}

#[test]
fn test_login_requires_credentials() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("acct-config");

    acct_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();

    acct_cmd()
        .args(["-C", config_path.to_str().unwrap(), "login"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--username and --password"));
}

fn write_session(config_path: &std::path::Path) {
    fs::write(
        config_path.join("session.toml"),
        r#"token = "test-token"
refresh = "test-refresh"
shop_id = "shop-1"
shop_name = "ร้านทดสอบ"
display_name = ""
username = "tester"
is_authenticated = true
"#,
    )
    .unwrap();
}

/// Point the client at a closed local port so commands fail fast instead of
/// reaching for a real backend.
fn write_offline_config(config_path: &std::path::Path) {
    fs::write(
        config_path.join("config.toml"),
        r#"[api]
base_url = "http://127.0.0.1:9/"
timeout_secs = 2

[pdf]
output_dir = "output"
font_dir = "fonts"
"#,
    )
    .unwrap();
}

#[test]
fn test_report_unknown_kind() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("acct-config");

    acct_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();
    write_session(&config_path);

    acct_cmd()
        .args(["-C", config_path.to_str().unwrap(), "report", "bogus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown report kind 'bogus'"));
}

#[test]
fn test_report_shop_profile_failure_is_reported_not_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("acct-config");

    acct_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();
    write_offline_config(&config_path);
    write_session(&config_path);

    // The backend is unreachable: the shop profile load fails, the report
    // fetch is never attempted, and the command reports the error without
    // a hard failure.
    acct_cmd()
        .args(["-C", config_path.to_str().unwrap(), "report", "vat-sale"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Failed to load shop profile"));
}

#[test]
fn test_status_shows_session() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("acct-config");

    acct_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();
    write_session(&config_path);

    acct_cmd()
        .args(["-C", config_path.to_str().unwrap(), "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tester"))
        .stdout(predicate::str::contains("shop-1"));
}

#[test]
fn test_logout_clears_session() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("acct-config");

    acct_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();
    write_offline_config(&config_path);
    write_session(&config_path);

    acct_cmd()
        .args(["-C", config_path.to_str().unwrap(), "logout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out."));

    assert!(!config_path.join("session.toml").exists());

    acct_cmd()
        .args(["-C", config_path.to_str().unwrap(), "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(not logged in)"));
}

#[test]
fn test_reset_filters() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("acct-config");

    acct_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();

    fs::write(
        config_path.join("filters.toml"),
        r#"[reports.vat-sale]
page = 3
page_size = 20
search = ""

[reports.payable]
page = 1
page_size = 50
search = "C-001"
"#,
    )
    .unwrap();

    acct_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "reset-filters",
            "vat-sale",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared saved filters for vat-sale"));

    let remaining = fs::read_to_string(config_path.join("filters.toml")).unwrap();
    assert!(!remaining.contains("vat-sale"));
    assert!(remaining.contains("payable"));

    acct_cmd()
        .args(["-C", config_path.to_str().unwrap(), "reset-filters"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared all saved filters"));
}

#[test]
fn test_reset_filters_unknown_kind() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("acct-config");

    acct_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();

    acct_cmd()
        .args(["-C", config_path.to_str().unwrap(), "reset-filters", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown report kind"));
}
