// ABOUTME: Integration tests for the cfship CLI commands.
// ABOUTME: Validates --help output, init, and the offline artifact commands.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn cfship_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("cfship"))
}

fn app_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("index.html"), "<h1>hi</h1>").unwrap();
    dir
}

#[test]
fn help_shows_commands() {
    cfship_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("fingerprint"))
        .stdout(predicate::str::contains("package"))
        .stdout(predicate::str::contains("remote-fingerprint"));
}

#[test]
fn init_creates_config_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("cfship.yml");

    cfship_cmd()
        .current_dir(temp_dir.path())
        .arg("init")
        .assert()
        .success();

    assert!(config_path.exists(), "cfship.yml should be created");
    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("endpoint:"), "Config should have endpoint field");
}

#[test]
fn init_refuses_to_overwrite_existing_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("cfship.yml");

    fs::write(&config_path, "existing: config").unwrap();

    cfship_cmd()
        .current_dir(temp_dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn fingerprint_is_repeatable() {
    let dir = app_dir();
    let location = dir.path().to_str().unwrap();

    let first = cfship_cmd()
        .args(["--quiet", "fingerprint", location])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let second = cfship_cmd()
        .args(["--quiet", "fingerprint", location])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    assert_eq!(first, second);
    assert_eq!(String::from_utf8(first).unwrap().trim().len(), 28);
}

#[test]
fn diff_without_known_reports_change_as_json() {
    let dir = app_dir();

    cfship_cmd()
        .args(["--json", "diff", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""event":"result""#))
        .stdout(predicate::str::contains(r#""changed":true"#));
}

#[test]
fn package_writes_zip() {
    let dir = app_dir();
    let out = tempfile::tempdir().unwrap();
    let zip_path = out.path().join("app.zip");

    cfship_cmd()
        .args(["package", dir.path().to_str().unwrap(), "--output"])
        .arg(&zip_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));

    let bytes = fs::read(&zip_path).unwrap();
    assert_eq!(&bytes[..2], b"PK");
}

#[test]
fn unknown_location_fails() {
    cfship_cmd()
        .args(["fingerprint", "/no/such/path/anywhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be found"));
}

#[test]
fn upload_without_config_fails() {
    let temp_dir = tempfile::tempdir().unwrap();
    cfship_cmd()
        .current_dir(temp_dir.path())
        .args(["upload", "app-guid", "."])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration file not found"));
}
