//! Binary-level tests for the `linksync` CLI.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn linksync(data_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("linksync").unwrap();
    cmd.arg("--data-dir").arg(data_dir.path()).env("RUST_LOG", "warn");
    cmd
}

#[test]
fn trigger_sends_then_skips_unchanged() {
    let dir = TempDir::new().unwrap();

    linksync(&dir)
        .args(["trigger", "accounts-changed", "--payload", "alice,bob"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("sent "));

    linksync(&dir)
        .args(["trigger", "accounts-changed", "--payload", "alice,bob"])
        .assert()
        .success()
        .stdout(predicate::str::contains("skipped: unchanged since last sync"));

    let spooled = std::fs::read_dir(dir.path().join("outbox")).unwrap().count();
    assert_eq!(spooled, 1);
}

#[test]
fn forget_allows_resend() {
    let dir = TempDir::new().unwrap();

    linksync(&dir)
        .args(["trigger", "profile-key-changed", "--payload", "v1"])
        .assert()
        .success();

    linksync(&dir)
        .args(["forget", "contacts"])
        .assert()
        .success()
        .stdout(predicate::str::contains("forgot last contacts sync"));

    linksync(&dir)
        .args(["trigger", "profile-key-changed", "--payload", "v1"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("sent "));
}

#[test]
fn trigger_without_state_fails() {
    let dir = TempDir::new().unwrap();

    linksync(&dir)
        .args(["trigger", "sync-groups"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("groups sync for sync-groups failed"));
}

#[test]
fn local_record_reads_record_file() {
    let dir = TempDir::new().unwrap();
    let records = dir.path().join("state").join("contacts.d");
    std::fs::create_dir_all(&records).unwrap();
    std::fs::write(records.join("alice"), "alice@example.org").unwrap();

    linksync(&dir)
        .args(["trigger", "sync-local-record", "--record", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("sent "));
}

#[test]
fn status_reports_last_sent() {
    let dir = TempDir::new().unwrap();

    linksync(&dir)
        .args(["trigger", "app-ready", "--payload", "theme=dark"])
        .assert()
        .success();

    linksync(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Outbox:       1 spooled"))
        .stdout(predicate::str::contains("groups         never"));

    linksync(&dir)
        .args(["status", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"kind\": \"configuration\""));
}

#[test]
fn listen_reads_triggers_from_stdin() {
    let dir = TempDir::new().unwrap();
    let state = dir.path().join("state");
    std::fs::create_dir_all(&state).unwrap();
    std::fs::write(state.join("configuration"), "theme=light").unwrap();

    linksync(&dir)
        .arg("listen")
        .write_stdin("app-ready\nsettings-changed\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 triggers: 2 sent"));
}
