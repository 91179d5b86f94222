//! Smoke tests -- verify the binary runs and its subcommands are wired.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_cli_help() {
    Command::cargo_bin("cartlog")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicates::str::contains("Status-change history log"));
}

#[test]
fn test_cli_version() {
    Command::cargo_bin("cartlog")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicates::str::contains("cartlog"));
}

#[test]
fn test_serve_subcommand_exists() {
    Command::cargo_bin("cartlog")
        .unwrap()
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicates::str::contains("--port"));
}

#[test]
fn test_history_reads_store_file() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("history.json"),
        r#"[
  {"cart":"Cart 1","status":"Charging","comment":"dock 2","date":"2026-01-02","time":"08:00:00"},
  {"cart":"Cart 2","status":"Other","comment":"","date":"2026-01-02","time":"08:05:00"}
]"#,
    )
    .unwrap();

    Command::cargo_bin("cartlog")
        .unwrap()
        .current_dir(dir.path())
        .env_remove("CARTLOG_CONFIG")
        .args(["history", "--cart", "Cart 1", "--date", "2026-01-02", "--data-dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicates::str::contains("[08:00:00] Charging - dock 2"))
        .stdout(predicates::str::contains("Other").not());

    Command::cargo_bin("cartlog")
        .unwrap()
        .current_dir(dir.path())
        .env_remove("CARTLOG_CONFIG")
        .args(["history", "--cart", "Cart 9", "--date", "2026-01-02", "--data-dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicates::str::contains("No changes recorded for Cart 9 on 2026-01-02."));
}
