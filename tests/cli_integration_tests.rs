//! CLI Integration Tests
//!
//! Drives the `splitter` binary with assert_cmd.

#![allow(deprecated)] // Command::cargo_bin deprecation - no stable replacement yet

use assert_cmd::Command;
use predicates::prelude::*;
use rust_xlsxwriter::Workbook;
use std::path::Path;
use tempfile::TempDir;

fn write_master(path: &Path) {
    let mut workbook = Workbook::new();

    let aggregated = workbook.add_worksheet();
    aggregated.set_name("Aggregated Data").unwrap();
    for (col, header) in ["Name", "SR ID", "Request Date"].iter().enumerate() {
        aggregated.write_string(0, col as u16, *header).unwrap();
    }
    let rows = [
        ("Acme", 1.0, "2024-07-01"),
        ("Acme", 2.0, "2024-07-02"),
        ("Beta", 3.0, "2024-07-01"),
    ];
    for (idx, (name, id, date)) in rows.iter().enumerate() {
        let row = idx as u32 + 1;
        aggregated.write_string(row, 0, *name).unwrap();
        aggregated.write_number(row, 1, *id).unwrap();
        aggregated.write_string(row, 2, *date).unwrap();
    }

    let actions = workbook.add_worksheet();
    actions.set_name("Summary of Actions").unwrap();
    actions.write_string(0, 0, "SR ID").unwrap();
    actions.write_string(0, 1, "Action").unwrap();
    for (idx, id) in [1.0, 2.0, 3.0].iter().enumerate() {
        actions.write_number(idx as u32 + 1, 0, *id).unwrap();
        actions.write_string(idx as u32 + 1, 1, "call").unwrap();
    }

    let last_drop = workbook.add_worksheet();
    last_drop.set_name("Last Drop").unwrap();
    last_drop.write_string(0, 0, "Name").unwrap();

    workbook.save(path).unwrap();
}

fn write_config(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("splitter.yaml");
    std::fs::write(
        &path,
        "mail_copy_columns: [SR ID, Name, Request Date]\n",
    )
    .unwrap();
    path
}

// ═══════════════════════════════════════════════════════════════════════════
// HELP AND VERSION TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("splitter").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("splitter"))
        .stdout(predicate::str::contains("COMMANDS"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("splitter").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("splitter"));
}

#[test]
fn test_split_help() {
    let mut cmd = Command::cargo_bin("splitter").unwrap();
    cmd.args(["split", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DATE FILTER"));
}

#[test]
fn test_split_requires_source_and_destination() {
    let mut cmd = Command::cargo_bin("splitter").unwrap();
    cmd.arg("split").assert().failure();

    let mut cmd = Command::cargo_bin("splitter").unwrap();
    cmd.args(["split", "master.xlsx"]).assert().failure();
}

// ═══════════════════════════════════════════════════════════════════════════
// SPLIT
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_split_creates_one_file_per_key() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("master.xlsx");
    write_master(&source);
    let config = write_config(temp.path());
    let out = temp.path().join("out");

    let mut cmd = Command::cargo_bin("splitter").unwrap();
    cmd.arg("split")
        .arg(&source)
        .arg(&out)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created"))
        .stdout(predicate::str::contains("Acme.xlsx"))
        .stdout(predicate::str::contains("Beta.xlsx"));

    assert!(out.join("Acme.xlsx").is_file());
    assert!(out.join("Beta.xlsx").is_file());
}

#[test]
fn test_split_with_date_suffix() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("master.xlsx");
    write_master(&source);
    let config = write_config(temp.path());
    let out = temp.path().join("out");

    let mut cmd = Command::cargo_bin("splitter").unwrap();
    cmd.arg("split")
        .arg(&source)
        .arg(&out)
        .args(["--date", "2024-07-01"])
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    assert!(out.join("Acme_2024-07-01.xlsx").is_file());
    assert!(out.join("Beta_2024-07-01.xlsx").is_file());
}

#[test]
fn test_split_no_date_suffix() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("master.xlsx");
    write_master(&source);
    let config = write_config(temp.path());
    let out = temp.path().join("out");

    let mut cmd = Command::cargo_bin("splitter").unwrap();
    cmd.arg("split")
        .arg(&source)
        .arg(&out)
        .args(["--date", "2024-07-01", "--no-date-suffix"])
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    assert!(out.join("Acme.xlsx").is_file());
}

#[test]
fn test_split_json_report() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("master.xlsx");
    write_master(&source);
    let config = write_config(temp.path());
    let out = temp.path().join("out");

    let mut cmd = Command::cargo_bin("splitter").unwrap();
    let output = cmd
        .arg("split")
        .arg(&source)
        .arg(&out)
        .args(["--date", "2024-07-01", "--json", "--dry-run"])
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["filter_date"], "2024-07-01");
    assert_eq!(report["dry_run"], true);
    assert_eq!(report["outputs"].as_array().unwrap().len(), 2);
    assert_eq!(report["outputs"][0]["key"], "Acme");
    assert_eq!(report["outputs"][0]["mail_copy_rows"], 1);
    assert!(!out.exists());
}

#[test]
fn test_split_invalid_date() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("master.xlsx");
    write_master(&source);
    let out = temp.path().join("out");

    let mut cmd = Command::cargo_bin("splitter").unwrap();
    cmd.arg("split")
        .arg(&source)
        .arg(&out)
        .args(["--date", "July 1st"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid date"));

    assert!(!out.exists());
}

#[test]
fn test_split_missing_columns_with_default_config() {
    // default mail-copy columns are the Greek ones, absent from this fixture
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("master.xlsx");
    write_master(&source);
    let out = temp.path().join("out");

    let mut cmd = Command::cargo_bin("splitter").unwrap();
    cmd.arg("split")
        .arg(&source)
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found in sheet 'Aggregated Data'"));

    assert!(!out.exists());
}

#[test]
fn test_split_missing_source() {
    let temp = TempDir::new().unwrap();

    let mut cmd = Command::cargo_bin("splitter").unwrap();
    cmd.arg("split")
        .arg(temp.path().join("nope.xlsx"))
        .arg(temp.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

// ═══════════════════════════════════════════════════════════════════════════
// INSPECT
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_inspect_lists_sheets_and_keys() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("master.xlsx");
    write_master(&source);
    let config = write_config(temp.path());

    let mut cmd = Command::cargo_bin("splitter").unwrap();
    cmd.arg("inspect")
        .arg(&source)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Aggregated Data"))
        .stdout(predicate::str::contains("excluded"))
        .stdout(predicate::str::contains("Partition keys (2)"))
        .stdout(predicate::str::contains("Acme"));
}

#[test]
fn test_inspect_json() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("master.xlsx");
    write_master(&source);
    let config = write_config(temp.path());

    let mut cmd = Command::cargo_bin("splitter").unwrap();
    let output = cmd
        .arg("inspect")
        .arg(&source)
        .arg("--config")
        .arg(&config)
        .arg("--json")
        .output()
        .unwrap();

    assert!(output.status.success());
    let overview: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(overview["keys"][0]["key"], "Acme");
    assert_eq!(overview["keys"][0]["rows"], 2);
    assert_eq!(overview["sheets"][2]["excluded"], true);
}
