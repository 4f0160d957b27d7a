//! Integration tests for the CLI interface
//!
//! Covers command parsing and the offline export path; everything that
//! needs the backend is exercised at the unit level instead.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_cli_help_flag() {
    let mut cmd = Command::cargo_bin("gurudesk").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"));
}

#[test]
fn test_no_command_shows_usage() {
    let mut cmd = Command::cargo_bin("gurudesk").unwrap();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_generate_help() {
    let mut cmd = Command::cargo_bin("gurudesk").unwrap();
    cmd.arg("generate")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generation wizard"));
}

#[test]
fn test_generate_prota_requires_class() {
    let mut cmd = Command::cargo_bin("gurudesk").unwrap();
    cmd.arg("generate")
        .arg("prota")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--class"));
}

#[test]
fn test_invalid_command() {
    let mut cmd = Command::cargo_bin("gurudesk").unwrap();
    cmd.arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn test_export_rejects_unknown_format() {
    let mut cmd = Command::cargo_bin("gurudesk").unwrap();
    cmd.args(["export", "--input", "result.json", "--format", "odt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("odt"));
}

#[test]
fn test_export_missing_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("gurudesk").unwrap();
    cmd.current_dir(dir.path())
        .args(["export", "--input", "missing.json", "--format", "pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot read"));
}

#[test]
fn test_export_writes_pdf_from_saved_result() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("result.json");
    std::fs::write(
        &input,
        r#"{
            "data": {
                "document_structure": {"Judul": "Program Tahunan Uji"},
                "DAFTAR_PROTA_UTAMA": [
                    {"Unit": "1", "Alur Tujuan Pembelajaran": "Uji", "Alokasi Waktu": "2 JP", "Semester": "1"}
                ]
            },
            "msg": "ok"
        }"#,
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("gurudesk").unwrap();
    cmd.current_dir(dir.path())
        .args(["export", "--input", "result.json", "--format", "pdf"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Prota_Generated.pdf"));

    let exported = dir.path().join("Prota_Generated.pdf");
    assert!(exported.exists());
}

#[test]
fn test_export_accepts_bare_document_content() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("prota.json");
    std::fs::write(
        &input,
        r#"{
            "document_structure": {"Judul": "Prota Tersimpan"},
            "items": [{"Unit": "1", "Semester": "1"}]
        }"#,
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("gurudesk").unwrap();
    cmd.current_dir(dir.path())
        .args(["export", "--input", "prota.json", "--format", "docx"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Prota_Generated.docx"));

    assert!(dir.path().join("Prota_Generated.docx").exists());
}
