//! Integration tests for the `psse2grg` binary

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn repo_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join(relative)
}

fn case5() -> PathBuf {
    repo_path("test_data/psse/case5.raw")
}

/// Translate case5 to GRG and store it as `case5.json` under `dir`.
fn write_grg(dir: &Path) -> PathBuf {
    let output = cargo_bin_cmd!("psse2grg")
        .arg(case5())
        .output()
        .unwrap();
    assert!(output.status.success());
    let path = dir.join("case5.json");
    std::fs::write(&path, &output.stdout).unwrap();
    path
}

#[test]
fn test_help() {
    cargo_bin_cmd!("psse2grg")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--starting-point-mapping"))
        .stdout(predicate::str::contains("--idempotent"));
}

#[test]
fn test_raw_to_grg() {
    let output = cargo_bin_cmd!("psse2grg")
        .arg(case5())
        .output()
        .unwrap();
    assert!(output.status.success());

    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(doc["network"]["id"], "case5");
    assert_eq!(doc["network"]["subtype"], "bus_breaker");
    assert!(doc["mappings"]["starting_points"].is_object());
    assert!(doc["mappings"]["breakers_assignment"].is_object());
}

#[test]
fn test_idempotent_raw() {
    cargo_bin_cmd!("psse2grg")
        .arg(case5())
        .arg("-i")
        .assert()
        .success()
        .stdout("idempotent test: true\n");
}

#[test]
fn test_grg_to_raw() {
    let dir = tempdir().unwrap();
    let json = write_grg(dir.path());

    cargo_bin_cmd!("psse2grg")
        .arg(&json)
        .assert()
        .success()
        .stdout(predicate::str::contains("PJM 5 BUS SYSTEM"))
        .stdout(predicate::str::contains("END OF BUS DATA"))
        .stdout(predicate::str::ends_with("Q\n"));
}

#[test]
fn test_idempotent_rejects_grg() {
    let dir = tempdir().unwrap();
    let json = write_grg(dir.path());

    cargo_bin_cmd!("psse2grg")
        .arg(&json)
        .arg("--idempotent")
        .assert()
        .failure()
        .stderr(predicate::str::contains("RAW case"));
}

#[test]
fn test_unknown_extension() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("case5.m");
    std::fs::copy(case5(), &path).unwrap();

    cargo_bin_cmd!("psse2grg")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unrecognized input format"));
}

#[test]
fn test_missing_mapping() {
    let dir = tempdir().unwrap();
    let json = write_grg(dir.path());

    cargo_bin_cmd!("psse2grg")
        .arg(&json)
        .args(["-s", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing mapping 'nope'"));
}

#[test]
fn test_custom_mapping_names_round_trip() {
    let dir = tempdir().unwrap();
    let output = cargo_bin_cmd!("psse2grg")
        .arg(case5())
        .args(["-s", "start", "-w", "breakers"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json = dir.path().join("named.json");
    std::fs::write(&json, &output.stdout).unwrap();

    cargo_bin_cmd!("psse2grg")
        .arg(&json)
        .args(["-s", "start", "-w", "breakers"])
        .assert()
        .success();

    cargo_bin_cmd!("psse2grg")
        .arg(&json)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing mapping"));
}

#[test]
fn test_omit_subtypes_from_config() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("psse2grg.toml");
    std::fs::write(
        &config,
        "[translation]\nomit_subtypes = true\n\n[logging]\nlevel = \"error\"\n",
    )
    .unwrap();

    cargo_bin_cmd!("psse2grg")
        .arg(case5())
        .assert()
        .success()
        .stdout(predicate::str::contains("PI_model"));

    cargo_bin_cmd!("psse2grg")
        .arg(case5())
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("PI_model").not())
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_missing_input() {
    cargo_bin_cmd!("psse2grg")
        .arg("no_such_case.raw")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no_such_case.raw"));
}
