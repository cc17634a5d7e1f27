//! Startup-validation integration tests for the ccp CLI.
//!
//! Real transfers need cloud credentials, so these tests only exercise the
//! paths that must fail (or complete trivially) before any storage call.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

const AZURE_URL: &str = "https://testaccount.blob.core.windows.net/";

#[test]
fn test_missing_azure_url_is_rejected() {
    cargo_bin_cmd!("ccp")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--azure-url"));
}

#[test]
fn test_unknown_tier_is_rejected_at_startup() {
    cargo_bin_cmd!("ccp")
        .args(["--azure-url", AZURE_URL, "--azure-tier", "lukewarm"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("lukewarm"));
}

#[test]
fn test_tier_values_are_case_insensitive() {
    // "Hot" (as the original tool spelled it) must parse; the run itself
    // fails later on the empty-but-invalid input path, not on the tier.
    cargo_bin_cmd!("ccp")
        .args([
            "--azure-url",
            AZURE_URL,
            "--azure-tier",
            "Hot",
            "--input",
            "/definitely/not/here.tsv",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("here.tsv"));
}

#[test]
fn test_missing_input_file_fails_before_any_transfer() {
    cargo_bin_cmd!("ccp")
        .args(["--azure-url", AZURE_URL, "--input", "/definitely/not/here.tsv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not open input file"));
}

#[test]
fn test_malformed_manifest_aborts_with_line_number() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("manifest.tsv");
    std::fs::write(&path, "only-one-field\n").unwrap();

    cargo_bin_cmd!("ccp")
        .args(["--azure-url", AZURE_URL])
        .arg("--input")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("wrong number of fields at line 1"));
}

#[test]
fn test_empty_manifest_exits_zero_with_summary() {
    cargo_bin_cmd!("ccp")
        .args(["--azure-url", AZURE_URL])
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("Processed 0 items (0 errors)"));
}
