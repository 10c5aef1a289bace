//! Binary-level tests for argument handling and early validation

use assert_cmd::Command;
use std::fs;
use tempfile::TempDir;

fn bin() -> Command {
    Command::cargo_bin("bls-data-downloader").unwrap()
}

#[test]
fn test_validate_years_accepts_range() {
    let output = bin()
        .args(["validate", "years", "--start-year", "2000", "--end-year", "2005"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Valid year range: 2000-2005"));
}

#[test]
fn test_validate_years_rejects_long_span() {
    bin()
        .args(["validate", "years", "--start-year", "1990", "--end-year", "2015"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_validate_input_counts_series() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("national_series.csv");
    fs::write(
        &input,
        "seriesID,series,survey\nLNS14000000,Unemployment Rate,LN\nCES0000000001,All employees,CE\n",
    )
    .unwrap();

    let output = bin()
        .args(["validate", "input", input.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("2 series"));
}

#[test]
fn test_download_rejects_bad_years_before_spending_quota() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("series.csv");
    fs::write(&input, "seriesID,series,survey\nLNS14000000,Unemployment Rate,LN\n").unwrap();
    let quota_file = dir.path().join("query_count.txt");

    bin()
        .args([
            "--silence",
            "--quota-file",
            quota_file.to_str().unwrap(),
            "download",
            "--input",
            input.to_str().unwrap(),
            "--start-year",
            "2005",
            "--end-year",
            "2000",
            "--endpoint",
            "http://127.0.0.1:1/",
        ])
        .assert()
        .failure();

    assert!(!quota_file.exists());
}

#[test]
fn test_download_requires_years() {
    bin()
        .args(["download", "--input", "series.csv"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_unreachable_endpoint_meters_attempt() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("series.csv");
    fs::write(&input, "seriesID,series,survey\nLNS14000000,Unemployment Rate,LN\n").unwrap();
    let quota_file = dir.path().join("query_count.txt");
    let output_dir = dir.path().join("out");

    bin()
        .env_remove("BLS_REGISTRATION_KEY")
        .args([
            "--quota-file",
            quota_file.to_str().unwrap(),
            "download",
            "--input",
            input.to_str().unwrap(),
            "--start-year",
            "2000",
            "--end-year",
            "2001",
            "--endpoint",
            "http://127.0.0.1:1/",
            "--max-attempts",
            "1",
            "--output-dir",
            output_dir.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .code(1);

    let contents = fs::read_to_string(&quota_file).unwrap();
    assert!(contents.trim().starts_with("1,"));
    assert!(!output_dir.join("national_results.csv").exists());
}
