//! CLI integration tests

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn pricer(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pricer"))
        .args(args)
        .env_remove("PRICER_API_URL")
        .output()
        .expect("Failed to execute command")
}

fn write_training_csv(path: &Path) {
    let descriptions = [
        "spacious flat near metro",
        "luxury villa with pool",
        "compact studio needs repairs",
        "modern apartment with park view",
    ];
    let mut csv = String::from("area,bedrooms,bathrooms,year_built,lat,lon,description,price\n");
    for i in 0..24 {
        csv.push_str(&format!(
            "{},{},{},{},{},77.59,\"{}\",{}\n",
            600 + 70 * i,
            i % 3 + 1,
            i % 2 + 1,
            1990 + i,
            12.95 + 0.002 * i as f64,
            descriptions[i % descriptions.len()],
            50_000 + 5_500 * i
        ));
    }
    std::fs::write(path, csv).unwrap();
}

const QUERY: &str = r#"{"area": 1200, "bedrooms": 2, "bathrooms": 2, "year_built": 2012, "lat": 12.97, "lon": 77.59, "description": "modern flat"}"#;

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = pricer(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(
        stdout.contains("property price estimator"),
        "Should show app description"
    );
    for command in ["train", "predict", "inspect", "query"] {
        assert!(stdout.contains(command), "Should show {command} command");
    }
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = pricer(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("pricer"), "Should show binary name");
}

#[test]
fn test_train_help() {
    let output = pricer(&["train", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("--data"));
    assert!(stdout.contains("--model-output"));
    assert!(stdout.contains("exhaustive"), "Should list grid choices");
    assert!(stdout.contains("--seed"));
}

#[test]
fn test_predict_help() {
    let output = pricer(&["predict", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("--model"));
    assert!(stdout.contains("--input-json"));
    assert!(stdout.contains("--explain"));
}

/// Test format and api-url options
#[test]
fn test_global_options() {
    let output = pricer(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("--format"), "Should show format option");
    assert!(stdout.contains("table"), "Should show table format");
    assert!(stdout.contains("json"), "Should show json format");
    assert!(stdout.contains("--api-url"), "Should show api-url option");
    assert!(stdout.contains("PRICER_API_URL"), "Should show env var");
}

/// Test invalid command error handling
#[test]
fn test_invalid_command() {
    let output = pricer(&["invalid-command"]);
    assert!(!output.status.success(), "Invalid command should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("error") || stderr.contains("invalid"),
        "Should show error message"
    );
}

/// Test missing required argument error handling
#[test]
fn test_missing_argument() {
    let output = pricer(&["train", "--data", "train.csv"]);
    assert!(!output.status.success(), "Missing argument should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--model-output"));
}

#[test]
fn test_train_fails_on_missing_data_file() {
    let dir = TempDir::new().unwrap();
    let model = dir.path().join("model.json");
    let output = pricer(&[
        "train",
        "--data",
        "/nonexistent/train.csv",
        "--model-output",
        model.to_str().unwrap(),
    ]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to load training data"));
    assert!(!model.exists());
}

/// Train, inspect and predict against the same bundle
#[test]
fn test_train_inspect_predict() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("train.csv");
    let model = dir.path().join("models").join("model.json");
    write_training_csv(&data);
    let model_arg = model.to_str().unwrap();

    let output = pricer(&[
        "--format",
        "json",
        "train",
        "--data",
        data.to_str().unwrap(),
        "--model-output",
        model_arg,
        "--seed",
        "7",
    ]);
    assert!(
        output.status.success(),
        "train failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["n_train"].as_u64().unwrap() + summary["n_validation"].as_u64().unwrap(), 24);
    assert!(model.exists());

    let output = pricer(&["--format", "json", "inspect", "--model", model_arg, "--top", "3"]);
    assert!(output.status.success());
    let bundle: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(bundle["metadata"]["format_version"], 1);
    assert_eq!(bundle["metadata"]["checksum"], summary["checksum"]);
    assert!(bundle["top_features"].as_array().unwrap().len() <= 3);
    assert!(bundle["vocabulary_size"].as_u64().unwrap() > 0);

    let output = pricer(&["--format", "json", "predict", "--model", model_arg, "--input-json", QUERY]);
    assert!(output.status.success());
    let prediction: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let price = prediction["prediction"].as_f64().unwrap();
    assert!(price.is_finite() && price > 0.0);

    let output = pricer(&[
        "--format",
        "json",
        "predict",
        "--model",
        model_arg,
        "--input-json",
        QUERY,
        "--explain",
    ]);
    assert!(output.status.success());
    let explanation: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!((explanation["prediction"].as_f64().unwrap() - price).abs() < 1e-6);
}

#[test]
fn test_predict_reports_schema_mismatch() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("train.csv");
    let model = dir.path().join("model.json");
    write_training_csv(&data);
    let model_arg = model.to_str().unwrap();

    let output = pricer(&[
        "train",
        "--data",
        data.to_str().unwrap(),
        "--model-output",
        model_arg,
    ]);
    assert!(output.status.success());

    let output = pricer(&["predict", "--model", model_arg, "--input-json", r#"{"area": 1000}"#]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("schema mismatch"));
}
