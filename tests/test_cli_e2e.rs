//! End-to-end tests running the `trafficlight` binary.

mod common;

use common::{fixture_path, spawn_command, spawn_command_with_logs};

#[test]
fn version_human() {
    let output = spawn_command(&["version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("trafficlight "), "unexpected output: {stdout}");
}

#[test]
fn version_json() {
    let output = spawn_command(&["version", "--format", "json"]);
    assert!(output.status.success());
    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("output should be valid JSON");
    assert_eq!(parsed["name"], "trafficlight");
}

#[test]
fn completions_bash() {
    let output = spawn_command(&["completions", "bash"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("trafficlight"));
}

#[test]
fn validate_valid_config() {
    let config = fixture_path("valid.yaml");
    let output = spawn_command(&["validate", config.to_str().unwrap()]);
    assert!(
        output.status.success(),
        "validate should succeed for valid config: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains(": ok"));
}

#[test]
fn validate_inverted_dwell_fails_with_config_code() {
    let config = fixture_path("inverted_dwell.yaml");
    let output = spawn_command(&["validate", config.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn validate_unknown_field_fails() {
    let config = fixture_path("unknown_field.yaml");
    let output = spawn_command(&["validate", config.to_str().unwrap()]);
    assert!(!output.status.success());
}

#[test]
fn validate_missing_file() {
    let output = spawn_command(&["validate", "/tmp/nonexistent_trafficlight_test_file.yaml"]);
    assert!(!output.status.success());
}

#[test]
fn validate_strict_rejects_warnings() {
    let config = fixture_path("short_dwell.yaml");
    let path = config.to_str().unwrap();

    let lenient = spawn_command(&["validate", path]);
    assert!(lenient.status.success());

    let strict = spawn_command(&["validate", "--strict", path]);
    assert!(!strict.status.success());
}

#[test]
fn validate_json_output() {
    let config = fixture_path("valid.yaml");
    let output = spawn_command(&["validate", "--format", "json", config.to_str().unwrap()]);
    assert!(output.status.success());

    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("output should be valid JSON");
    assert_eq!(parsed[0]["valid"], true);
}

#[test]
fn run_for_fixed_duration() {
    let output = spawn_command(&[
        "run",
        "--quiet",
        "--duration",
        "300ms",
        "--min-dwell",
        "20ms",
        "--max-dwell",
        "40ms",
        "--vehicles",
        "2",
        "--seed",
        "5",
        "--format",
        "json",
    ]);
    assert!(
        output.status.success(),
        "run should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let summary: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("summary should be valid JSON");
    assert!(summary["transitions"].as_u64().unwrap() >= 1);
    assert_eq!(summary["vehicles"].as_array().unwrap().len(), 2);
    assert!(summary["elapsed_ms"].as_u64().unwrap() >= 300);
}

#[test]
fn run_rejects_inverted_override() {
    let output = spawn_command(&[
        "run",
        "--quiet",
        "--duration",
        "10ms",
        "--min-dwell",
        "2s",
        "--max-dwell",
        "1s",
    ]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn verbose_validate_logs_to_stderr() {
    let config = fixture_path("valid.yaml");
    let output = spawn_command_with_logs(&["-v", "validate", config.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("validating configuration"));
}

#[test]
fn quiet_suppresses_logs_but_keeps_results() {
    let config = fixture_path("valid.yaml");
    let output = spawn_command_with_logs(&["-vv", "-q", "validate", config.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(
        output.stderr.is_empty(),
        "quiet run should not log: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains(": ok"));
}
