//! End-to-end tests for the `ce` binary

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Isolated home with a config that answers from fixtures immediately
fn sandbox() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("census-explorer.yml");
    fs::write(
        &config,
        "log-level: debug\nmock:\n  enabled: true\n  min-delay-ms: 0\n  max-delay-ms: 0\n",
    )
    .unwrap();
    (dir, config)
}

fn ce(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ce").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("XDG_DATA_HOME", dir.path().join("data"))
        .env("XDG_CONFIG_HOME", dir.path().join("config"))
        .env_remove("CENSUS_EXPLORER_MOCK")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_prompts_lists_suggestions() {
    let (dir, _) = sandbox();
    ce(&dir)
        .arg("prompts")
        .assert()
        .success()
        .stdout(predicate::str::contains("Show me population by county"))
        .stdout(predicate::str::contains("Does income correlate with education?"));
}

#[test]
fn test_ask_population_prints_answer_and_table() {
    let (dir, config) = sandbox();
    ce(&dir)
        .arg("--config")
        .arg(&config)
        .args(["ask", "Show me population by county"])
        .assert()
        .success()
        .stdout(predicate::str::contains("New York County (Manhattan)"))
        .stdout(predicate::str::contains("Top 5 Most Populous NY Counties"))
        .stdout(predicate::str::contains("Kings"))
        .stdout(predicate::str::contains("1629054"));
}

#[test]
fn test_ask_json_output() {
    let (dir, config) = sandbox();
    let output = ce(&dir)
        .arg("--config")
        .arg(&config)
        .args(["ask", "Does income correlate with education?", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["status"], "success");
    assert_eq!(body["question"], "Does income correlate with education?");
    assert_eq!(body["data"]["chart_type"], "scatter");
}

#[test]
fn test_ask_blank_question_fails() {
    let (dir, config) = sandbox();
    ce(&dir)
        .arg("--config")
        .arg(&config)
        .args(["ask", "   "])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Question is empty"));
}

#[test]
fn test_ask_unreachable_service_shows_generic_message() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("census-explorer.yml");
    fs::write(&config, "api:\n  timeout-ms: 2000\n").unwrap();

    ce(&dir)
        .arg("--config")
        .arg(&config)
        .args(["--api-url", "http://127.0.0.1:1", "ask", "Show me population by county"])
        .assert()
        .failure()
        .stdout(predicate::str::contains(
            "Unable to connect to the census data service. Please try again later.",
        ));
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("census-explorer.yml");
    fs::write(&config, "mock:\n  enabled: true\n  min-delay-ms: 500\n  max-delay-ms: 100\n").unwrap();

    ce(&dir)
        .arg("--config")
        .arg(&config)
        .arg("prompts")
        .assert()
        .failure()
        .stderr(predicate::str::contains("min-delay-ms"));
}
