//! Binary smoke tests that need no provider.

mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;

fn askcsv() -> Command {
    let mut cmd = Command::cargo_bin("askcsv").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("ASKCSV_PROVIDER")
        .env_remove("ASKCSV_USAGE_LOG")
        .env_remove("ASKCSV_FAST_MODEL")
        .env_remove("ASKCSV_ACCURATE_MODEL");
    cmd
}

#[test]
fn test_help_lists_commands() {
    askcsv()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("ask"))
        .stdout(predicate::str::contains("usage"));
}

#[test]
fn test_invalid_tier_is_rejected() {
    askcsv()
        .args(["ask", "--tier", "medium", "How many rows?"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown model tier: medium"));
}

#[test]
fn test_invalid_provider_fails_validation() {
    let (_dir, config) = common::temp_config_file("provider:\n  type: bedrock\n");
    askcsv()
        .arg("--config")
        .arg(&config)
        .args(["models", "current"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid provider type: bedrock"));
}

#[test]
fn test_models_current_shows_both_tiers() {
    let (_dir, config) = common::temp_config_file(
        "provider:\n  type: openai\nmodels:\n  fast: gpt-4o-mini\n  accurate: gpt-4o\n",
    );
    askcsv()
        .arg("--config")
        .arg(&config)
        .args(["models", "current"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gpt-4o-mini"))
        .stdout(predicate::str::contains("gpt-4o"))
        .stdout(predicate::str::contains("(default)"));
}

#[test]
fn test_usage_with_empty_ledger() {
    let dir = tempfile::TempDir::new().unwrap();
    askcsv()
        .env("ASKCSV_USAGE_LOG", dir.path().join("usage.jsonl"))
        .args(["--config", "/nonexistent/askcsv.yaml", "usage"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No usage recorded yet"));
}

#[test]
fn test_usage_summarizes_ledger_as_json() {
    let dir = tempfile::TempDir::new().unwrap();
    let ledger = dir.path().join("usage.jsonl");
    let lines = [
        json!({
            "id": "6f1c1b1e-8a7e-4c55-9d2a-1f6f5f0e6a01",
            "timestamp": "2023-06-01T10:00:00Z",
            "model": "gpt-3.5-turbo",
            "tier": "fast",
            "prompt_tokens": 400,
            "completion_tokens": 20,
            "total_tokens": 420,
            "successful_requests": 2,
            "total_cost_usd": 0.00064,
            "duration_ms": 1800
        }),
        json!({
            "id": "6f1c1b1e-8a7e-4c55-9d2a-1f6f5f0e6a02",
            "timestamp": "2023-06-01T10:05:00Z",
            "model": "gpt-4",
            "tier": "accurate",
            "prompt_tokens": 1000,
            "completion_tokens": 10,
            "total_tokens": 1010,
            "successful_requests": 1,
            "tool_calls": 0,
            "total_cost_usd": 0.0306,
            "duration_ms": 5200
        }),
    ];
    let text: String = lines.iter().map(|l| format!("{}\n", l)).collect();
    std::fs::write(&ledger, text).unwrap();

    let output = askcsv()
        .env("ASKCSV_USAGE_LOG", &ledger)
        .args(["--config", "/nonexistent/askcsv.yaml", "usage", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["queries"], 2);
    assert_eq!(report["total_tokens"], 1430);
    assert_eq!(report["by_model"][0]["model"], "gpt-3.5-turbo");
    assert_eq!(report["by_model"][1]["model"], "gpt-4");

    // --limit keeps only the most recent query
    let output = askcsv()
        .env("ASKCSV_USAGE_LOG", &ledger)
        .args([
            "--config",
            "/nonexistent/askcsv.yaml",
            "usage",
            "--json",
            "--limit",
            "1",
        ])
        .output()
        .unwrap();
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["queries"], 1);
    assert_eq!(report["by_model"][0]["model"], "gpt-4");
}
