//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway data directory and
//! verify outputs.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// Run a CLI command and return (code, stdout, stderr).
fn run_cli(data_dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_studydesk"))
        .args(args)
        .env("STUDYDESK_DATA_DIR", data_dir)
        .env_remove("STUDYDESK_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn json_lines(stdout: &str) -> Vec<serde_json::Value> {
    stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).expect("Failed to parse JSON line"))
        .collect()
}

#[test]
fn test_timer_start_and_status() {
    let dir = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["timer", "start", "--subject", "Physics"]);
    assert_eq!(code, 0);
    let events = json_lines(&stdout);
    assert!(events.iter().any(|e| e["type"] == "timer"));

    let (code, stdout, _) = run_cli(dir.path(), &["timer", "status"]);
    assert_eq!(code, 0);
    let snapshot: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(snapshot["subject"], "Physics");
    assert_eq!(snapshot["timer"]["running"], true);
    assert_eq!(snapshot["timer"]["mode"], "continuous");
}

#[test]
fn test_short_stop_reports_too_short() {
    let dir = TempDir::new().unwrap();
    run_cli(dir.path(), &["timer", "start"]);
    let (code, stdout, _) = run_cli(dir.path(), &["timer", "stop"]);
    assert_eq!(code, 0);
    let events = json_lines(&stdout);
    assert!(events.iter().any(|e| e["type"] == "session_too_short"));

    let (code, stdout, _) = run_cli(dir.path(), &["progress", "sessions"]);
    assert_eq!(code, 0);
    let sessions: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(sessions.as_array().map(Vec::len), Some(0));
}

#[test]
fn test_mode_switch_to_interval() {
    let dir = TempDir::new().unwrap();
    let (code, _, _) = run_cli(dir.path(), &["timer", "mode", "interval"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(dir.path(), &["timer", "status"]);
    let snapshot: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(snapshot["timer"]["mode"], "interval");
    assert_eq!(snapshot["timer"]["remainingOrElapsedSeconds"], 1500);
}

#[test]
fn test_unknown_mode_fails() {
    let dir = TempDir::new().unwrap();
    let (code, _, _) = run_cli(dir.path(), &["timer", "mode", "sideways"]);
    assert_ne!(code, 0);
}

#[test]
fn test_progress_today_lists_subjects() {
    let dir = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["progress", "today"]);
    assert_eq!(code, 0);
    let progress: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(progress["minutesBySubject"]["Physics"], 0);
    assert!(progress["date"].is_string());
}

#[test]
fn test_config_set_and_get() {
    let dir = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "interval.work_minutes"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "25");

    let (code, _, _) = run_cli(dir.path(), &["config", "set", "interval.work_minutes", "50"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "interval.work_minutes"]);
    assert_eq!(stdout.trim(), "50");
}

#[test]
fn test_config_rejects_zero_duration() {
    let dir = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["config", "set", "interval.break_minutes", "0"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_config_path_is_in_data_dir() {
    let dir = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["config", "path"]);
    assert_eq!(code, 0);
    assert!(stdout.trim().ends_with("config.toml"));
    assert!(stdout.contains(&*dir.path().to_string_lossy()));
}

#[test]
fn test_sync_without_endpoint_fails() {
    let dir = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["sync", "run"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("sync.endpoint"));

    let (code, stdout, _) = run_cli(dir.path(), &["sync", "status"]);
    assert_eq!(code, 0);
    let status: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(status["pending_count"], 0);
    assert_eq!(status["online"], false);
}
