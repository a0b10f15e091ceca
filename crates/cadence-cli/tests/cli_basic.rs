//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary with HOME pointed at a scratch directory so
//! the user's real configuration is never touched.

use std::path::{Path, PathBuf};
use std::process::Command;

const SNAPSHOT: &str = r#"{
  "projects": [
    { "id": "thesis", "name": "Thesis", "start_date": "2026-10-01", "target_date": "2026-12-31" },
    { "id": "guitar", "name": "Guitar", "start_date": "2026-10-01" }
  ],
  "work_items": [
    {
      "id": "lit", "project_id": "thesis", "node_id": "ch1", "title": "Literature review",
      "status": "in_progress", "planned_min": 100, "logged_min": 60,
      "min_session_min": 15, "max_session_min": 60, "preferred_session_min": 30,
      "units_total": 10, "units_done": 3
    },
    {
      "id": "scales", "project_id": "guitar", "node_id": "basics", "title": "Scales",
      "planned_min": 120, "min_session_min": 15, "max_session_min": 45, "preferred_session_min": 20
    }
  ]
}"#;

const AT: &str = "2026-10-16T08:00:00Z";

struct Sandbox {
    dir: tempfile::TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("snapshot.json"), SNAPSHOT).unwrap();
        Self { dir }
    }

    fn snapshot(&self) -> PathBuf {
        self.dir.path().join("snapshot.json")
    }

    fn home(&self) -> &Path {
        self.dir.path()
    }

    /// Run a CLI command and return (stdout, stderr, exit code).
    fn run(&self, args: &[&str]) -> (String, String, i32) {
        let output = Command::new(env!("CARGO_BIN_EXE_cadence"))
            .args(args)
            .env("HOME", self.home())
            .env_remove("CADENCE_ENV")
            .env_remove("CADENCE_LOG")
            .output()
            .expect("Failed to execute CLI command");

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let code = output.status.code().unwrap_or(-1);
        (stdout, stderr, code)
    }

    fn run_with_snapshot(&self, args: &[&str]) -> (String, String, i32) {
        let snapshot = self.snapshot();
        let mut full: Vec<&str> = args.to_vec();
        full.extend(["--snapshot", snapshot.to_str().unwrap(), "--at", AT]);
        self.run(&full)
    }
}

#[test]
fn test_recommend_json() {
    let sb = Sandbox::new();
    let (stdout, stderr, code) = sb.run_with_snapshot(&["recommend", "--minutes", "60", "--json"]);
    assert_eq!(code, 0, "recommend failed: {stderr}");

    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["available_min"], 60);
    assert_eq!(json["total_allocated_min"], 60);
    let projects: Vec<&str> = json["slices"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["project_id"].as_str().unwrap())
        .collect();
    assert!(projects.contains(&"thesis"));
    assert!(projects.contains(&"guitar"));
}

#[test]
fn test_recommend_text() {
    let sb = Sandbox::new();
    let (stdout, _, code) = sb.run_with_snapshot(&["recommend", "--minutes", "45"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Mode: balanced"));
    assert!(stdout.contains("Literature review") || stdout.contains("Scales"));
}

#[test]
fn test_recommend_negative_minutes_fails() {
    let sb = Sandbox::new();
    let (_, stderr, code) = sb.run_with_snapshot(&["recommend", "--minutes=-5"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("non-negative"), "stderr: {stderr}");
}

#[test]
fn test_no_eligible_work_exits_zero() {
    let sb = Sandbox::new();
    let (stdout, _, code) = sb.run_with_snapshot(&["recommend", "--minutes", "5", "--json"]);
    assert_eq!(code, 0);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["status"], "no_eligible_work");
    assert_eq!(json["blockers"].as_array().unwrap().len(), 2);
}

#[test]
fn test_status_json() {
    let sb = Sandbox::new();
    let (stdout, _, code) = sb.run_with_snapshot(&["status", "--json"]);
    assert_eq!(code, 0);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["projects"].as_array().unwrap().len(), 2);
    assert_eq!(json["projects"][0]["aggregate"]["project_id"], "thesis");
}

#[test]
fn test_missing_snapshot_fails() {
    let sb = Sandbox::new();
    let (_, stderr, code) = sb.run(&["status", "--snapshot", "/nonexistent/snapshot.json"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_negative_logged_minutes_fail_every_command() {
    let sb = Sandbox::new();
    let bad = SNAPSHOT.replace(r#""logged_min": 60"#, r#""logged_min": -60"#);
    std::fs::write(sb.snapshot(), bad).unwrap();
    for cmd in ["status", "replan", "recommend"] {
        let (stdout, stderr, code) = sb.run_with_snapshot(&[cmd]);
        assert_eq!(code, 1, "{cmd} should fail: {stdout}");
        assert!(stderr.contains("logged_min"), "{cmd} stderr: {stderr}");
    }
}

#[test]
fn test_replan_apply_persists() {
    let sb = Sandbox::new();
    let (stdout, _, code) = sb.run_with_snapshot(&["replan", "--json"]);
    assert_eq!(code, 0);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["changes"][0]["new_planned_min"], 130);

    // dry run leaves the file alone
    let unchanged: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(sb.snapshot()).unwrap()).unwrap();
    assert_eq!(unchanged["work_items"][0]["planned_min"], 100);

    let (_, _, code) = sb.run_with_snapshot(&["replan", "--apply"]);
    assert_eq!(code, 0);
    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(sb.snapshot()).unwrap()).unwrap();
    assert_eq!(saved["work_items"][0]["planned_min"], 130);
}

#[test]
fn test_config_set_get_reset() {
    let sb = Sandbox::new();
    let (stdout, _, code) = sb.run(&["config", "get", "defaults.available_min"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "60");

    let (_, _, code) = sb.run(&["config", "set", "defaults.available_min", "90"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = sb.run(&["config", "get", "defaults.available_min"]);
    assert_eq!(stdout.trim(), "90");
    assert!(sb.home().join(".config/cadence/config.toml").exists());

    let (_, stderr, code) = sb.run(&["config", "set", "profile.buffer_pct", "9"]);
    assert_eq!(code, 1, "stderr: {stderr}");

    let (_, _, code) = sb.run(&["config", "reset"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = sb.run(&["config", "get", "defaults.available_min"]);
    assert_eq!(stdout.trim(), "60");
}

#[test]
fn test_config_snapshot_default_is_used() {
    let sb = Sandbox::new();
    let snapshot = sb.snapshot();
    let (_, _, code) = sb.run(&["config", "set", "defaults.snapshot_path", snapshot.to_str().unwrap()]);
    assert_eq!(code, 0);
    let (stdout, _, code) = sb.run(&["status", "--at", AT, "--json"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("\"thesis\""));
}

#[test]
fn test_completions() {
    let sb = Sandbox::new();
    let (stdout, _, code) = sb.run(&["completions", "bash"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("cadence"));
}
