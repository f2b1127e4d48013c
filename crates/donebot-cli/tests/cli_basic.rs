//! Basic CLI E2E tests.
//!
//! Each test gets its own config file and data directory, so nothing touches
//! the real ~/.config/donebot or the OS keyring.

use std::path::PathBuf;
use std::process::Command;

use tempfile::TempDir;

struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = format!(
            "[storage]\ndata_dir = {:?}\n",
            dir.path().join("data").display().to_string()
        );
        std::fs::write(dir.path().join("config.toml"), config).unwrap();
        Self { dir }
    }

    fn config_path(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    /// Run a CLI command and return (stdout, stderr, exit code).
    fn run(&self, args: &[&str]) -> (String, String, i32) {
        let output = Command::new(env!("CARGO_BIN_EXE_donebot"))
            .arg("--config")
            .arg(self.config_path())
            .args(args)
            .env_remove("TELEGRAM_CHAT_ID")
            .env("TELEGRAM_BOT_TOKEN", "123:test")
            .env("RUST_LOG", "off")
            .output()
            .expect("Failed to execute CLI command");

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let code = output.status.code().unwrap_or(-1);
        (stdout, stderr, code)
    }

    fn ok(&self, args: &[&str]) -> String {
        let (stdout, stderr, code) = self.run(args);
        assert_eq!(code, 0, "{args:?} failed: {stderr}");
        stdout
    }
}

#[test]
fn test_tasks_list_starts_with_seed_task() {
    let sb = Sandbox::new();
    assert_eq!(sb.ok(&["tasks", "list"]), "task: Daily task (default)\n");
}

#[test]
fn test_tasks_add_label_default_remove() {
    let sb = Sandbox::new();
    assert_eq!(sb.ok(&["tasks", "add", "gym", "Leg", "day"]), "Added task: gym (Leg day).\n");
    assert_eq!(sb.ok(&["tasks", "label", "gym", "Gym"]), "Updated task: gym (Gym).\n");
    assert_eq!(sb.ok(&["tasks", "default", "GYM"]), "Default task: gym.\n");

    let listing = sb.ok(&["tasks", "list"]);
    assert_eq!(listing, "task: Daily task\ngym: Gym (default)\n");

    assert_eq!(
        sb.ok(&["tasks", "remove", "gym"]),
        "Removed task: gym. Default task: task.\n"
    );
    let json: serde_json::Value = serde_json::from_str(&sb.ok(&["tasks", "list", "--json"])).unwrap();
    assert_eq!(json["default"], "task");
    assert_eq!(json["tasks"].as_array().unwrap().len(), 1);
}

#[test]
fn test_tasks_errors_exit_nonzero() {
    let sb = Sandbox::new();
    let (_, stderr, code) = sb.run(&["tasks", "remove", "nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error: Unknown task: nope."));

    let (_, stderr, code) = sb.run(&["tasks", "add", "Bad Key!", "x"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Invalid task key"));
}

#[test]
fn test_status_uses_logical_date() {
    let sb = Sandbox::new();
    let out = sb.ok(&["status", "--at", "2024-01-11T01:30:00-06:00"]);
    assert!(out.starts_with("Status for 2024-01-10:\n⬜ task: Daily task\n"));
}

#[test]
fn test_config_get_set_path() {
    let sb = Sandbox::new();
    assert_eq!(sb.ok(&["config", "get", "window.start"]), "19:00\n");
    assert_eq!(sb.ok(&["config", "set", "window.start", "20:30"]), "ok\n");
    assert_eq!(sb.ok(&["config", "get", "window.start"]), "20:30\n");
    assert_eq!(
        sb.ok(&["config", "path"]).trim_end(),
        sb.config_path().display().to_string()
    );

    let (_, _, code) = sb.run(&["config", "set", "window.start", "late"]);
    assert_eq!(code, 1);
    assert_eq!(sb.ok(&["config", "get", "window.start"]), "20:30\n");

    let (_, stderr, code) = sb.run(&["config", "get", "no.such.key"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_auth_status_reports_env_token() {
    let sb = Sandbox::new();
    assert_eq!(sb.ok(&["auth", "status"]), "bot token: set (TELEGRAM_BOT_TOKEN)\n");
}

#[test]
fn test_run_without_chat_id_fails() {
    let sb = Sandbox::new();
    let (stdout, stderr, code) = sb.run(&["run"]);
    assert_eq!(code, 1);
    assert!(stdout.is_empty());
    assert!(stderr.contains("telegram.chat_id"));
}
