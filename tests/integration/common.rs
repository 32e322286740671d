//! Shared environment for the integration tests.

use assert_cmd::Command;
use chrono::{Duration, Utc};
use immich_autoupdate::test_utils::{FakeDocker, TestSettings, about_json, release_json};
use mockito::{Matcher, Mock, Server, ServerGuard};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const BIN: &str = "immich-autoupdate";

/// Release notes without any risk keyword.
pub const SAFE_NOTES: &str = "## Highlights\n\n- Faster thumbnails\n- Bug fixes";

/// A temporary deployment: settings file, fake `docker`, run log and lock
/// marker in one directory, plus a mock server for every HTTP endpoint.
pub struct TestEnv {
    pub temp: TempDir,
    pub server: ServerGuard,
    pub docker: FakeDocker,
    pub settings: TestSettings,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_docker(None)
    }

    /// Environment whose `docker` fails on invocations containing `pattern`.
    pub fn with_docker(pattern: Option<&str>) -> Self {
        let temp = TempDir::new().unwrap();
        let server = Server::new();
        let immich_dir = temp.path().join("immich");
        fs::create_dir_all(&immich_dir).unwrap();

        let docker = FakeDocker::install_failing_on(temp.path(), pattern).unwrap();
        let settings = TestSettings::new(&server.url(), docker.path(), &immich_dir);

        Self {
            temp,
            server,
            docker,
            settings,
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.temp.path().join("immich-autoupdate.conf")
    }

    pub fn log_path(&self) -> PathBuf {
        self.temp.path().join("logs").join("immich-autoupdate.log")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.temp.path().join("immich-autoupdate.lock")
    }

    pub fn log(&self) -> String {
        fs::read_to_string(self.log_path()).unwrap_or_default()
    }

    /// Route notifications to the mock server.
    pub fn with_gotify(mut self) -> Self {
        self.settings = self.settings.with_gotify(&self.server.url());
        self
    }

    pub fn set(mut self, key: &str, value: &str) -> Self {
        self.settings = self.settings.set(key, value);
        self
    }

    /// The binary with every file location pointing into the temp dir.
    pub fn command(&self) -> Command {
        self.settings.write_to(&self.config_path()).unwrap();

        let mut cmd = Command::cargo_bin(BIN).unwrap();
        cmd.env("IMMICH_AUTOUPDATE_CONFIG", self.config_path())
            .env("IMMICH_AUTOUPDATE_LOG", self.log_path())
            .env("IMMICH_AUTOUPDATE_LOCK", self.lock_path())
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .current_dir(self.temp.path());
        cmd
    }

    /// Latest release published `age_days` ago.
    pub fn release(&mut self, tag: &str, age_days: i64, notes: &str) -> Mock {
        let published_at = (Utc::now() - Duration::days(age_days))
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string();
        self.server
            .mock("GET", "/release")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(release_json(tag, &published_at, notes))
            .create()
    }

    /// Status endpoint reporting `version`.
    pub fn running(&mut self, version: &str) -> Mock {
        self.server
            .mock("GET", "/api/server/about")
            .match_header("x-api-key", "test-api-key")
            .with_status(200)
            .with_body(about_json(version))
            .create()
    }

    /// Exactly one Gotify message with this title and priority.
    pub fn expect_notification(&mut self, priority: u8, title: &str) -> Mock {
        self.server
            .mock("POST", "/message")
            .match_header("x-gotify-key", "gotify-token")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "title": title,
                "priority": priority,
            })))
            .with_status(200)
            .with_body(r#"{"id":1}"#)
            .expect(1)
            .create()
    }

    /// No Gotify message at all.
    pub fn expect_no_notification(&mut self) -> Mock {
        self.server.mock("POST", "/message").expect(0).create()
    }
}

/// Every run-log line starts with a local `YYYY-MM-DD HH:MM:SS - ` timestamp.
pub fn assert_log_format(log: &str) {
    let line = regex::Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2} - \S").unwrap();
    assert!(!log.is_empty(), "run log is empty");
    for l in log.lines() {
        assert!(line.is_match(l), "unexpected log line: {l:?}");
        assert!(!l.contains('\u{1b}'), "ANSI escape in log line: {l:?}");
    }
}

pub fn write_lock(path: &Path, pid: u32) {
    fs::write(path, format!("{pid}\n")).unwrap();
}
