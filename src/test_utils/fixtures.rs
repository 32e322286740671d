//! Test fixtures: a fake container CLI, settings files, release documents.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::config::parser::parse_entries;

/// A `docker` stand-in.
///
/// Every invocation appends its arguments as one line to a log next to the
/// script and prints `ok: <args>`. Invocations whose arguments contain the
/// failure pattern print to stderr and exit 1 instead.
#[derive(Clone, Debug)]
pub struct FakeDocker {
    path: PathBuf,
    log: PathBuf,
}

impl FakeDocker {
    /// Install a fake CLI in `dir` that always succeeds.
    pub fn install(dir: &Path) -> Result<Self> {
        Self::install_failing_on(dir, None)
    }

    /// Install a fake CLI in `dir` that fails when its arguments contain
    /// `pattern` (e.g. `"compose pull"`).
    pub fn install_failing_on(dir: &Path, pattern: Option<&str>) -> Result<Self> {
        let path = dir.join("docker");
        let log = dir.join("docker-invocations.log");
        let failure_case = pattern.map_or_else(String::new, |pattern| {
            format!("  *'{pattern}'*)\n    echo \"simulated failure: $*\" >&2\n    exit 1\n    ;;\n")
        });

        let script = format!(
            "#!/bin/sh\n\
             echo \"$*\" >> '{log}'\n\
             case \"$*\" in\n\
             {failure_case}\
             esac\n\
             echo \"ok: $*\"\n",
            log = log.display()
        );
        fs::write(&path, script)
            .with_context(|| format!("Failed to write fake docker: {}", path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        }

        Ok(Self { path, log })
    }

    /// Script path, usable as `DOCKER_BIN`.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Argument lines of every invocation so far, oldest first.
    pub fn invocations(&self) -> Vec<String> {
        fs::read_to_string(&self.log)
            .map(|content| content.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

/// Builder for a settings file.
///
/// Starts from a complete `NOTIFY_METHOD=none` configuration with one quick
/// retry and a five-second readiness budget polled every second.
#[derive(Clone, Debug)]
pub struct TestSettings {
    entries: Vec<(String, String)>,
}

impl TestSettings {
    /// Settings for a server at `host` using `docker` in `immich_dir`.
    /// The release API is expected at `{host}/release`.
    pub fn new(host: &str, docker: &Path, immich_dir: &Path) -> Self {
        let host = host.trim_end_matches('/');
        let entries = [
            ("IMMICH_API_KEY", "test-api-key".to_string()),
            ("DOCKER_BIN", docker.display().to_string()),
            ("IMMICH_DIR", immich_dir.display().to_string()),
            ("IMMICH_HOST", host.to_string()),
            ("NOTIFY_METHOD", "none".to_string()),
            ("RELEASE_URL", format!("{host}/release")),
            ("RETRY_ATTEMPTS", "2".to_string()),
            ("RETRY_DELAY_SECS", "0".to_string()),
            ("HTTP_TIMEOUT_SECS", "5".to_string()),
            ("READY_TIMEOUT_SECS", "5".to_string()),
            ("READY_INTERVAL_SECS", "1".to_string()),
            ("COMPOSE_TIMEOUT_SECS", "30".to_string()),
        ];

        Self {
            entries: entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        }
    }

    /// Set or replace a key.
    #[must_use]
    pub fn set(mut self, key: &str, value: impl Into<String>) -> Self {
        self.entries.retain(|(k, _)| k != key);
        self.entries.push((key.to_string(), value.into()));
        self
    }

    /// Remove a key.
    #[must_use]
    pub fn unset(mut self, key: &str) -> Self {
        self.entries.retain(|(k, _)| k != key);
        self
    }

    /// Send notifications to a Gotify server at `url`.
    #[must_use]
    pub fn with_gotify(self, url: &str) -> Self {
        self.set("NOTIFY_METHOD", "gotify")
            .set("GOTIFY_URL", url)
            .set("GOTIFY_TOKEN", "gotify-token")
    }

    /// File content, one `KEY="value"` line per entry.
    pub fn render(&self) -> String {
        let mut content = String::from("# immich-autoupdate test settings\n");
        for (key, value) in &self.entries {
            content.push_str(&format!("{key}=\"{value}\"\n"));
        }
        content
    }

    /// Write the settings file.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.render())
            .with_context(|| format!("Failed to write settings: {}", path.display()))
    }

    /// Parse into a [`Config`].
    pub fn config(&self) -> Result<Config> {
        let entries = parse_entries(&self.render())?;
        Ok(Config::from_entries(&entries)?)
    }
}

/// A release API document.
pub fn release_json(tag: &str, published_at: &str, body: &str) -> String {
    serde_json::json!({
        "tag_name": tag,
        "name": tag,
        "body": body,
        "draft": false,
        "prerelease": false,
        "published_at": published_at,
        "html_url": format!("https://github.com/immich-app/immich/releases/tag/{tag}"),
    })
    .to_string()
}

/// A status endpoint document.
pub fn about_json(version: &str) -> String {
    serde_json::json!({
        "version": version,
        "versionUrl": format!("https://github.com/immich-app/immich/releases/tag/{version}"),
        "licensed": false,
    })
    .to_string()
}
