//! The `validate` command: check the settings file.
//!
//! Loads the settings exactly as `run` does, builds the notifier, and looks
//! for the container CLI and the deployment directory. No network request is made.
//!
//! ```bash
//! immich-autoupdate validate
//! immich-autoupdate validate --config ./immich-autoupdate.conf --strict
//! immich-autoupdate validate --format json
//! ```
//!
//! Secrets are masked in the printed summary.

use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use super::{CliConfig, OutputFormat};
use crate::config::{Config, NotifySettings};
use crate::notify::Notifier;
use crate::upgrade::updater::resolve_docker_bin;
use crate::utils::http::build_client;

/// Validate the settings file.
#[derive(Args, Debug, Default)]
pub struct ValidateCommand {
    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Treat warnings (missing container CLI or deployment directory) as errors
    #[arg(long)]
    pub strict: bool,
}

/// Settings as printed by `validate`, secrets masked.
#[derive(Debug, Serialize)]
struct ConfigSummary {
    immich_host: String,
    status_url: String,
    api_key: String,
    immich_dir: String,
    docker_bin: String,
    notify_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    notify_target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gotify_token: Option<String>,
    release_url: String,
    min_release_age_days: i64,
    retry_attempts: usize,
    retry_delay_secs: u64,
    http_timeout_secs: u64,
    ready_timeout_secs: u64,
    ready_interval_secs: u64,
    compose_timeout_secs: u64,
    prune_images: bool,
    prune_age_hours: u64,
}

impl ConfigSummary {
    fn new(config: &Config) -> Self {
        let (notify_target, gotify_token) = match &config.notify {
            NotifySettings::None => (None, None),
            NotifySettings::Email { to, from } => (Some(format!("{to} (from {from})")), None),
            NotifySettings::Gotify { url, token } => (Some(url.clone()), Some(mask_secret(token))),
        };

        Self {
            immich_host: config.immich_host.clone(),
            status_url: config.status_url(),
            api_key: mask_secret(&config.api_key),
            immich_dir: config.immich_dir.display().to_string(),
            docker_bin: config.docker_bin.display().to_string(),
            notify_method: config.notify.transport().to_string(),
            notify_target,
            gotify_token,
            release_url: config.release_url.clone(),
            min_release_age_days: config.min_release_age_days,
            retry_attempts: config.retry.max_attempts,
            retry_delay_secs: config.retry.delay.as_secs(),
            http_timeout_secs: config.http_timeout.as_secs(),
            ready_timeout_secs: config.ready_timeout.as_secs(),
            ready_interval_secs: config.ready_interval.as_secs(),
            compose_timeout_secs: config.compose_timeout.as_secs(),
            prune_images: config.prune_images,
            prune_age_hours: config.prune_age_hours,
        }
    }
}

#[derive(Debug, Serialize)]
struct ValidationReport {
    valid: bool,
    config_path: String,
    settings: ConfigSummary,
    warnings: Vec<String>,
}

/// Keep the first four characters of long secrets, hide short ones entirely.
fn mask_secret(secret: &str) -> String {
    if secret.chars().count() <= 8 {
        return "****".to_string();
    }
    let visible: String = secret.chars().take(4).collect();
    format!("{visible}****")
}

/// Problems that do not make the settings unusable but will fail a run.
fn environment_warnings(config: &Config) -> Vec<String> {
    let mut warnings = Vec::new();

    if let Err(e) = resolve_docker_bin(&config.docker_bin) {
        warnings.push(format!("DOCKER_BIN: {e}"));
    }
    if !config.immich_dir.is_dir() {
        warnings.push(format!(
            "IMMICH_DIR: {} is not a directory",
            config.immich_dir.display()
        ));
    }

    warnings
}

impl ValidateCommand {
    /// Validate and print the result.
    ///
    /// # Errors
    ///
    /// Returns the loader error for a missing or invalid file, and with
    /// `--strict` an error when any warning was found.
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let config = Config::load(&cli.config_path)?;
        Notifier::from_settings(&config.notify, build_client(config.http_timeout)?)?;

        let warnings = environment_warnings(&config);
        let report = ValidationReport {
            valid: warnings.is_empty() || !self.strict,
            config_path: cli.config_path.display().to_string(),
            settings: ConfigSummary::new(&config),
            warnings,
        };

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            OutputFormat::Text => print_text(&report),
        }

        if !report.valid {
            bail!(
                "Validation failed: {} warning(s) in strict mode",
                report.warnings.len()
            );
        }
        Ok(())
    }
}

fn print_text(report: &ValidationReport) {
    let s = &report.settings;

    println!("{} Valid settings file: {}", "✓".green(), report.config_path);
    println!("  Immich host:     {} ({})", s.immich_host, s.status_url);
    println!("  API key:         {}", s.api_key);
    println!("  Deployment:      {}", s.immich_dir);
    println!("  Container CLI:   {}", s.docker_bin);
    match &s.notify_target {
        Some(target) => println!("  Notifications:   {} → {target}", s.notify_method),
        None => println!("  Notifications:   {}", s.notify_method),
    }
    if let Some(token) = &s.gotify_token {
        println!("  Gotify token:    {token}");
    }
    println!("  Release API:     {}", s.release_url);
    println!("  Minimum age:     {} day(s)", s.min_release_age_days);
    println!(
        "  Retries:         {} attempt(s), {}s apart, {}s per request",
        s.retry_attempts, s.retry_delay_secs, s.http_timeout_secs
    );
    println!(
        "  Readiness wait:  {}s, polled every {}s",
        s.ready_timeout_secs, s.ready_interval_secs
    );
    println!("  Compose timeout: {}s", s.compose_timeout_secs);
    if s.prune_images {
        println!("  Image prune:     unused for {}h", s.prune_age_hours);
    } else {
        println!("  Image prune:     disabled");
    }

    for warning in &report.warnings {
        println!("{} Warning: {warning}", "⚠".yellow());
    }
}
