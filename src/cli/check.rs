//! The `check` command: what would `run` do right now?
//!
//! Fetches the latest release and the running version and prints the
//! decision. Nothing is updated, no notification is sent, and the lock is
//! not taken, so `check` is safe to run next to a scheduled `run`.
//!
//! ```bash
//! immich-autoupdate check
//! immich-autoupdate check --format json | jq .action
//! ```
//!
//! The exit code follows `run`: 1 when the release would be blocked.

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use super::{CliConfig, OutputFormat};
use crate::config::Config;
use crate::core::UpdaterError;
use crate::upgrade::{Decision, Evaluation, evaluate};
use crate::utils::http::build_client;

/// Print the update decision without acting on it.
#[derive(Args, Debug, Default)]
pub struct CheckCommand {
    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Machine-readable `check` result.
#[derive(Debug, Serialize)]
struct CheckReport {
    current: String,
    latest: String,
    tag: String,
    published_on: NaiveDate,
    days_since_release: i64,
    html_url: String,
    action: &'static str,
    decision: String,
}

impl CheckReport {
    fn new(evaluation: &Evaluation, today: NaiveDate) -> Self {
        let release = &evaluation.release;
        Self {
            current: evaluation.current.clone(),
            latest: release.version.clone(),
            tag: release.tag.clone(),
            published_on: release.published_on,
            days_since_release: (today - release.published_on).num_days(),
            html_url: release.html_url.clone(),
            action: action(&evaluation.decision),
            decision: evaluation.decision.to_string(),
        }
    }
}

/// Short, stable name of a decision.
const fn action(decision: &Decision) -> &'static str {
    match decision {
        Decision::UpToDate => "up-to-date",
        Decision::SkipTooRecent { .. } => "skip",
        Decision::BlockedBreakingChange { .. } => "blocked",
        Decision::Update => "update",
    }
}

impl CheckCommand {
    /// Evaluate and print.
    ///
    /// # Errors
    ///
    /// Returns configuration and fetch failures, and
    /// [`UpdaterError::BlockedBreakingChange`] after printing when the
    /// release would be blocked.
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let config = Config::load(&cli.config_path)?;
        let client = build_client(config.http_timeout)?;
        let today = Utc::now().date_naive();

        let evaluation = evaluate(&config, &client, today).await?;
        let report = CheckReport::new(&evaluation, today);

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            OutputFormat::Text => print_text(&report, &evaluation.decision),
        }

        if let Decision::BlockedBreakingChange { keyword } = evaluation.decision {
            return Err(UpdaterError::BlockedBreakingChange {
                version: evaluation.release.version,
                keyword,
                html_url: evaluation.release.html_url,
            }
            .into());
        }
        Ok(())
    }
}

fn print_text(report: &CheckReport, decision: &Decision) {
    println!("Running version: {}", report.current.bold());
    println!(
        "Latest release:  {} (published {}, {} day(s) ago)",
        report.latest.bold(),
        report.published_on,
        report.days_since_release
    );
    println!("Release notes:   {}", report.html_url);

    let verdict = match decision {
        Decision::UpToDate => format!("✓ {decision}").green(),
        Decision::SkipTooRecent { .. } => format!("⏳ {decision}").yellow(),
        Decision::BlockedBreakingChange { .. } => format!("✗ {decision}").red(),
        Decision::Update => format!("→ {decision}").cyan(),
    };
    println!("Decision:        {verdict}");
}
