//! Command-line interface for immich-autoupdate.
//!
//! # Commands
//!
//! - `run` (default): one full update run, meant for cron or a systemd timer
//! - `check`: fetch both versions and print the decision without acting on it
//! - `validate`: load and check the settings file without touching the network
//! - `notify-test`: send a test notification through the configured transport
//!
//! # Global Options
//!
//! - `--config <PATH>`: settings file (`IMMICH_AUTOUPDATE_CONFIG`)
//! - `--log-file <PATH>`: run log appended by `run` (`IMMICH_AUTOUPDATE_LOG`)
//! - `--lock-file <PATH>`: PID marker guarding `run` (`IMMICH_AUTOUPDATE_LOCK`)
//! - `--no-lock`: run without the PID marker
//! - `--verbose` / `--quiet`: stderr log level
//!
//! # Examples
//!
//! ```bash
//! # Nightly cron entry
//! 0 3 * * * /usr/local/bin/immich-autoupdate
//!
//! # What would tonight's run do?
//! immich-autoupdate check
//!
//! # After editing the settings file
//! immich-autoupdate validate
//! immich-autoupdate notify-test
//! ```
//!
//! # Exit Codes
//!
//! `0` when the run ends up to date, skipped, or updated (even if the server
//! was slow to come back); `1` for every hard failure, a blocked release, and
//! an interruption.

mod check;
mod notify;
mod run;
mod validate;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::constants::{DEFAULT_CONFIG_PATH, DEFAULT_LOCK_PATH, DEFAULT_LOG_PATH};
use crate::logging;

/// Settings derived from the global flags, shared by every subcommand.
///
/// Kept separate from [`Cli`] so tests can build one directly.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Settings file
    pub config_path: PathBuf,
    /// Run log appended by `run`
    pub log_file: PathBuf,
    /// PID marker, `None` with `--no-lock`
    pub lock_file: Option<PathBuf>,
    /// Filter directive for stderr output
    pub log_level: &'static str,
}

/// Scheduled updater for a docker-compose Immich deployment.
#[derive(Parser)]
#[command(
    name = "immich-autoupdate",
    about = "Keep a self-hosted Immich deployment on the latest release",
    version,
    long_about = "Checks the latest Immich release, waits until it has aged for a few days, \
                  refuses releases whose notes mention breaking changes, then pulls the new \
                  images, restarts the stack and reports the result by e-mail or Gotify."
)]
pub struct Cli {
    /// Subcommand; `run` when omitted
    #[command(subcommand)]
    command: Option<Commands>,

    /// Settings file with KEY=value lines
    #[arg(
        short,
        long,
        global = true,
        env = "IMMICH_AUTOUPDATE_CONFIG",
        default_value = DEFAULT_CONFIG_PATH
    )]
    config: PathBuf,

    /// Run log appended by `run`
    #[arg(
        long,
        global = true,
        env = "IMMICH_AUTOUPDATE_LOG",
        default_value = DEFAULT_LOG_PATH
    )]
    log_file: PathBuf,

    /// PID marker preventing overlapping runs
    #[arg(
        long,
        global = true,
        env = "IMMICH_AUTOUPDATE_LOCK",
        default_value = DEFAULT_LOCK_PATH
    )]
    lock_file: PathBuf,

    /// Do not take the PID marker
    #[arg(long, global = true)]
    no_lock: bool,

    /// Debug output on stderr
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Errors only on stderr
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check for a new release and install it if policy allows
    Run(run::RunCommand),

    /// Print what `run` would decide, without updating or notifying
    Check(check::CheckCommand),

    /// Validate the settings file
    Validate(validate::ValidateCommand),

    /// Send a test notification
    NotifyTest(notify::NotifyTestCommand),
}

impl Cli {
    /// Execute the parsed command line.
    ///
    /// # Errors
    ///
    /// Returns the error that should end the process with exit code 1.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Derive the [`CliConfig`] from the global flags.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        };

        CliConfig {
            config_path: self.config.clone(),
            log_file: self.log_file.clone(),
            lock_file: (!self.no_lock).then(|| self.lock_file.clone()),
            log_level,
        }
    }

    /// Execute with an explicit [`CliConfig`].
    ///
    /// Logging is initialised here. Only `run` writes the run log; the other
    /// commands are interactive and log to stderr alone.
    ///
    /// # Errors
    ///
    /// Returns the error that should end the process with exit code 1.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        let command = self
            .command
            .unwrap_or_else(|| Commands::Run(run::RunCommand::default()));

        let run_log = matches!(command, Commands::Run(_)).then_some(config.log_file.as_path());
        logging::init_logging(config.log_level, run_log)?;

        match command {
            Commands::Run(cmd) => cmd.execute(&config).await,
            Commands::Check(cmd) => cmd.execute(&config).await,
            Commands::Validate(cmd) => cmd.execute(&config).await,
            Commands::NotifyTest(cmd) => cmd.execute(&config).await,
        }
    }
}

/// Output format of `check` and `validate`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with colours
    #[default]
    Text,
    /// One JSON object on stdout
    Json,
}
