//! The `run` command: one scheduled update run.
//!
//! ```bash
//! immich-autoupdate run
//! immich-autoupdate          # same thing
//! immich-autoupdate --no-lock --log-file ./update.log run
//! ```

use anyhow::Result;
use clap::Args;
use tracing::{error, warn};

use super::CliConfig;
use crate::config::Config;
use crate::core::UpdaterError;
use crate::lock::PidLock;
use crate::notify::Notifier;
use crate::upgrade::pipeline::{self, notify_failure};
use crate::utils::http::build_client;
use crate::utils::signal::shutdown_signal;

/// Check for a new release and install it if policy allows.
#[derive(Args, Debug, Default)]
pub struct RunCommand {}

impl RunCommand {
    /// Load the settings, take the lock, and run the pipeline until it ends
    /// or a termination signal arrives.
    ///
    /// The lock marker is held for the whole run and removed on every exit
    /// path, including interruption: the pipeline future is dropped (killing
    /// any running container command) before the guard goes out of scope.
    ///
    /// # Errors
    ///
    /// Returns the hard failure that ended the run. Every failure is logged;
    /// those after the lock is taken have also been notified.
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let config = Config::load(&cli.config_path).inspect_err(|e| error!("{e:#}"))?;
        let client = build_client(config.http_timeout).inspect_err(|e| error!("{e:#}"))?;
        let notifier = Notifier::from_settings(&config.notify, client.clone())
            .inspect_err(|e| error!("{e:#}"))?;

        // A live marker belongs to another run, which will report for itself
        let _lock = match &cli.lock_file {
            Some(path) => Some(PidLock::acquire(path).inspect_err(|e| error!("{e:#}"))?),
            None => None,
        };

        let interrupted = async {
            match shutdown_signal().await {
                Ok(signal) => signal,
                Err(e) => {
                    warn!("Signal handling unavailable: {e:#}");
                    std::future::pending().await
                }
            }
        };

        tokio::select! {
            result = pipeline::run(&config, &client, &notifier) => result.map(|_| ()),
            signal = interrupted => {
                let error = anyhow::Error::from(UpdaterError::Interrupted {
                    signal: signal.to_string(),
                });
                notify_failure(&notifier, &error).await;
                Err(error)
            }
        }
    }
}
