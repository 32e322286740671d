//! immich-autoupdate entry point
//!
//! Parses the command line, runs the selected command (`run` by default) and
//! turns a failure into a coloured message and exit code 1.

use anyhow::Result;
use clap::Parser;
use immich_autoupdate::cli;
use immich_autoupdate::core::error::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            user_friendly_error(e).display();
            std::process::exit(1);
        }
    }
}
