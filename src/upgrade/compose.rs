//! Builder for the container orchestration commands of an update.
//!
//! Every command runs through the container CLI configured as `DOCKER_BIN`
//! with the deployment directory as working directory, so the compose
//! project there is the one acted upon.
//!
//! # Examples
//!
//! ```rust,ignore
//! use immich_autoupdate::upgrade::compose::ComposeCommand;
//!
//! # async fn example() -> anyhow::Result<()> {
//! ComposeCommand::pull("docker")
//!     .current_dir("/opt/immich")
//!     .with_context("Pulling images")
//!     .execute()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::time::timeout;

use crate::constants::DEFAULT_COMPOSE_TIMEOUT;
use crate::core::UpdaterError;

/// Fluent builder for a single container CLI invocation.
///
/// Output is written to the log line by line while the command runs, and
/// also returned once it exits. The child is killed if the future is
/// dropped, which happens on timeout and when a termination signal
/// interrupts the run.
pub struct ComposeCommand {
    /// Container CLI executable
    program: PathBuf,
    /// Arguments (e.g. `["compose", "pull"]`)
    args: Vec<String>,
    /// Working directory, normally the deployment directory
    current_dir: Option<PathBuf>,
    /// Maximum run time (None = no timeout)
    timeout_duration: Option<Duration>,
    /// Label used in log lines
    context: Option<String>,
}

/// Captured output of a finished command.
#[derive(Debug, Clone, Default)]
pub struct ComposeOutput {
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

impl ComposeCommand {
    /// Create a command for `program` with no arguments and the default timeout.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            timeout_duration: Some(DEFAULT_COMPOSE_TIMEOUT),
            context: None,
        }
    }

    /// Set the working directory.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set a custom timeout (None for no timeout).
    pub const fn with_timeout(mut self, duration: Option<Duration>) -> Self {
        self.timeout_duration = duration;
        self
    }

    /// Label the command in log lines and error messages.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    fn step(&self) -> String {
        self.context.clone().unwrap_or_else(|| self.command_line())
    }

    fn failure(&self, reason: impl Into<String>) -> UpdaterError {
        UpdaterError::UpdateCommandFailed {
            step: self.step(),
            reason: reason.into(),
        }
    }

    /// Run the command to completion.
    ///
    /// # Errors
    ///
    /// Returns [`UpdaterError::UpdateCommandFailed`] if the working directory
    /// is missing, the program cannot be started, the timeout elapses, or
    /// the command exits non-zero.
    pub async fn execute(self) -> Result<ComposeOutput> {
        let start = std::time::Instant::now();
        let command_line = self.command_line();

        if let Some(dir) = &self.current_dir
            && !dir.is_dir()
        {
            return Err(self.failure(format!("directory {} does not exist", dir.display())).into());
        }

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }

        match &self.context {
            Some(ctx) => tracing::info!(target: "compose", "({ctx}) Running: {command_line}"),
            None => tracing::info!(target: "compose", "Running: {command_line}"),
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| self.failure(format!("failed to start {command_line}: {e}")))?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Compose reports progress on stderr, so both streams go to the log
        let run = async {
            tokio::join!(stream_lines(stdout), stream_lines(stderr), child.wait())
        };

        let (stdout, stderr, status) = match self.timeout_duration {
            Some(duration) => match timeout(duration, run).await {
                Ok(finished) => finished,
                Err(_) => {
                    tracing::warn!(
                        target: "compose",
                        "Command timed out after {} seconds: {command_line}",
                        duration.as_secs()
                    );
                    return Err(self
                        .failure(format!("timed out after {}s", duration.as_secs()))
                        .into());
                }
            },
            None => run.await,
        };

        let status =
            status.map_err(|e| self.failure(format!("failed to wait for {command_line}: {e}")))?;

        if !status.success() {
            let code = status
                .code()
                .map_or_else(|| "signal".to_string(), |code| code.to_string());
            let detail = stderr.lines().rev().find(|line| !line.trim().is_empty());
            let reason = match detail {
                Some(detail) => format!("exit code {code}: {}", detail.trim()),
                None => format!("exit code {code}"),
            };
            return Err(self.failure(reason).into());
        }

        let elapsed = start.elapsed();
        tracing::debug!(
            target: "compose::perf",
            "{} took {:.2}s",
            self.step(),
            elapsed.as_secs_f64()
        );

        Ok(ComposeOutput {
            stdout,
            stderr,
        })
    }

    /// Execute and discard the output.
    pub async fn execute_success(self) -> Result<()> {
        self.execute().await?;
        Ok(())
    }
}

/// Forward every line of `reader` to the log and return everything read.
async fn stream_lines<R>(reader: Option<R>) -> String
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return String::new();
    };

    let mut collected = String::new();
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let trimmed = line.trim_end();
                if !trimmed.is_empty() {
                    tracing::info!(target: "compose", "{trimmed}");
                }
                collected.push_str(&line);
                collected.push('\n');
            }
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(target: "compose", "Stopped reading command output: {e}");
                break;
            }
        }
    }
    collected
}

// Convenience builders for the update steps

impl ComposeCommand {
    /// `compose pull`: download the images referenced by the project.
    pub fn pull(program: impl Into<PathBuf>) -> Self {
        Self::new(program).args(["compose", "pull"]).with_context("compose pull")
    }

    /// `compose up -d`: recreate containers whose image changed.
    pub fn up(program: impl Into<PathBuf>) -> Self {
        Self::new(program).args(["compose", "up", "-d"]).with_context("compose up")
    }

    /// `image prune -a -f --filter until=<hours>h`: remove unused images.
    pub fn prune_images(program: impl Into<PathBuf>, older_than_hours: u64) -> Self {
        Self::new(program)
            .args(["image", "prune", "-a", "-f", "--filter"])
            .arg(format!("until={older_than_hours}h"))
            .with_context("image prune")
    }
}
