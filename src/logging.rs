//! Log output setup.
//!
//! Two layers are installed on one `tracing` registry:
//!
//! - a terminal layer on stderr, filtered by `RUST_LOG` or else by the
//!   `--verbose`/`--quiet` level;
//! - the run log, appended to a flat file at INFO and above, one event per
//!   line in the form `YYYY-MM-DD HH:MM:SS - message` (local time).
//!
//! Warnings and errors carry a `WARNING: ` / `ERROR: ` marker after the dash
//! and structured fields follow the message as ` key=value`:
//!
//! ```text
//! 2024-10-08 03:00:01 - Latest release: v1.117.0 (published 2024-10-01)
//! 2024-10-08 03:07:12 - WARNING: Immich did not become ready waited_secs=300
//! ```
//!
//! The file is never rotated or truncated.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fmt::{self, Write as _};
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing::field::{Field, Visit};
use tracing::level_filters::LevelFilter;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Dependencies that are too chatty at debug level.
const QUIET_DEPENDENCIES: &str = "hyper=warn,hyper_util=warn,h2=warn,reqwest=warn,rustls=warn";

/// Event formatter of the run log.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunLogFormat;

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={value}", field.name());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={value:?}", field.name());
        }
    }
}

/// Render one run-log line, without the trailing newline.
#[must_use]
pub fn format_line(time: &DateTime<Local>, level: Level, message: &str, fields: &str) -> String {
    let marker = match level {
        Level::ERROR => "ERROR: ",
        Level::WARN => "WARNING: ",
        _ => "",
    };
    format!("{} - {marker}{message}{fields}", time.format("%Y-%m-%d %H:%M:%S"))
}

impl<S, N> FormatEvent<S, N> for RunLogFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);

        let line = format_line(
            &Local::now(),
            *event.metadata().level(),
            &visitor.message,
            &visitor.fields,
        );
        writeln!(writer, "{line}")
    }
}

/// Open `path` for appending, creating it and its directory when missing.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be created or opened.
pub fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))
}

/// The run-log layer writing to `file`.
pub fn run_log_layer<S>(file: File) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer()
        .event_format(RunLogFormat)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_filter(LevelFilter::INFO)
}

/// Terminal filter: `RUST_LOG` if set, otherwise `level` with noisy
/// dependencies capped at WARN.
#[must_use]
pub fn stderr_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},{QUIET_DEPENDENCIES}")))
}

/// Install the global subscriber.
///
/// A log file that cannot be opened is reported as a warning on stderr and
/// the run continues with terminal output only.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(stderr_level: &str, log_file: Option<&Path>) -> Result<()> {
    let (file, open_error) = match log_file.map(open_log_file) {
        Some(Ok(file)) => (Some(file), None),
        Some(Err(e)) => (None, Some(e)),
        None => (None, None),
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(stderr_filter(stderr_level));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file.map(run_log_layer))
        .try_init()
        .context("Failed to initialize logging")?;

    if let Some(e) = open_error {
        tracing::warn!("{e:#}; continuing without a log file");
    }

    Ok(())
}
