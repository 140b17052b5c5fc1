//! Tracing subscriber setup shared by the workspace binaries.
//!
//! Console output always goes to stdout. When a log directory is configured a
//! second layer appends the same lines to `<dir>/<YYYYMMDD>_<file_suffix>`.

use std::env::var;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use thiserror::Error;
use tracing::{Event, Subscriber, level_filters::LevelFilter, warn};
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{Layer, filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("failed to create log directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: std::io::Error },
    #[error("failed to open log file {}: {source}", path.display())]
    OpenFile { path: PathBuf, source: std::io::Error },
    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized,
}

/// Where log lines should land besides stdout.
#[derive(Debug, Clone)]
pub struct LogOptions {
    pub level: LevelFilter,
    pub log_dir: Option<PathBuf>,
    pub file_suffix: String,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self { level: LevelFilter::INFO, log_dir: None, file_suffix: "service.log".into() }
    }
}

/// `2024-05-01 13:37:00` in local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTimestamp;

impl FormatTime for LocalTimestamp {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S"))
    }
}

/// Install the subscriber described by `options`.
///
/// Returns the path of the log file when file output is enabled.
pub fn init_with(options: LogOptions) -> Result<Option<PathBuf>, LoggerError> {
    let env_filter =
        EnvFilter::builder().with_default_directive(options.level.into()).from_env_lossy();

    let log_format = var("RUST_LOG_FORMAT").unwrap_or_default();

    let console_layer = match log_format.as_str() {
        "json" => tracing_subscriber::fmt::layer().json().with_filter(env_filter).boxed(),
        _ => tracing_subscriber::fmt::layer()
            .event_format(HumanFormat)
            .with_filter(env_filter)
            .boxed(),
    };

    let (file_layer, file_path) = match &options.log_dir {
        Some(dir) => {
            let path = daily_log_path(dir, &options.file_suffix, Local::now().date_naive());
            let file = open_log_file(&path)?;
            let file_filter =
                EnvFilter::builder().with_default_directive(options.level.into()).from_env_lossy();
            let layer = tracing_subscriber::fmt::layer()
                .event_format(HumanFormat)
                .with_ansi(false)
                .with_writer(Arc::new(file))
                .with_filter(file_filter)
                .boxed();
            (Some(layer), Some(path))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|_| LoggerError::AlreadyInitialized)?;

    if !log_format.is_empty() && log_format != "json" {
        warn!("Unknown RUST_LOG_FORMAT '{log_format}', falling back to default");
    }

    Ok(file_path)
}

/// `<timestamp> - <LEVEL> - <message>`, one event per line
#[derive(Debug, Clone, Copy, Default)]
pub struct HumanFormat;

impl<S, N> FormatEvent<S, N> for HumanFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        LocalTimestamp.format_time(&mut writer)?;
        write!(writer, " - {} - ", event.metadata().level())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// `<dir>/<YYYYMMDD>_<suffix>`
pub fn daily_log_path(dir: &Path, suffix: &str, date: chrono::NaiveDate) -> PathBuf {
    dir.join(format!("{}_{}", date.format("%Y%m%d"), suffix))
}

fn open_log_file(path: &Path) -> Result<File, LoggerError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|source| LoggerError::CreateDir { path: parent.to_path_buf(), source })?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LoggerError::OpenFile { path: path.to_path_buf(), source })
}
