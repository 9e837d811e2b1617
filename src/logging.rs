//! Log setup for one scraper invocation: human or JSON lines on stdout,
//! and the same events appended to a daily file under the log directory.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogConfig, LogFormat};

/// Daily files are named `scraper.YYYY-MM-DD`.
pub const LOG_FILE_PREFIX: &str = "scraper";

/// Dependencies that are chatty at debug level.
const QUIET_TARGETS: &[&str] = &[
    "hyper=warn",
    "hyper_util=warn",
    "reqwest=info",
    "html5ever=warn",
    "selectors=warn",
];

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("cannot create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot install log subscriber: {0}")]
    Init(String),
}

/// Installs the global subscriber.
///
/// The returned guard flushes the file writer when dropped and must live
/// until the end of the run. `RUST_LOG`, when set, replaces the configured
/// level entirely.
pub fn init(config: &LogConfig) -> Result<WorkerGuard, LoggingError> {
    std::fs::create_dir_all(&config.dir).map_err(|source| LoggingError::CreateDir {
        path: config.dir.clone(),
        source,
    })?;

    let file_appender = rolling::daily(&config.dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = non_blocking(file_appender);

    let registry = Registry::default().with(build_filter(&config.level));

    match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(io::stdout))
            .with(
                fmt::layer()
                    .json()
                    .with_writer(file_writer)
                    .with_ansi(false),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(io::stdout).with_target(false))
            .with(
                fmt::layer()
                    .with_writer(file_writer)
                    .with_target(false)
                    .with_ansi(false),
            )
            .try_init(),
    }
    .map_err(|e| LoggingError::Init(e.to_string()))?;

    Ok(guard)
}

pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| quiet_filter(level))
}

fn quiet_filter(level: &str) -> EnvFilter {
    let mut filter = EnvFilter::new(level);
    if level.eq_ignore_ascii_case("trace") {
        return filter;
    }
    for target in QUIET_TARGETS {
        if let Ok(directive) = target.parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}
