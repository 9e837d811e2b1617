//! Runtime configuration.
//!
//! Everything comes from `PHARMAGARDE_*` environment variables (a `.env`
//! file is loaded by the binary beforehand) with defaults suitable for a
//! scheduled run from the project root. Command-line flags are applied on
//! top by `main`.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::extractor::Strategy;

pub const ENV_SOURCE_URL: &str = "PHARMAGARDE_SOURCE_URL";
pub const ENV_OUTPUT_DIR: &str = "PHARMAGARDE_OUTPUT_DIR";
pub const ENV_LOG_DIR: &str = "PHARMAGARDE_LOG_DIR";
pub const ENV_LOG_LEVEL: &str = "PHARMAGARDE_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "PHARMAGARDE_LOG_FORMAT";
pub const ENV_TIMEOUT_SECS: &str = "PHARMAGARDE_TIMEOUT_SECS";
pub const ENV_STRATEGY: &str = "PHARMAGARDE_STRATEGY";

const DEFAULT_SOURCE_URL: &str = "https://www.pharmaciens.tg/on-call";
const DEFAULT_OUTPUT_DIR: &str = "public/data";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("expected text or json, got {other:?}")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Json => "json",
        })
    }
}

/// What the logging layer needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub dir: PathBuf,
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    source_url: String,
    output_dir: PathBuf,
    timeout: Duration,
    strategy: Strategy,
    log: LogConfig,
}

impl Config {
    /// Load from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let source_url = var_or(ENV_SOURCE_URL, DEFAULT_SOURCE_URL);
        validate_url(ENV_SOURCE_URL, &source_url)?;

        let timeout_secs = match env::var(ENV_TIMEOUT_SECS) {
            Ok(raw) if !raw.trim().is_empty() => parse_timeout(&raw)?,
            _ => DEFAULT_TIMEOUT_SECS,
        };

        let strategy = var_or(ENV_STRATEGY, "auto")
            .parse::<Strategy>()
            .map_err(|e| ConfigError::InvalidValue {
                field: ENV_STRATEGY,
                reason: e.to_string(),
            })?;

        let level = var_or(ENV_LOG_LEVEL, DEFAULT_LOG_LEVEL).to_lowercase();
        if level.parse::<tracing::Level>().is_err() {
            return Err(ConfigError::InvalidValue {
                field: ENV_LOG_LEVEL,
                reason: format!("unknown level {level:?}"),
            });
        }

        let format = var_or(ENV_LOG_FORMAT, "text")
            .parse::<LogFormat>()
            .map_err(|reason| ConfigError::InvalidValue {
                field: ENV_LOG_FORMAT,
                reason,
            })?;

        Ok(Self {
            source_url,
            output_dir: PathBuf::from(var_or(ENV_OUTPUT_DIR, DEFAULT_OUTPUT_DIR)),
            timeout: Duration::from_secs(timeout_secs),
            strategy,
            log: LogConfig {
                dir: PathBuf::from(var_or(ENV_LOG_DIR, DEFAULT_LOG_DIR)),
                level,
                format,
            },
        })
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }
    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }
    pub fn log(&self) -> &LogConfig {
        &self.log
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into();
        validate_url("--url", &url)?;
        self.source_url = url;
        Ok(self)
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            strategy: Strategy::default(),
            log: LogConfig {
                dir: PathBuf::from(DEFAULT_LOG_DIR),
                level: DEFAULT_LOG_LEVEL.to_string(),
                format: LogFormat::default(),
            },
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn validate_url(field: &'static str, raw: &str) -> Result<(), ConfigError> {
    let url = url::Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
        field,
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidValue {
            field,
            reason: format!("unsupported scheme {:?}", url.scheme()),
        });
    }
    Ok(())
}

fn parse_timeout(raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            field: ENV_TIMEOUT_SECS,
            reason: "must be greater than zero".to_string(),
        }),
        Ok(secs) => Ok(secs),
        Err(e) => Err(ConfigError::InvalidValue {
            field: ENV_TIMEOUT_SECS,
            reason: e.to_string(),
        }),
    }
}

/// Errors that can occur while building a configuration.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}
