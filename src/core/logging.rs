//! Structured logging setup.
//!
//! Scheduler ticks, lock transitions, and store failures are all reported
//! through `tracing`; this module wires the subscriber from env vars so the
//! library itself never prints.

use std::fs::OpenOptions;
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

const LOG_LEVEL_ENV: &str = "TEAMCOST_LOG";
const LOG_FORMAT_ENV: &str = "TEAMCOST_LOG_FORMAT";
const LOG_FILE_ENV: &str = "TEAMCOST_LOG_FILE";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable logs.
    #[default]
    Human,
    /// JSON logs (one event per line).
    Json,
}

impl LogFormat {
    /// Parse from string (case-insensitive).
    #[must_use]
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "human" => Some(Self::Human),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Log level from CLI argument or env.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    /// Parse from CLI argument.
    #[must_use]
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "verbose" | "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Convert to tracing filter string.
    #[must_use]
    pub const fn as_filter(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Parse log level from the `TEAMCOST_LOG` env var.
#[must_use]
pub fn level_from_env() -> Option<LogLevel> {
    non_empty_env(LOG_LEVEL_ENV).and_then(|v| LogLevel::from_arg(&v))
}

/// Parse log format from the `TEAMCOST_LOG_FORMAT` env var.
#[must_use]
pub fn format_from_env() -> Option<LogFormat> {
    non_empty_env(LOG_FORMAT_ENV).and_then(|v| LogFormat::from_arg(&v))
}

/// Parse log file path from the `TEAMCOST_LOG_FILE` env var.
#[must_use]
pub fn log_file_from_env() -> Option<PathBuf> {
    non_empty_env(LOG_FILE_ENV).map(PathBuf::from)
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Initialize logging with the given settings.
///
/// `verbose` promotes the default level to debug. Logs go to stderr unless a
/// log file is given.
pub fn init(level: LogLevel, format: LogFormat, log_file: Option<PathBuf>, verbose: bool) {
    let level = if verbose && level == LogLevel::Warn {
        LogLevel::Debug
    } else {
        level
    };

    let file = log_file.and_then(|path| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .ok()
    });

    let writer = file
        .and_then(|f| f.try_clone().ok())
        .map_or_else(|| BoxMakeWriter::new(std::io::stderr), BoxMakeWriter::new);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("teamcost={}", level.as_filter())));

    match format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .with_writer(writer)
                .try_init()
                .ok();
        }
        LogFormat::Human => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_target(false)
                .try_init()
                .ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_parsing() {
        assert_eq!(LogLevel::from_arg("trace"), Some(LogLevel::Trace));
        assert_eq!(LogLevel::from_arg("VERBOSE"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_arg("warning"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_arg("loud"), None);
    }

    #[test]
    fn format_parsing() {
        assert_eq!(LogFormat::from_arg("json"), Some(LogFormat::Json));
        assert_eq!(LogFormat::from_arg("Human"), Some(LogFormat::Human));
        assert_eq!(LogFormat::from_arg("yaml"), None);
    }
}
