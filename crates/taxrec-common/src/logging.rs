//! Logging configuration and initialization
//!
//! Centralized tracing setup for all taxrec binaries and tests:
//!
//! - console or daily-rotated file output
//! - text or JSON format
//! - level and per-module filters from the environment
//!
//! Use the structured macros (`trace!` .. `error!`) with fields instead of
//! `println!`; spans around engine operations come from
//! `#[tracing::instrument]` at the call sites.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Log level for filtering messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Convert to tracing Level
    pub fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(anyhow::anyhow!("Invalid log level: {}", s)),
        }
    }
}

/// Output target for logs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Console,
    File,
}

impl std::str::FromStr for LogOutput {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "console" | "stdout" => Ok(LogOutput::Console),
            "file" => Ok(LogOutput::File),
            _ => Err(anyhow::anyhow!("Invalid log output: {}", s)),
        }
    }
}

/// Log format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(anyhow::anyhow!("Invalid log format: {}", s)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Minimum log level to display
    pub level: LogLevel,

    /// Output target (console or file)
    pub output: LogOutput,

    /// Log format (text or JSON)
    pub format: LogFormat,

    /// Directory for log files (only used when output is file)
    pub log_dir: PathBuf,

    /// Log file name prefix (e.g., "taxrec" -> "taxrec.2026-08-29.log")
    pub log_file_prefix: String,

    /// Additional filter directives (e.g., "sqlx=warn,reqwest=info")
    pub filter_directives: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            output: LogOutput::Console,
            format: LogFormat::Text,
            log_dir: PathBuf::from("./logs"),
            log_file_prefix: "taxrec".to_string(),
            filter_directives: None,
        }
    }
}

impl LogConfig {
    /// Load configuration from environment variables
    ///
    /// - `LOG_LEVEL`: trace, debug, info, warn, error
    /// - `LOG_OUTPUT`: console, file
    /// - `LOG_FORMAT`: text, json
    /// - `LOG_DIR`: directory for log files
    /// - `LOG_FILE_PREFIX`: prefix for log files
    /// - `LOG_FILTER`: additional filter directives
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.level = level.parse()?;
        }
        if let Ok(output) = std::env::var("LOG_OUTPUT") {
            config.output = output.parse()?;
        }
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            config.format = format.parse()?;
        }
        if let Ok(dir) = std::env::var("LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }
        if let Ok(prefix) = std::env::var("LOG_FILE_PREFIX") {
            config.log_file_prefix = prefix;
        }
        if let Ok(filter) = std::env::var("LOG_FILTER") {
            config.filter_directives = Some(filter);
        }

        Ok(config)
    }

    /// Create a config with the given level, other fields default
    pub fn with_level(level: LogLevel) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }
}

/// Initialize logging with the given configuration
///
/// Sets up the global tracing subscriber; call once at startup.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let mut filter =
        EnvFilter::from_default_env().add_directive(config.level.to_tracing_level().into());

    if let Some(ref directives) = config.filter_directives {
        for directive in directives.split(',') {
            filter = filter.add_directive(
                directive
                    .parse()
                    .context("Failed to parse filter directive")?,
            );
        }
    }

    match config.output {
        LogOutput::Console => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(true)
                .with_span_events(FmtSpan::CLOSE);

            match config.format {
                LogFormat::Text => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt_layer)
                        .try_init()?;
                },
                LogFormat::Json => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt_layer.json())
                        .try_init()?;
                },
            }
        },
        LogOutput::File => {
            std::fs::create_dir_all(&config.log_dir)
                .context("Failed to create log directory")?;

            let file_appender =
                tracing_appender::rolling::daily(&config.log_dir, &config.log_file_prefix);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            // The guard must outlive the subscriber; leak it for the
            // lifetime of the process.
            std::mem::forget(guard);

            let fmt_layer = fmt::layer()
                .with_writer(non_blocking)
                .with_target(true)
                .with_span_events(FmtSpan::CLOSE)
                .with_ansi(false);

            match config.format {
                LogFormat::Text => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt_layer)
                        .try_init()?;
                },
                LogFormat::Json => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt_layer.json())
                        .try_init()?;
                },
            }
        },
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_str() {
        assert_eq!("trace".parse::<LogLevel>().unwrap(), LogLevel::Trace);
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_log_output_from_str() {
        assert_eq!("console".parse::<LogOutput>().unwrap(), LogOutput::Console);
        assert_eq!("FILE".parse::<LogOutput>().unwrap(), LogOutput::File);
        assert!("syslog".parse::<LogOutput>().is_err());
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_with_level() {
        let config = LogConfig::with_level(LogLevel::Debug);
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.output, LogOutput::Console);
    }
}
