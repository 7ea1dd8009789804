//! Logging configuration.

use crate::config::LoggingSettings;
use crate::{Error, Result};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses a format name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parses a level name, accepting the `warning` and `critical` spellings.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for an unknown name.
pub fn parse_level(name: &str) -> Result<Level> {
    match name.trim().to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" | "critical" => Ok(Level::ERROR),
        _ => Err(Error::InvalidInput(format!(
            "unknown log level '{name}' (expected trace, debug, info, warning, error or critical)"
        ))),
    }
}

/// Resolved logging configuration.
#[derive(Debug)]
pub struct LoggingConfig {
    /// Event filter. `RUST_LOG` directives take precedence over the level.
    pub filter: EnvFilter,
    /// Output format.
    pub format: LogFormat,
    /// Append to this file instead of writing to stderr.
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    /// Builds the configuration from settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the level name is unknown.
    pub fn from_settings(settings: &LoggingSettings) -> Result<Self> {
        let level = parse_level(&settings.level)?;
        let filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(level).into())
            .from_env_lossy();

        Ok(Self {
            filter,
            format: settings.format,
            file: settings.file.clone(),
        })
    }
}
