//! Configuration management.
//!
//! Settings are layered, later sources winning: built-in defaults, a TOML
//! file, `FOOTFALL_*` environment variables, then command-line flags (applied
//! by the binary through the `with_*` setters).

use crate::io::DEFAULT_BULK_SIZE;
use crate::observability::LogFormat;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "FOOTFALL_CONFIG_PATH";
/// Environment variable overriding the database path.
pub const DATABASE_ENV: &str = "FOOTFALL_DATABASE";
/// Environment variable overriding the import bulk size.
pub const BULK_SIZE_ENV: &str = "FOOTFALL_BULK_SIZE";
/// Environment variable overriding the log level.
pub const LOG_LEVEL_ENV: &str = "FOOTFALL_LOG";

/// Database file used when nothing else is configured.
pub const DEFAULT_DATABASE: &str = "db.sqlite3";

/// Main configuration for footfall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FootfallConfig {
    /// Path to the `SQLite` database owned by the shop application.
    pub database: PathBuf,
    /// Rows per bulk insert statement on import.
    pub bulk_size: usize,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Level name (`trace`, `debug`, `info`, `warning`, `error`, `critical`).
    pub level: String,
    /// Output format.
    pub format: LogFormat,
    /// Append logs to this file instead of stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            file: None,
        }
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Database path.
    pub database: Option<String>,
    /// Import bulk size.
    pub bulk_size: Option<usize>,
    /// Logging section.
    pub logging: Option<ConfigFileLogging>,
}

/// Logging section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileLogging {
    /// Level name.
    pub level: Option<String>,
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Log file path.
    pub file: Option<String>,
}

impl Default for FootfallConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE),
            bulk_size: DEFAULT_BULK_SIZE,
            logging: LoggingSettings::default(),
        }
    }
}

impl FootfallConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from an explicit file, or from the default
    /// locations when `path` is `None`, then applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named file cannot be read or parsed,
    /// or an environment override is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load_default()?,
        };
        config.apply_env_overrides_from(|key| std::env::var(key).ok())
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        Self::from_toml_str(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid configuration.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| Error::OperationFailed {
            operation: "parse_config_file".to_string(),
            cause: e.to_string(),
        })?;

        Self::from_config_file(file)
    }

    /// Loads configuration from the default location.
    ///
    /// Checks `FOOTFALL_CONFIG_PATH` first, then the platform config dir
    /// (`~/.config/footfall/config.toml` on Linux). Returns the default
    /// configuration if no file is found.
    ///
    /// # Errors
    ///
    /// Returns an error if a file is found but cannot be parsed.
    pub fn load_default() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Self::load_from_file(Path::new(&path));
        }

        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Ok(Self::default());
        };

        let platform_config = base_dirs.config_dir().join("footfall").join("config.toml");
        if platform_config.exists() {
            return Self::load_from_file(&platform_config);
        }

        Ok(Self::default())
    }

    /// Converts a `ConfigFile` to `FootfallConfig`.
    fn from_config_file(file: ConfigFile) -> Result<Self> {
        let mut config = Self::default();

        if let Some(database) = file.database {
            config.database = PathBuf::from(database);
        }
        if let Some(bulk_size) = file.bulk_size {
            config = config.with_bulk_size(bulk_size)?;
        }
        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                config.logging.level = level;
            }
            if let Some(format) = logging.format {
                config.logging.format = LogFormat::parse(&format).ok_or_else(|| {
                    Error::InvalidInput(format!("unknown log format '{format}'"))
                })?;
            }
            config.logging.file = logging.file.map(PathBuf::from);
        }

        Ok(config)
    }

    /// Applies `FOOTFALL_*` overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `FOOTFALL_BULK_SIZE` is not a
    /// positive integer.
    pub fn apply_env_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        if let Some(database) = lookup(DATABASE_ENV).filter(|v| !v.is_empty()) {
            self.database = PathBuf::from(database);
        }
        if let Some(bulk_size) = lookup(BULK_SIZE_ENV).filter(|v| !v.is_empty()) {
            let parsed = bulk_size.trim().parse::<usize>().map_err(|e| {
                Error::InvalidInput(format!("{BULK_SIZE_ENV}={bulk_size:?}: {e}"))
            })?;
            self = self.with_bulk_size(parsed)?;
        }
        if let Some(level) = lookup(LOG_LEVEL_ENV).filter(|v| !v.is_empty()) {
            self.logging.level = level;
        }
        Ok(self)
    }

    /// Sets the database path.
    #[must_use]
    pub fn with_database(mut self, path: impl Into<PathBuf>) -> Self {
        self.database = path.into();
        self
    }

    /// Sets the import bulk size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `bulk_size` is zero.
    pub fn with_bulk_size(mut self, bulk_size: usize) -> Result<Self> {
        if bulk_size == 0 {
            return Err(Error::InvalidInput(
                "bulk size must be at least 1".to_string(),
            ));
        }
        self.bulk_size = bulk_size;
        Ok(self)
    }

    /// Sets the log level name.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.logging.level = level.into();
        self
    }
}
