//! Configuration management for Coffer.
//!
//! The configuration file only carries the archive input descriptor and
//! logging preferences. Bucket settings such as lifecycle and CORS are fixed
//! archive defaults and are not configurable.
//!
//! ```toml
//! [archive]
//! prefix = "archive"
//! replication_regions = ["us-west-2", "us-east-2"]
//!
//! [environment]
//! account_id = "123456789012"
//! home_region = "us-east-1"
//!
//! [logging]
//! level = "debug"
//! format = "json"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Environment variable consulted when no account id is configured.
pub const ACCOUNT_ENV: &str = "CDK_DEFAULT_ACCOUNT";

/// Environment variable consulted when no home region is configured.
pub const REGION_ENV: &str = "CDK_DEFAULT_REGION";

/// Main configuration for Coffer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Archive description.
    pub archive: ArchiveConfig,
    /// Target account and home region.
    pub environment: EnvironmentConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string cannot be parsed.
    pub fn parse(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Load configuration from an optional file, then fill missing
    /// environment values from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is given but cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.environment.fill_from(|key| std::env::var(key).ok());
        Ok(config)
    }
}

/// The archive being compiled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Naming prefix for every derived resource.
    pub prefix: String,
    /// Replication target regions, in precedence order.
    pub replication_regions: Vec<String>,
}

/// Account and home region the primary resources live in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Account id owning the archive.
    pub account_id: Option<String>,
    /// Region of the primary bucket and key.
    pub home_region: Option<String>,
}

impl EnvironmentConfig {
    /// Fill unset values using `lookup` on [`ACCOUNT_ENV`] and [`REGION_ENV`].
    ///
    /// Values already present in the configuration always win.
    pub fn fill_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.account_id.is_none() {
            self.account_id = lookup(ACCOUNT_ENV).filter(|v| !v.is_empty());
        }
        if self.home_region.is_none() {
            self.home_region = lookup(REGION_ENV).filter(|v| !v.is_empty());
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format.
    #[default]
    Pretty,
    /// JSON format.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
    /// Log output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Pretty }
    }
}
