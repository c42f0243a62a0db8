use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

/// Longest accepted recent window (one leap year)
pub const MAX_RECENT_HOURS: i64 = 24 * 366;
/// Furthest accepted reference offset (ten years)
pub const MAX_REFERENCE_DAYS_BACK: i64 = 3660;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid output target: {0}")]
    Output(String),

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: String,
    pub snapshot_path: PathBuf,
    pub output: String,
    pub protocol: String,
    pub vm_size_parameter: i32,
    pub process_table: i32,
    pub computer_name_parameter: i32,
    pub recent_hours: i64,
    pub reference_days_back: i64,
    pub max_runtime_secs: Option<u64>,
    /// Fixed reference time for the windows instead of the current time
    pub now: Option<DateTime<Utc>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            snapshot_path: PathBuf::from("platform.json"),
            output: "stdout".to_string(),
            protocol: "Microsoft Platform".to_string(),
            vm_size_parameter: 99,
            process_table: 96,
            computer_name_parameter: 165,
            recent_hours: 24,
            reference_days_back: 7,
            max_runtime_secs: None,
            now: None,
        }
    }
}

impl Config {
    /// Defaults, then the TOML file named by `VMDRIFT_CONFIG`, then `VMDRIFT_*` variables
    pub fn load() -> Result<Self, ConfigError> {
        let base = match env::var("VMDRIFT_CONFIG") {
            Ok(path) => Self::from_toml_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        let config = base.with_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply variable overrides; unparsable values keep the current setting
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(level) = lookup("VMDRIFT_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(path) = lookup("VMDRIFT_SNAPSHOT") {
            self.snapshot_path = PathBuf::from(path);
        }
        if let Some(output) = lookup("VMDRIFT_OUTPUT") {
            self.output = output;
        }
        if let Some(protocol) = lookup("VMDRIFT_PROTOCOL") {
            self.protocol = protocol;
        }
        self.vm_size_parameter = lookup("VMDRIFT_VM_SIZE_PARAMETER")
            .and_then(|s| s.parse().ok())
            .unwrap_or(self.vm_size_parameter);
        self.process_table = lookup("VMDRIFT_PROCESS_TABLE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(self.process_table);
        self.computer_name_parameter = lookup("VMDRIFT_COMPUTER_NAME_PARAMETER")
            .and_then(|s| s.parse().ok())
            .unwrap_or(self.computer_name_parameter);
        self.recent_hours = lookup("VMDRIFT_RECENT_HOURS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(self.recent_hours);
        self.reference_days_back = lookup("VMDRIFT_REFERENCE_DAYS_BACK")
            .and_then(|s| s.parse().ok())
            .unwrap_or(self.reference_days_back);
        if let Some(secs) = lookup("VMDRIFT_MAX_RUNTIME_SECS").and_then(|s| s.parse().ok()) {
            self.max_runtime_secs = Some(secs);
        }
        if let Some(now) = lookup("VMDRIFT_NOW").and_then(|s| s.parse().ok()) {
            self.now = Some(now);
        }
        self
    }

    /// Reject window lengths that are not positive or out of range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_RECENT_HOURS).contains(&self.recent_hours) {
            return Err(ConfigError::Invalid(format!(
                "recent_hours must be between 1 and {}, got {}",
                MAX_RECENT_HOURS, self.recent_hours
            )));
        }
        if !(1..=MAX_REFERENCE_DAYS_BACK).contains(&self.reference_days_back) {
            return Err(ConfigError::Invalid(format!(
                "reference_days_back must be between 1 and {}, got {}",
                MAX_REFERENCE_DAYS_BACK, self.reference_days_back
            )));
        }
        Ok(())
    }

    pub fn output_target(&self) -> Result<OutputTarget, ConfigError> {
        self.output.parse()
    }
}

/// Where the result blob goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    Directory(PathBuf),
    Webhook(String),
}

impl FromStr for OutputTarget {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "stdout" {
            return Ok(Self::Stdout);
        }
        if let Some(dir) = s.strip_prefix("file:") {
            if dir.is_empty() {
                return Err(ConfigError::Output(s.to_string()));
            }
            return Ok(Self::Directory(PathBuf::from(dir)));
        }
        if let Some(url) = s.strip_prefix("webhook:") {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Output(s.to_string()));
            }
            return Ok(Self::Webhook(url.to_string()));
        }
        Err(ConfigError::Output(s.to_string()))
    }
}
