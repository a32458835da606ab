//! Application-level configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Log level for application logging
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(ValidationError::with_value(
                "app.log_level",
                "must be one of: error, warn, info, debug, trace",
                other,
            )),
        }
    }
}

/// Application-level settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Database file path (relative to the data dir if not absolute)
    pub database_path: PathBuf,

    /// Where imported cover art is copied (relative to the data dir if not absolute)
    pub covers_dir: PathBuf,

    /// Log level for application output
    pub log_level: LogLevel,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("audii.db"),
            covers_dir: PathBuf::from("covers"),
            log_level: LogLevel::Info,
        }
    }
}

impl ConfigSection for AppConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::not_empty(&self.database_path.to_string_lossy(), "app.database_path"),
            Validator::not_empty(&self.covers_dir.to_string_lossy(), "app.covers_dir"),
        ])
    }

    fn merge(&mut self, other: Self) {
        self.database_path = other.database_path;
        self.covers_dir = other.covers_dir;
        self.log_level = other.log_level;
    }

    fn section_name(&self) -> &'static str {
        "app"
    }
}
