//! Configuration errors

use std::path::PathBuf;
use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    // ===== Reading =====
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// The file declares a format version this build does not know
    #[error("Config version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    // ===== Writing =====
    #[error("Failed to write config file at {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to create config directory at {path}: {source}")]
    DirectoryCreationError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Saving refuses values that fail validation
    #[error("Config validation failed: {0}")]
    ValidationError(String),

    #[error("Could not determine config directory path: {reason}")]
    PathResolutionError { reason: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// One field that failed validation, addressed as `section.field`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Field '{field}': {message}{}", got(.value))]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub value: Option<String>,
}

fn got(value: &Option<String>) -> String {
    value
        .as_ref()
        .map(|v| format!(" (got: {})", v))
        .unwrap_or_default()
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value: None,
        }
    }

    /// Same as [`ValidationError::new`], quoting the rejected value
    pub fn with_value(
        field: impl Into<String>,
        message: impl Into<String>,
        value: impl ToString,
    ) -> Self {
        Self {
            value: Some(value.to_string()),
            ..Self::new(field, message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("library.audio_extensions", "must not be empty");
        assert_eq!(
            err.to_string(),
            "Field 'library.audio_extensions': must not be empty"
        );

        let err = ValidationError::with_value(
            "player.default_speed",
            "must be between 0.5 and 3",
            "4",
        );
        assert_eq!(
            err.to_string(),
            "Field 'player.default_speed': must be between 0.5 and 3 (got: 4)"
        );
    }

    #[test]
    fn test_unsupported_version_display() {
        let err = ConfigError::UnsupportedVersion {
            found: 3,
            supported: 1,
        };
        assert!(err.to_string().contains("newer"));
    }
}
