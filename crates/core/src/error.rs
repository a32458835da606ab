//! Error types for Audii
//!
//! Failures are terminal for the user action that triggered them: nothing in
//! the application retries automatically. Each error carries a severity so
//! callers can pick a log level, and a short message suitable for showing
//! next to the state that failed.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// The action failed but nothing else is affected
    Minor,
    /// A feature is unusable until the user fixes something
    Degraded,
    /// The application cannot continue
    Fatal,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Minor => write!(f, "Minor"),
            Self::Degraded => write!(f, "Degraded"),
            Self::Fatal => write!(f, "Fatal"),
        }
    }
}

/// Main error type for Audii
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Database Errors =====
    /// Database operation failed
    #[error("Database error: {message}")]
    DatabaseError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Database migration failed
    #[error("Migration failed: {version} - {reason}")]
    MigrationFailed { version: String, reason: String },

    /// Record not found in database
    #[error("Record not found: {entity} with {identifier}")]
    RecordNotFound { entity: String, identifier: String },

    /// A record with the same identity is already stored
    #[error("{entity}: {identifier} already exists")]
    AlreadyExists { entity: String, identifier: String },

    // ===== Import Errors =====
    /// Nothing playable was found at the given location
    #[error("Error Adding Audiobook: no audio files in {location}")]
    NoAudioFiles { location: String },

    /// A folder was expected
    #[error("Not a folder: {location}")]
    NotAFolder { location: String },

    /// The folder has no entries at all
    #[error("No files in folder: {location}")]
    EmptyFolder { location: String },

    /// Re-scanning the registered datasources failed
    #[error("Error Syncing Data Sources: {message}")]
    DatasourceSync {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // ===== Audio/Media Errors =====
    /// Audio decoding failed
    #[error("Audio decode error: {message}")]
    AudioDecodeError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Audio playback device error
    #[error("Playback device error: {message}")]
    PlaybackDeviceError { message: String },

    /// Playback speed outside the supported range
    #[error("Invalid playback speed: {speed}")]
    InvalidSpeed { speed: f32 },

    // ===== File System Errors =====
    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// General I/O error
    #[error("I/O error: {message}")]
    IoError {
        message: String,
        #[source]
        source: io::Error,
    },

    // ===== Generic Errors =====
    /// Generic internal error
    #[error("Internal error: {message}")]
    InternalError { message: String },

    /// Invalid argument provided
    #[error("Invalid argument: {argument} - {reason}")]
    InvalidArgument { argument: String, reason: String },
}

impl AppError {
    /// Returns the severity level of this error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::MigrationFailed { .. } | Self::InternalError { .. } => ErrorSeverity::Fatal,

            Self::DatabaseError { .. }
            | Self::PlaybackDeviceError { .. }
            | Self::DatasourceSync { .. } => ErrorSeverity::Degraded,

            _ => ErrorSeverity::Minor,
        }
    }

    /// Returns a short message suitable for display next to the failed action
    pub fn user_message(&self) -> String {
        match self {
            Self::DatabaseError { .. } => {
                "The library database is unavailable. Please try again.".to_string()
            }
            Self::MigrationFailed { .. } => {
                "Failed to update the library database.".to_string()
            }
            Self::RecordNotFound { entity, .. } => format!("{} not found.", entity),
            Self::AlreadyExists { .. } => self.to_string(),

            Self::NoAudioFiles { .. } => "Error Adding Audiobook".to_string(),
            Self::NotAFolder { .. } => "Not a folder".to_string(),
            Self::EmptyFolder { .. } => "No files in folder".to_string(),
            Self::DatasourceSync { .. } => self.to_string(),

            Self::AudioDecodeError { .. } => {
                "Cannot play this audio file. It may be corrupted or in an unsupported format."
                    .to_string()
            }
            Self::PlaybackDeviceError { .. } => {
                "Cannot access audio playback. Please check your audio device.".to_string()
            }
            Self::InvalidSpeed { .. } => "Speed must be between 0.5x and 3.0x.".to_string(),

            Self::FileNotFound { .. } => {
                "The file was not found. It may have been moved or deleted.".to_string()
            }
            Self::IoError { .. } => "A file operation failed. Please try again.".to_string(),

            Self::InternalError { .. } => {
                "An unexpected error occurred. Please try again.".to_string()
            }
            Self::InvalidArgument { reason, .. } => reason.clone(),
        }
    }

    /// Returns true if this error should be logged at ERROR level
    pub fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Fatal
    }

    /// Helper to create a database error from any error type
    pub fn database<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::DatabaseError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Wraps a failure raised while re-scanning datasources, keeping its cause
    pub fn datasource_sync<E: std::error::Error + Send + Sync + 'static>(source: E) -> Self {
        Self::DatasourceSync {
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Helper for rejected user input
    pub fn invalid_argument(argument: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument: argument.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience type alias for Results using AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::FileNotFound {
                path: PathBuf::from("unknown"),
            },
            _ => Self::IoError {
                message: err.to_string(),
                source: err,
            },
        }
    }
}
