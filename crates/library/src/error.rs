use audii_core::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Metadata extraction failed: {0}")]
    MetadataError(String),

    #[error("Background task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LibraryError {
    /// Short message suitable for display next to the failed action
    pub fn user_message(&self) -> String {
        match self {
            LibraryError::App(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for LibraryError {
    fn from(err: tokio::task::JoinError) -> Self {
        LibraryError::Task(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
pub type LibraryResult<T> = std::result::Result<T, LibraryError>;
