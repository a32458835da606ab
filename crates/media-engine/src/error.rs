use audii_core::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("Output error: {0}")]
    OutputError(String),

    #[error("Seek error: {0}")]
    SeekError(String),

    #[error("Invalid speed: {0}")]
    InvalidSpeed(f32),

    #[error("Nothing to play")]
    NoItems,

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl EngineError {
    pub fn user_message(&self) -> String {
        AppError::from(self).user_message()
    }
}

impl From<&EngineError> for AppError {
    fn from(err: &EngineError) -> Self {
        match err {
            EngineError::DecodeError(message) | EngineError::SeekError(message) => {
                AppError::AudioDecodeError {
                    message: message.clone(),
                    source: None,
                }
            }
            EngineError::OutputError(message) => AppError::PlaybackDeviceError {
                message: message.clone(),
            },
            EngineError::InvalidSpeed(speed) => AppError::InvalidSpeed { speed: *speed },
            EngineError::NoItems => AppError::invalid_argument("items", err.to_string()),
            other => AppError::InternalError {
                message: other.to_string(),
            },
        }
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        AppError::from(&err)
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
