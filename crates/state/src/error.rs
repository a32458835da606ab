use audii_core::AppError;
use audii_library::LibraryError;
use media_engine::EngineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StateError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Library(#[from] LibraryError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl StateError {
    /// Message stored in a holder's `error_message`
    pub fn user_message(&self) -> String {
        match self {
            StateError::App(e) => e.user_message(),
            StateError::Library(e) => e.user_message(),
            StateError::Engine(e) => e.user_message(),
        }
    }
}

pub type StateResult<T> = std::result::Result<T, StateError>;
