//! Observable state holders for Audii front ends
//!
//! Each model owns a `tokio::sync::watch` snapshot that is re-sent whenever
//! the library or the player changes. Failed operations do not return
//! errors; they leave a message in the snapshot's `error_message` until
//! `clear_error` is called.

pub mod collections;
pub mod error;
pub mod import;
pub mod library;
pub mod player;
pub mod progress;

pub use collections::{CollectionModel, CollectionState};
pub use error::{StateError, StateResult};
pub use import::{ImportKind, ImportModel, ImportStatus};
pub use library::{LibraryModel, LibraryState, CONTINUE_LISTENING_LIMIT};
pub use player::{PlayerModel, PlayerState};
pub use progress::ProgressSaver;
