//! Media Engine - audio playback for Audii
//!
//! [`PlayerController`] drives any [`PlayerClient`]. [`LocalPlayer`] is the
//! client that decodes with symphonia and plays through cpal.

mod client;
mod controller;
mod decoder;
mod error;
mod local;
mod output;
mod speed;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::{MediaItem, PlayerClient, PlayerEvent, PlayerSnapshot};
pub use controller::{ControllerState, PlayerController};
pub use decoder::{AudioDecoder, DecodedAudio};
pub use error::{EngineError, EngineResult};
pub use local::LocalPlayer;
pub use output::AudioOutput;
pub use speed::SpeedProcessor;

pub type Result<T> = std::result::Result<T, EngineError>;
