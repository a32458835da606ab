//! The seam between the playback controller and whatever produces sound

use crate::error::EngineResult;
use std::path::PathBuf;
use tokio::sync::broadcast;

/// One queued file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub path: PathBuf,
    pub title: String,
    /// Known duration, 0 when the player has to find out itself
    pub duration_ms: u64,
}

impl MediaItem {
    pub fn new(path: impl Into<PathBuf>, title: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            duration_ms,
        }
    }
}

/// Point-in-time view of a player
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    /// Index of the current item, `None` when the queue is empty
    pub item_index: Option<usize>,
    pub item_count: usize,
    pub position_ms: u64,
    /// Duration of the current item
    pub duration_ms: u64,
    pub is_playing: bool,
    pub speed: f32,
}

impl Default for PlayerSnapshot {
    fn default() -> Self {
        Self {
            item_index: None,
            item_count: 0,
            position_ms: 0,
            duration_ms: 0,
            is_playing: false,
            speed: 1.0,
        }
    }
}

/// Pushed by a player when something changes between polls
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    ItemChanged(usize),
    PlayingChanged(bool),
    /// The last item finished
    Ended,
    Error(String),
}

/// A queue-based audio player.
///
/// Offsets are milliseconds into the current item. Implementations must be
/// callable from any thread; commands may take effect asynchronously, so a
/// snapshot taken right after a command can lag behind it.
pub trait PlayerClient: Send + Sync {
    /// Replaces the queue and moves to its first item, paused
    fn set_items(&self, items: Vec<MediaItem>) -> EngineResult<()>;

    fn seek_to_item(&self, index: usize, offset_ms: u64) -> EngineResult<()>;

    fn play(&self) -> EngineResult<()>;

    fn pause(&self) -> EngineResult<()>;

    /// Stops playback and rewinds the current item
    fn stop(&self) -> EngineResult<()>;

    /// Empties the queue
    fn clear(&self) -> EngineResult<()>;

    fn seek(&self, offset_ms: u64) -> EngineResult<()>;

    fn seek_to_next_item(&self) -> EngineResult<()>;

    fn seek_to_previous_item(&self) -> EngineResult<()>;

    fn set_speed(&self, speed: f32) -> EngineResult<()>;

    fn snapshot(&self) -> PlayerSnapshot;

    fn subscribe(&self) -> broadcast::Receiver<PlayerEvent>;
}
