//! Audiobook records

use crate::error::AppError;
use crate::types::{
    CollectionId, DatasourceId, Duration, PlaybackSpeed, Position, Timeline, Timestamp, Validator,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an audiobook
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AudiobookId(String);

impl AudiobookId {
    /// Generates a fresh identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Wraps a stored identifier
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AudiobookId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AudiobookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Forward and backward skip amounts in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipTimings {
    pub forward_secs: u32,
    pub backward_secs: u32,
}

impl SkipTimings {
    pub fn new(forward_secs: u32, backward_secs: u32) -> Self {
        Self {
            forward_secs,
            backward_secs,
        }
    }

    pub fn forward_ms(&self) -> u64 {
        u64::from(self.forward_secs) * 1000
    }

    pub fn backward_ms(&self) -> u64 {
        u64::from(self.backward_secs) * 1000
    }
}

impl Default for SkipTimings {
    fn default() -> Self {
        Self::new(10, 10)
    }
}

/// Everything the import pipeline learns about a book before it is stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudiobookData {
    pub title: String,
    pub author: String,
    pub narrator: String,
    pub location: String,
    pub durations: Vec<u64>,
    pub cover_path: Option<String>,
}

/// A stored audiobook made of one or more chapter files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Audiobook {
    pub id: AudiobookId,
    pub title: String,
    pub author: String,
    pub narrator: String,
    /// Source locator: a file for single-chapter books, a folder otherwise
    pub location: String,
    /// Per-chapter durations in milliseconds
    pub durations: Vec<u64>,
    pub position: Position,
    pub cover_path: Option<String>,
    pub modified: Timestamp,
    pub skip_timings: SkipTimings,
    pub speed: f32,
    pub datasource_id: Option<DatasourceId>,
    /// Sorted, duplicate-free collection ids
    pub collections: Vec<CollectionId>,
}

impl Audiobook {
    /// Creates a new audiobook from imported data
    pub fn from_data(data: AudiobookData, datasource_id: Option<DatasourceId>) -> Self {
        Self {
            id: AudiobookId::new(),
            title: data.title,
            author: data.author,
            narrator: data.narrator,
            location: data.location,
            durations: data.durations,
            position: Position::START,
            cover_path: data.cover_path,
            modified: Timestamp::now(),
            skip_timings: SkipTimings::default(),
            speed: PlaybackSpeed::NORMAL.value(),
            datasource_id,
            collections: Vec::new(),
        }
    }

    pub fn timeline(&self) -> Timeline<'_> {
        Timeline::new(&self.durations)
    }

    pub fn chapter_count(&self) -> usize {
        self.durations.len()
    }

    pub fn total_duration(&self) -> Duration {
        Duration::from_millis(self.timeline().total_ms())
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.timeline().elapsed_ms(self.position))
    }

    pub fn remaining(&self) -> Duration {
        Duration::from_millis(self.timeline().remaining_ms(self.position))
    }

    pub fn progress_percent(&self) -> u8 {
        self.timeline().progress_percent(self.position)
    }

    pub fn is_completed(&self) -> bool {
        self.timeline().is_completed(self.position)
    }

    /// True once playback has moved away from the very start
    pub fn is_started(&self) -> bool {
        self.position.is_started()
    }

    /// Records a new position, clamped into the timeline
    pub fn set_position(&mut self, position: Position) {
        self.position = self.timeline().clamp(position);
        self.touch();
    }

    /// Position at the end of the last chapter
    pub fn completed_position(&self) -> Position {
        self.timeline().end()
    }

    pub fn mark_completed(&mut self) {
        let end = self.completed_position();
        self.set_position(end);
    }

    pub fn restart(&mut self) {
        self.set_position(Position::START);
    }

    pub fn set_speed(&mut self, speed: f32) -> Result<(), AppError> {
        self.speed = PlaybackSpeed::new(speed)?.value();
        self.touch();
        Ok(())
    }

    /// Binary-search membership test on the sorted collection list
    pub fn is_in_collection(&self, id: CollectionId) -> bool {
        self.collections.binary_search(&id).is_ok()
    }

    /// Adds the book to a collection, returns false when already a member
    pub fn add_to_collection(&mut self, id: CollectionId) -> bool {
        match self.collections.binary_search(&id) {
            Ok(_) => false,
            Err(index) => {
                self.collections.insert(index, id);
                self.touch();
                true
            }
        }
    }

    /// Removes the book from a collection, returns false when not a member
    pub fn remove_from_collection(&mut self, id: CollectionId) -> bool {
        match self.collections.binary_search(&id) {
            Ok(index) => {
                self.collections.remove(index);
                self.touch();
                true
            }
            Err(_) => false,
        }
    }

    /// Replaces the collection list, keeping it sorted and unique
    pub fn set_collections(&mut self, mut ids: Vec<CollectionId>) {
        ids.sort();
        ids.dedup();
        self.collections = ids;
        self.touch();
    }

    /// Case-insensitive match against title or author
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.title.to_lowercase().contains(&query)
            || self.author.to_lowercase().contains(&query)
    }

    /// Updates the modification timestamp
    pub fn touch(&mut self) {
        self.modified = Timestamp::now();
    }
}

impl Validator for Audiobook {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.title.trim().is_empty() {
            errors.push("Title cannot be empty".to_string());
        }

        if self.location.trim().is_empty() {
            errors.push("Location cannot be empty".to_string());
        }

        if self.durations.is_empty() {
            errors.push("Audiobook must have at least one chapter".to_string());
        } else if !self.timeline().contains(self.position) {
            errors.push(format!(
                "Position {} is outside of {} chapters",
                self.position,
                self.durations.len()
            ));
        }

        if let Err(speed_errors) = PlaybackSpeed::new_unchecked(self.speed).validate() {
            errors.extend(speed_errors);
        }

        if self.collections.windows(2).any(|pair| pair[0] >= pair[1]) {
            errors.push("Collection ids must be sorted and unique".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
