//! Playback-related domain models

use crate::error::AppError;
use crate::types::{Duration, Validator};
use serde::{Deserialize, Serialize};

/// Playback speed multiplier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSpeed(f32);

impl PlaybackSpeed {
    pub const MIN: f32 = 0.5;
    pub const MAX: f32 = 3.0;
    pub const NORMAL: Self = Self(1.0);

    /// Creates a new playback speed (0.5x - 3.0x)
    pub fn new(speed: f32) -> Result<Self, AppError> {
        if Self::is_supported(speed) {
            Ok(Self(speed))
        } else {
            Err(AppError::InvalidSpeed { speed })
        }
    }

    /// Creates a playback speed without validation (for stored values)
    pub fn new_unchecked(speed: f32) -> Self {
        Self(speed)
    }

    /// True when `speed` lies within the supported range
    pub fn is_supported(speed: f32) -> bool {
        (Self::MIN..=Self::MAX).contains(&speed)
    }

    /// Returns the speed value
    pub fn value(&self) -> f32 {
        self.0
    }

    /// Speed moved by `step`, clamped to the supported range
    pub fn stepped(&self, step: f32) -> Self {
        let next = ((self.0 + step) * 100.0).round() / 100.0;
        Self(next.clamp(Self::MIN, Self::MAX))
    }
}

impl Default for PlaybackSpeed {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl Validator for PlaybackSpeed {
    fn validate(&self) -> Result<(), Vec<String>> {
        if Self::is_supported(self.0) {
            Ok(())
        } else {
            Err(vec![format!(
                "Speed must be between {} and {}",
                Self::MIN,
                Self::MAX
            )])
        }
    }
}

/// One playable file of a book as presented to the player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    pub duration: Duration,
}

impl Chapter {
    pub fn new(title: impl Into<String>, duration: Duration) -> Self {
        Self {
            title: title.into(),
            duration,
        }
    }
}
