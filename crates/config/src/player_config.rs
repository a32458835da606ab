//! Player configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};

/// Player preferences and timing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    /// Speed given to newly imported books (0.5 - 3.0)
    pub default_speed: f32,

    /// Skip-forward amount given to newly imported books
    pub skip_forward_secs: u32,

    /// Skip-backward amount given to newly imported books
    pub skip_backward_secs: u32,

    /// How often the controller polls the player position
    pub poll_interval_ms: u64,

    /// How often the current book's position is written to the library
    pub progress_save_interval_secs: u64,

    /// Playback speed change step
    pub speed_step: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            default_speed: 1.0,
            skip_forward_secs: 10,
            skip_backward_secs: 10,
            poll_interval_ms: 1000,
            progress_save_interval_secs: 90,
            speed_step: 0.25,
        }
    }
}

impl ConfigSection for PlayerConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::in_range(self.default_speed, 0.5, 3.0, "player.default_speed"),
            Validator::in_range(self.skip_forward_secs, 1, 600, "player.skip_forward_secs"),
            Validator::in_range(self.skip_backward_secs, 1, 600, "player.skip_backward_secs"),
            Validator::in_range(self.poll_interval_ms, 100, 10_000, "player.poll_interval_ms"),
            Validator::in_range(
                self.progress_save_interval_secs,
                5,
                3600,
                "player.progress_save_interval_secs",
            ),
            Validator::in_range(self.speed_step, 0.05, 1.0, "player.speed_step"),
        ])
    }

    fn merge(&mut self, other: Self) {
        self.default_speed = other.default_speed;
        self.skip_forward_secs = other.skip_forward_secs;
        self.skip_backward_secs = other.skip_backward_secs;
        self.poll_interval_ms = other.poll_interval_ms;
        self.progress_save_interval_secs = other.progress_save_interval_secs;
        self.speed_step = other.speed_step;
    }

    fn section_name(&self) -> &'static str {
        "player"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = PlayerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.poll_interval_ms, 1000);
        assert_eq!(config.progress_save_interval_secs, 90);
    }

    #[test]
    fn test_invalid_speed() {
        let config = PlayerConfig {
            default_speed: 3.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_merge() {
        let mut base = PlayerConfig::default();
        let other = PlayerConfig {
            skip_forward_secs: 30,
            ..Default::default()
        };

        base.merge(other);
        assert_eq!(base.skip_forward_secs, 30);
    }

    #[test]
    fn test_multiple_validation_errors() {
        let config = PlayerConfig {
            default_speed: 0.1,
            skip_backward_secs: 0,
            progress_save_interval_secs: 1,
            ..Default::default()
        };

        assert_eq!(config.validate().unwrap_err().len(), 3);
    }
}
