//! Audii configuration
//!
//! Configuration is a TOML file split into sections. Each section is a type
//! implementing [`ConfigSection`], so it validates and merges itself.
//!
//! Invalid files never take the application down: loading warns on values
//! that fail validation, saving refuses them, and writes go through a
//! temporary file so a crash never leaves a half-written config behind.
//!
//! # Example
//!
//! ```rust,no_run
//! use audii_config::{Config, ConfigManager};
//!
//! let manager = ConfigManager::new().expect("Failed to initialize config");
//! let config = manager.load_or_default();
//!
//! println!("Progress saved every {}s", config.player.progress_save_interval_secs);
//! ```

mod error;
mod manager;
mod persistence;
mod validation;

// Config sections
pub mod app_config;
mod library_config;
mod player_config;

pub use error::{ConfigError, ConfigResult, ValidationError};
pub use manager::ConfigManager;
pub use validation::{ConfigSection, Validator};

pub use app_config::{AppConfig, LogLevel};
pub use library_config::LibraryConfig;
pub use player_config::PlayerConfig;

use serde::{Deserialize, Serialize};

/// Current config file format version
pub const CONFIG_VERSION: u32 = 1;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Config file format version
    pub version: u32,

    /// Application-level settings
    pub app: AppConfig,

    /// Player preferences
    pub player: PlayerConfig,

    /// Import and library settings
    pub library: LibraryConfig,
}

impl Config {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the entire configuration
    ///
    /// Returns all validation errors found across all sections.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(mut e) = self.app.validate() {
            errors.append(&mut e);
        }

        if let Err(mut e) = self.player.validate() {
            errors.append(&mut e);
        }

        if let Err(mut e) = self.library.validate() {
            errors.append(&mut e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Merges this config with another, preferring values from `other`
    pub fn merge(&mut self, other: Config) {
        self.app.merge(other.app);
        self.player.merge(other.player);
        self.library.merge(other.library);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            app: AppConfig::default(),
            player: PlayerConfig::default(),
            library: LibraryConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_version_is_set() {
        let config = Config::default();
        assert_eq!(config.version, CONFIG_VERSION);
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config::default();
        let mut override_config = Config::default();
        override_config.player.default_speed = 1.5;
        override_config.library.follow_symlinks = true;

        base.merge(override_config);

        assert_eq!(base.player.default_speed, 1.5);
        assert!(base.library.follow_symlinks);
    }

    #[test]
    fn test_validation_collects_errors_from_all_sections() {
        let mut config = Config::default();
        config.player.default_speed = 9.0;
        config.library.audio_extensions.clear();

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("[player]\ndefault_speed = 1.25\n").unwrap();
        assert_eq!(config.player.default_speed, 1.25);
        assert_eq!(config.player.progress_save_interval_secs, 90);
        assert_eq!(config.app, AppConfig::default());
    }
}
