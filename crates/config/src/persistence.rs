//! Reading and writing the config file
//!
//! Writes go to a temporary file in the same directory which is then
//! renamed over the target, so the file on disk is always complete. The
//! previous file is kept next to it as `config.toml.backup`.

use crate::{Config, ConfigError, ConfigResult, CONFIG_VERSION};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Handles configuration file persistence
pub struct ConfigPersistence {
    config_path: PathBuf,
}

impl ConfigPersistence {
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Loads configuration from file
    ///
    /// A missing file yields the default config. An empty, unparsable or
    /// too-new file is an error.
    pub fn load(&self) -> ConfigResult<Config> {
        if !self.config_path.exists() {
            log::info!(
                "Config file not found at {}, using defaults",
                self.config_path.display()
            );
            return Ok(Config::default());
        }

        let contents =
            fs::read_to_string(&self.config_path).map_err(|e| ConfigError::ReadError {
                path: self.config_path.clone(),
                source: e,
            })?;

        // An empty file is treated as corrupted rather than as defaults
        if contents.trim().is_empty() {
            return Err(ConfigError::ReadError {
                path: self.config_path.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "Config file is empty or contains only whitespace",
                ),
            });
        }

        let config: Config = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: self.config_path.clone(),
            source: e,
        })?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: config.version,
                supported: CONFIG_VERSION,
            });
        }

        // Keep loading with invalid values so the user can fix them in place
        if let Err(errors) = config.validate() {
            let error_msg = errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            log::warn!("Config validation warnings: {}", error_msg);
        }

        Ok(config)
    }

    /// Validates and saves configuration atomically
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        if let Err(errors) = config.validate() {
            let error_msg = errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ConfigError::ValidationError(error_msg));
        }

        let dir = self
            .config_path
            .parent()
            .ok_or_else(|| ConfigError::PathResolutionError {
                reason: "Config path has no parent directory".to_string(),
            })?;
        ensure_directory_exists(dir)?;

        if self.config_path.exists() {
            let backup_path = self.backup_path();
            fs::copy(&self.config_path, &backup_path)?;
            log::debug!("Backed up config to {}", backup_path.display());
        }

        let toml_string = toml::to_string_pretty(config)?;

        let mut temp_file = NamedTempFile::new_in(dir)?;
        temp_file.write_all(toml_string.as_bytes())?;
        temp_file.flush()?;
        temp_file
            .persist(&self.config_path)
            .map_err(|e| ConfigError::WriteError {
                path: self.config_path.clone(),
                source: e.error,
            })?;

        log::info!("Config saved to {}", self.config_path.display());
        Ok(())
    }

    /// Location of the copy kept from the previous save
    pub fn backup_path(&self) -> PathBuf {
        self.config_path.with_extension("toml.backup")
    }
}

fn ensure_directory_exists(path: &Path) -> ConfigResult<()> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| ConfigError::DirectoryCreationError {
            path: path.to_path_buf(),
            source: e,
        })?;
        log::info!("Created config directory: {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_dir() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("config.toml");
        (temp_dir, config_path)
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let (_temp_dir, config_path) = setup_test_dir();
        let persistence = ConfigPersistence::new(config_path);

        let config = persistence.load().expect("Should load default config");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_then_load() {
        let (_temp_dir, config_path) = setup_test_dir();
        let persistence = ConfigPersistence::new(config_path);

        let mut config = Config::default();
        config.player.skip_forward_secs = 30;

        persistence.save(&config).expect("Should save config");
        let loaded = persistence.load().expect("Should load config");

        assert_eq!(loaded.player.skip_forward_secs, 30);
    }

    #[test]
    fn test_save_creates_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("subdir").join("config.toml");
        let persistence = ConfigPersistence::new(config_path.clone());

        persistence
            .save(&Config::default())
            .expect("Should create directory and save");

        assert!(config_path.exists());
    }

    #[test]
    fn test_backup_created_on_overwrite() {
        let (_temp_dir, config_path) = setup_test_dir();
        let persistence = ConfigPersistence::new(config_path);

        persistence.save(&Config::default()).expect("Should save config");
        persistence.save(&Config::default()).expect("Should save config again");

        assert!(persistence.backup_path().exists());
    }

    #[test]
    fn test_invalid_toml_returns_parse_error() {
        let (_temp_dir, config_path) = setup_test_dir();
        fs::write(&config_path, "this is not valid TOML {{{").expect("Should write file");

        let persistence = ConfigPersistence::new(config_path);
        assert!(matches!(
            persistence.load().unwrap_err(),
            ConfigError::ParseError { .. }
        ));
    }

    #[test]
    fn test_empty_file_is_an_error() {
        let (_temp_dir, config_path) = setup_test_dir();
        fs::write(&config_path, "  \n").expect("Should write file");

        let persistence = ConfigPersistence::new(config_path);
        assert!(matches!(
            persistence.load().unwrap_err(),
            ConfigError::ReadError { .. }
        ));
    }

    #[test]
    fn test_newer_version_is_rejected() {
        let (_temp_dir, config_path) = setup_test_dir();
        fs::write(&config_path, "version = 99\n").expect("Should write file");

        let persistence = ConfigPersistence::new(config_path);
        assert!(matches!(
            persistence.load().unwrap_err(),
            ConfigError::UnsupportedVersion { found: 99, .. }
        ));
    }

    #[test]
    fn test_validate_before_save() {
        let (_temp_dir, config_path) = setup_test_dir();
        let persistence = ConfigPersistence::new(config_path.clone());

        let mut config = Config::default();
        config.player.default_speed = 7.0;

        assert!(matches!(
            persistence.save(&config).unwrap_err(),
            ConfigError::ValidationError(_)
        ));
        assert!(!config_path.exists());
    }
}
