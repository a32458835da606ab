//! Configuration manager - main API for config operations

use crate::persistence::ConfigPersistence;
use crate::{Config, ConfigError, ConfigResult, LogLevel};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Main configuration manager
///
/// Knows where the config file lives and where relative data paths
/// (database, cover art) are resolved.
pub struct ConfigManager {
    persistence: ConfigPersistence,
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl ConfigManager {
    /// Creates a config manager using the platform directories
    ///
    /// - Linux: `~/.config/audii/` and `~/.local/share/audii/`
    /// - macOS: `~/Library/Application Support/com.acube.audii/`
    /// - Windows: `%APPDATA%\acube\audii\`
    pub fn new() -> ConfigResult<Self> {
        let dirs = ProjectDirs::from("com", "acube", "audii").ok_or_else(|| {
            ConfigError::PathResolutionError {
                reason: "Could not determine user config directory".to_string(),
            }
        })?;

        Ok(Self::with_directories(
            dirs.config_dir().to_path_buf(),
            dirs.data_dir().to_path_buf(),
        ))
    }

    /// Creates a config manager keeping config and data in one directory
    pub fn with_directory(dir: PathBuf) -> ConfigResult<Self> {
        Ok(Self::with_directories(dir.clone(), dir))
    }

    fn with_directories(config_dir: PathBuf, data_dir: PathBuf) -> Self {
        let persistence = ConfigPersistence::new(config_dir.join("config.toml"));
        Self {
            persistence,
            config_dir,
            data_dir,
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Returns the full config file path
    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Resolves a configured path against the data directory
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }

    /// Absolute database location for `config`
    pub fn database_path(&self, config: &Config) -> PathBuf {
        self.resolve(&config.app.database_path)
    }

    /// Absolute cover art directory for `config`
    pub fn covers_dir(&self, config: &Config) -> PathBuf {
        self.resolve(&config.app.covers_dir)
    }

    /// Loads the configuration from file
    pub fn load(&self) -> ConfigResult<Config> {
        self.persistence.load()
    }

    /// Loads the configuration, falling back to defaults on any error
    pub fn load_or_default(&self) -> Config {
        match self.load() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config: {}, using defaults", e);
                Config::default()
            }
        }
    }

    /// Validates and saves the configuration
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.persistence.save(config)
    }

    /// Loads the config, applies `update_fn` and saves the result
    pub fn update<F>(&self, update_fn: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = self.load()?;
        update_fn(&mut config);
        self.save(&config)
    }

    /// Writes a default config file if none exists
    ///
    /// Returns Ok(true) if a new file was created.
    pub fn initialize(&self) -> ConfigResult<bool> {
        if self.config_path().exists() {
            log::info!(
                "Config file already exists at {}",
                self.config_path().display()
            );
            return Ok(false);
        }

        self.save(&Config::default())?;
        Ok(true)
    }

    /// Overwrites the config file with default values
    pub fn reset(&self) -> ConfigResult<()> {
        self.save(&Config::default())
    }

    /// Loads the config and applies `AUDII_SECTION_FIELD` environment overrides
    pub fn load_with_env_overrides(&self) -> ConfigResult<Config> {
        let mut config = self.load()?;
        apply_env_overrides(&mut config, |key| std::env::var(key).ok());

        if let Err(errors) = config.validate() {
            log::warn!(
                "Config validation warnings after env overrides: {:?}",
                errors
            );
        }

        Ok(config)
    }
}

fn apply_env_overrides<F>(config: &mut Config, var: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = var("AUDII_APP_DATABASE_PATH") {
        config.app.database_path = PathBuf::from(path);
    }

    if let Some(dir) = var("AUDII_APP_COVERS_DIR") {
        config.app.covers_dir = PathBuf::from(dir);
    }

    if let Some(level) = var("AUDII_APP_LOG_LEVEL") {
        match level.parse::<LogLevel>() {
            Ok(level) => config.app.log_level = level,
            Err(e) => log::warn!("Ignoring AUDII_APP_LOG_LEVEL: {}", e),
        }
    }

    if let Some(speed) = var("AUDII_PLAYER_DEFAULT_SPEED").and_then(|v| v.parse().ok()) {
        config.player.default_speed = speed;
    }

    if let Some(secs) = var("AUDII_PLAYER_PROGRESS_SAVE_INTERVAL_SECS").and_then(|v| v.parse().ok())
    {
        config.player.progress_save_interval_secs = secs;
    }

    if let Some(ms) = var("AUDII_PLAYER_POLL_INTERVAL_MS").and_then(|v| v.parse().ok()) {
        config.player.poll_interval_ms = ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn setup_test_manager() -> (TempDir, ConfigManager) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let manager = ConfigManager::with_directory(temp_dir.path().to_path_buf())
            .expect("Failed to create manager");
        (temp_dir, manager)
    }

    #[test]
    fn test_load_or_default_with_missing_file() {
        let (_temp_dir, manager) = setup_test_manager();
        assert_eq!(manager.load_or_default(), Config::default());
    }

    #[test]
    fn test_load_or_default_with_broken_file() {
        let (_temp_dir, manager) = setup_test_manager();
        std::fs::write(manager.config_path(), "[player\n").expect("Should write");
        assert_eq!(manager.load_or_default(), Config::default());
    }

    #[test]
    fn test_update() {
        let (_temp_dir, manager) = setup_test_manager();
        manager.save(&Config::default()).expect("Should save");

        manager
            .update(|config| config.player.default_speed = 1.5)
            .expect("Should update");

        let loaded = manager.load().expect("Should load");
        assert_eq!(loaded.player.default_speed, 1.5);
    }

    #[test]
    fn test_initialize_only_once() {
        let (_temp_dir, manager) = setup_test_manager();

        assert!(manager.initialize().expect("Should initialize"));
        assert!(manager.config_path().exists());
        assert!(!manager.initialize().expect("Should initialize"));
    }

    #[test]
    fn test_reset() {
        let (_temp_dir, manager) = setup_test_manager();

        let mut config = Config::default();
        config.player.skip_backward_secs = 45;
        manager.save(&config).expect("Should save");

        manager.reset().expect("Should reset");
        assert_eq!(manager.load().expect("Should load"), Config::default());
    }

    #[test]
    fn test_relative_paths_resolve_against_data_dir() {
        let (temp_dir, manager) = setup_test_manager();
        let config = Config::default();

        assert_eq!(
            manager.database_path(&config),
            temp_dir.path().join("audii.db")
        );
        assert_eq!(manager.covers_dir(&config), temp_dir.path().join("covers"));
        assert_eq!(
            manager.resolve(Path::new("/abs/library.db")),
            PathBuf::from("/abs/library.db")
        );
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("AUDII_PLAYER_DEFAULT_SPEED", "1.25"),
            ("AUDII_APP_LOG_LEVEL", "debug"),
            ("AUDII_APP_DATABASE_PATH", "/data/books.db"),
            ("AUDII_PLAYER_PROGRESS_SAVE_INTERVAL_SECS", "not-a-number"),
        ]);
        let mut config = Config::default();

        apply_env_overrides(&mut config, |key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.player.default_speed, 1.25);
        assert_eq!(config.app.log_level, LogLevel::Debug);
        assert_eq!(config.app.database_path, PathBuf::from("/data/books.db"));
        assert_eq!(config.player.progress_save_interval_secs, 90);
    }

    #[test]
    fn test_config_file_path() {
        let (_temp_dir, manager) = setup_test_manager();
        assert!(manager.config_path().ends_with("config.toml"));
    }
}
