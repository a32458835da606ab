//! Library and import configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};

/// Import settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LibraryConfig {
    /// File extensions treated as chapters
    pub audio_extensions: Vec<String>,

    /// File extensions treated as cover art when found next to chapters
    pub image_extensions: Vec<String>,

    /// Follow symbolic links when listing folders
    pub follow_symlinks: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            audio_extensions: ["mp3", "m4a", "m4b", "aac", "ogg", "oga", "opus", "flac", "wav", "wma"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            image_extensions: ["jpg", "jpeg", "png", "webp", "bmp", "gif"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            follow_symlinks: false,
        }
    }
}

impl ConfigSection for LibraryConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut results = Validator::non_empty_list(&self.audio_extensions, "library.audio_extensions");

        for (i, ext) in self.image_extensions.iter().enumerate() {
            results.push(Validator::not_empty(
                ext,
                &format!("library.image_extensions[{}]", i),
            ));
        }

        Validator::collect_errors(results)
    }

    fn merge(&mut self, other: Self) {
        self.audio_extensions = other.audio_extensions;
        self.image_extensions = other.image_extensions;
        self.follow_symlinks = other.follow_symlinks;
    }

    fn section_name(&self) -> &'static str {
        "library"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = LibraryConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.audio_extensions.contains(&"m4b".to_string()));
    }

    #[test]
    fn test_empty_audio_extensions() {
        let config = LibraryConfig {
            audio_extensions: Vec::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_image_extension() {
        let config = LibraryConfig {
            image_extensions: vec!["png".to_string(), "".to_string()],
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors[0].field, "library.image_extensions[1]");
    }

    #[test]
    fn test_image_extensions_may_be_empty() {
        let config = LibraryConfig {
            image_extensions: Vec::new(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
