//! Cover art storage
//!
//! Imported covers are copied into a single directory under generated,
//! unique file names so the library never depends on the source folder
//! keeping its artwork.

use crate::content::image_extension;
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CoverStore {
    dir: PathBuf,
}

impl CoverStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Copies an image file into the store, keeping its extension
    pub fn copy_image(&self, source: &Path) -> Result<PathBuf> {
        let ext = source
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_else(|| "png".to_string());

        let target = self.next_path(&ext)?;
        fs::copy(source, &target)?;

        log::debug!("Copied cover {} to {}", source.display(), target.display());
        Ok(target)
    }

    /// Writes embedded artwork bytes into the store
    pub fn save_embedded(&self, bytes: &[u8]) -> Result<PathBuf> {
        let ext = image_extension(bytes).unwrap_or("png");
        let target = self.next_path(ext)?;
        fs::write(&target, bytes)?;

        log::debug!("Saved embedded cover to {}", target.display());
        Ok(target)
    }

    /// True when `path` is a file this store created
    pub fn owns(&self, path: &Path) -> bool {
        path.parent() == Some(self.dir.as_path())
    }

    /// Removes a stored cover. Paths outside the store are left alone.
    pub fn remove(&self, path: &Path) -> Result<bool> {
        if !self.owns(path) || !path.exists() {
            return Ok(false);
        }

        fs::remove_file(path)?;
        Ok(true)
    }

    fn next_path(&self, ext: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        Ok(self
            .dir
            .join(format!("{}.{}", Uuid::new_v4().simple(), ext)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];

    #[test]
    fn test_copy_image_generates_unique_names() {
        let source_dir = TempDir::new().unwrap();
        let covers_dir = TempDir::new().unwrap();
        let source = source_dir.path().join("Cover.JPG");
        fs::write(&source, [0xFF, 0xD8, 0xFF, 0xE0]).unwrap();

        let store = CoverStore::new(covers_dir.path().join("covers"));
        let first = store.copy_image(&source).unwrap();
        let second = store.copy_image(&source).unwrap();

        assert_ne!(first, second);
        assert!(first.exists());
        assert_eq!(first.extension().unwrap(), "jpg");
        assert!(store.owns(&first));
    }

    #[test]
    fn test_save_embedded_detects_format() {
        let dir = TempDir::new().unwrap();
        let store = CoverStore::new(dir.path());

        let png = store.save_embedded(PNG_BYTES).unwrap();
        assert_eq!(png.extension().unwrap(), "png");
        assert_eq!(fs::read(&png).unwrap(), PNG_BYTES);

        let unknown = store.save_embedded(b"????").unwrap();
        assert_eq!(unknown.extension().unwrap(), "png");
    }

    #[test]
    fn test_remove_only_touches_owned_files() {
        let dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let store = CoverStore::new(dir.path().join("covers"));

        let stored = store.save_embedded(PNG_BYTES).unwrap();
        let foreign = outside.path().join("cover.png");
        fs::write(&foreign, PNG_BYTES).unwrap();

        assert!(store.remove(&stored).unwrap());
        assert!(!stored.exists());
        assert!(!store.remove(&foreign).unwrap());
        assert!(foreign.exists());
    }
}
