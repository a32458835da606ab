//! Turns a file or folder into an audiobook record

use crate::content::{ContentClassifier, EntryKind};
use crate::covers::CoverStore;
use crate::metadata::MetadataExtractor;
use audii_core::AudiobookData;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

const UNKNOWN: &str = "Unknown";

/// One playable file of an audiobook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterFile {
    pub path: PathBuf,
    pub title: String,
    pub duration_ms: u64,
}

/// Builds [`AudiobookData`] from a single audio file or a folder of chapters
#[derive(Debug, Clone)]
pub struct AudiobookParser {
    classifier: ContentClassifier,
    covers: CoverStore,
    extractor: MetadataExtractor,
    follow_symlinks: bool,
}

impl AudiobookParser {
    pub fn new(classifier: ContentClassifier, covers: CoverStore) -> Self {
        Self {
            classifier,
            covers,
            extractor: MetadataExtractor::new(),
            follow_symlinks: false,
        }
    }

    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    pub fn classifier(&self) -> &ContentClassifier {
        &self.classifier
    }

    pub fn covers(&self) -> &CoverStore {
        &self.covers
    }

    /// Parses `location`, returning `None` when it holds no audio
    pub fn parse(&self, location: &Path) -> Option<AudiobookData> {
        let chapters = self.chapter_paths(location);
        let first = chapters.first()?;

        let title = book_title(location)?;
        let first_meta = self.extractor.read_or_default(first);

        let mut durations = Vec::with_capacity(chapters.len());
        durations.push(first_meta.duration_ms);
        durations.extend(chapters[1..].iter().map(|p| self.extractor.duration_ms(p)));

        let cover_path = self
            .find_cover(location, first_meta.picture.as_deref())
            .map(|p| p.to_string_lossy().into_owned());

        log::debug!(
            "Parsed {} with {} chapter(s) from {}",
            title,
            chapters.len(),
            location.display()
        );

        Some(AudiobookData {
            title,
            author: first_meta.artist.unwrap_or_else(|| UNKNOWN.to_string()),
            narrator: first_meta.album_artist.unwrap_or_else(|| UNKNOWN.to_string()),
            location: location.to_string_lossy().into_owned(),
            durations,
            cover_path,
        })
    }

    /// Audio files making up the book at `location`, in playback order
    pub fn chapter_paths(&self, location: &Path) -> Vec<PathBuf> {
        if location.is_dir() {
            self.entries(location)
                .into_iter()
                .filter(|e| e.file_type().is_file() || e.path().is_file())
                .map(DirEntry::into_path)
                .filter(|p| self.classifier.is_audio(p))
                .collect()
        } else if location.is_file() && self.classifier.is_audio(location) {
            vec![location.to_path_buf()]
        } else {
            Vec::new()
        }
    }

    /// Chapter titles and durations for playback
    pub fn chapters(&self, location: &Path) -> Vec<ChapterFile> {
        self.chapter_paths(location)
            .into_iter()
            .map(|path| {
                let meta = self.extractor.read_or_default(&path);
                let title = meta.title.unwrap_or_else(|| file_stem(&path));
                ChapterFile {
                    title,
                    duration_ms: meta.duration_ms,
                    path,
                }
            })
            .collect()
    }

    /// Direct children of `dir`, sorted by file name
    pub(crate) fn entries(&self, dir: &Path) -> Vec<DirEntry> {
        WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(self.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                    None
                }
            })
            .collect()
    }

    fn find_cover(&self, location: &Path, embedded: Option<&[u8]>) -> Option<PathBuf> {
        if location.is_dir() {
            let image = self
                .entries(location)
                .into_iter()
                .map(DirEntry::into_path)
                .find(|p| self.classifier.classify(p) == EntryKind::Image);

            if let Some(image) = image {
                match self.covers.copy_image(&image) {
                    Ok(stored) => return Some(stored),
                    Err(e) => log::warn!("Failed to copy cover {}: {}", image.display(), e),
                }
            }
        }

        let bytes = embedded?;
        match self.covers.save_embedded(bytes) {
            Ok(stored) => Some(stored),
            Err(e) => {
                log::warn!("Failed to store embedded cover: {}", e);
                None
            }
        }
    }
}

fn book_title(location: &Path) -> Option<String> {
    if location.is_dir() {
        location
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
    } else {
        Some(file_stem(location))
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn parser(covers: &Path) -> AudiobookParser {
        AudiobookParser::new(ContentClassifier::default(), CoverStore::new(covers))
    }

    #[test]
    fn test_folder_chapters_sorted_by_name() {
        let dir = TempDir::new().unwrap();
        let book = dir.path().join("Dune");
        fs::create_dir(&book).unwrap();
        for name in ["02.mp3", "01.mp3", "notes.txt", "03.m4b"] {
            fs::write(book.join(name), b"x").unwrap();
        }

        let parser = parser(&dir.path().join("covers"));
        let names: Vec<String> = parser
            .chapter_paths(&book)
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["01.mp3", "02.mp3", "03.m4b"]);
    }

    #[test]
    fn test_parse_folder_uses_defaults_for_unreadable_audio() {
        let dir = TempDir::new().unwrap();
        let book = dir.path().join("Dune");
        fs::create_dir(&book).unwrap();
        fs::write(book.join("01.mp3"), b"not audio").unwrap();
        fs::write(book.join("02.mp3"), b"not audio").unwrap();

        let data = parser(&dir.path().join("covers")).parse(&book).unwrap();

        assert_eq!(data.title, "Dune");
        assert_eq!(data.author, "Unknown");
        assert_eq!(data.narrator, "Unknown");
        assert_eq!(data.durations, vec![0, 0]);
        assert_eq!(data.location, book.to_string_lossy());
        assert!(data.cover_path.is_none());
    }

    #[test]
    fn test_parse_file_title_is_stem() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("Project Hail Mary.m4b");
        fs::write(&file, b"not audio").unwrap();

        let data = parser(&dir.path().join("covers")).parse(&file).unwrap();

        assert_eq!(data.title, "Project Hail Mary");
        assert_eq!(data.durations.len(), 1);
    }

    #[test]
    fn test_parse_without_audio_is_none() {
        let dir = TempDir::new().unwrap();
        let empty = dir.path().join("empty");
        fs::create_dir(&empty).unwrap();
        fs::write(empty.join("cover.jpg"), b"x").unwrap();
        let text = dir.path().join("readme.txt");
        fs::write(&text, b"x").unwrap();

        let parser = parser(&dir.path().join("covers"));
        assert!(parser.parse(&empty).is_none());
        assert!(parser.parse(&text).is_none());
        assert!(parser.parse(&dir.path().join("missing")).is_none());
    }

    #[test]
    fn test_folder_image_becomes_cover() {
        let dir = TempDir::new().unwrap();
        let book = dir.path().join("Dune");
        fs::create_dir(&book).unwrap();
        fs::write(book.join("01.mp3"), b"x").unwrap();
        fs::write(book.join("folder.jpg"), [0xFF, 0xD8, 0xFF, 0xE0]).unwrap();

        let covers = dir.path().join("covers");
        let data = parser(&covers).parse(&book).unwrap();

        let cover = PathBuf::from(data.cover_path.unwrap());
        assert_eq!(cover.parent().unwrap(), covers);
        assert_eq!(cover.extension().unwrap(), "jpg");
        assert!(cover.exists());
    }

    #[test]
    fn test_chapter_titles_fall_back_to_file_stem() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Chapter One.mp3"), b"x").unwrap();

        let chapters = parser(&dir.path().join("covers")).chapters(dir.path());

        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, "Chapter One");
        assert_eq!(chapters[0].duration_ms, 0);
    }
}
