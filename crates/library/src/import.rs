use crate::error::Result;
use crate::parser::AudiobookParser;
use audii_core::{AppError, AudiobookData};
use std::path::Path;

/// Book importer
///
/// Parsing only; persisting the results is the caller's job. Every method
/// does blocking filesystem work.
#[derive(Debug, Clone)]
pub struct BookImporter {
    parser: AudiobookParser,
}

impl BookImporter {
    pub fn new(parser: AudiobookParser) -> Self {
        Self { parser }
    }

    pub fn parser(&self) -> &AudiobookParser {
        &self.parser
    }

    /// One single-chapter book from an audio file
    pub fn import_file(&self, path: &Path) -> Result<AudiobookData> {
        self.parse_or_fail(path)
    }

    /// One book whose chapters are the audio files in `path`
    pub fn import_folder_as_book(&self, path: &Path) -> Result<AudiobookData> {
        self.parse_or_fail(path)
    }

    /// One book per child of `path`, each child being a file or a folder
    pub fn import_folder_as_books(&self, path: &Path) -> Result<Vec<AudiobookData>> {
        let location = path.to_string_lossy().into_owned();

        if !path.is_dir() {
            return Err(AppError::NotAFolder { location }.into());
        }

        let entries = self.parser.entries(path);
        if entries.is_empty() {
            return Err(AppError::EmptyFolder { location }.into());
        }

        let books: Vec<AudiobookData> = entries
            .iter()
            .filter_map(|entry| self.parser.parse(entry.path()))
            .collect();

        if books.is_empty() {
            return Err(AppError::NoAudioFiles { location }.into());
        }

        log::info!("Found {} audiobook(s) in {}", books.len(), path.display());
        Ok(books)
    }

    fn parse_or_fail(&self, path: &Path) -> Result<AudiobookData> {
        self.parser.parse(path).ok_or_else(|| {
            AppError::NoAudioFiles {
                location: path.to_string_lossy().into_owned(),
            }
            .into()
        })
    }
}
