//! File classification by extension and by content signature

use audii_config::LibraryConfig;
use std::collections::HashSet;
use std::path::Path;

/// What an entry found during import is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A chapter candidate
    Audio,
    /// A cover art candidate
    Image,
    Other,
}

/// Decides which files are chapters and which are cover art
#[derive(Debug, Clone)]
pub struct ContentClassifier {
    audio: HashSet<String>,
    image: HashSet<String>,
}

impl ContentClassifier {
    pub fn new<A, I>(audio: A, image: I) -> Self
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Self {
            audio: audio.into_iter().map(|e| normalize(e.as_ref())).collect(),
            image: image.into_iter().map(|e| normalize(e.as_ref())).collect(),
        }
    }

    pub fn from_config(config: &LibraryConfig) -> Self {
        Self::new(&config.audio_extensions, &config.image_extensions)
    }

    pub fn classify(&self, path: &Path) -> EntryKind {
        let Some(ext) = path.extension().and_then(|e| e.to_str()).map(normalize) else {
            return EntryKind::Other;
        };

        if self.audio.contains(&ext) {
            EntryKind::Audio
        } else if self.image.contains(&ext) {
            EntryKind::Image
        } else {
            EntryKind::Other
        }
    }

    pub fn is_audio(&self, path: &Path) -> bool {
        self.classify(path) == EntryKind::Audio
    }

    pub fn is_image(&self, path: &Path) -> bool {
        self.classify(path) == EntryKind::Image
    }
}

impl Default for ContentClassifier {
    fn default() -> Self {
        Self::from_config(&LibraryConfig::default())
    }
}

fn normalize(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

/// MIME type of an audio file, by extension
pub fn audio_mime_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "mp3" => Some("audio/mpeg"),
        "m4a" | "m4b" => Some("audio/mp4"),
        "aac" => Some("audio/aac"),
        "ogg" | "oga" => Some("audio/ogg"),
        "opus" => Some("audio/opus"),
        "flac" => Some("audio/flac"),
        "wav" => Some("audio/wav"),
        "wma" => Some("audio/x-ms-wma"),
        _ => None,
    }
}

/// File extension for an image, detected from its leading bytes
pub fn image_extension(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        Some("png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpg")
    } else if bytes.starts_with(b"GIF8") {
        Some("gif")
    } else if bytes.starts_with(b"BM") {
        Some("bmp")
    } else if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        Some("webp")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_is_case_insensitive() {
        let classifier = ContentClassifier::default();
        assert_eq!(classifier.classify(Path::new("a.MP3")), EntryKind::Audio);
        assert_eq!(classifier.classify(Path::new("b.m4b")), EntryKind::Audio);
        assert_eq!(classifier.classify(Path::new("cover.JPG")), EntryKind::Image);
        assert_eq!(classifier.classify(Path::new("notes.txt")), EntryKind::Other);
        assert_eq!(classifier.classify(Path::new("README")), EntryKind::Other);
    }

    #[test]
    fn test_custom_extensions() {
        let classifier = ContentClassifier::new([".AIFF"], Vec::<String>::new());
        assert!(classifier.is_audio(Path::new("track.aiff")));
        assert!(!classifier.is_audio(Path::new("track.mp3")));
        assert!(!classifier.is_image(Path::new("cover.png")));
    }

    #[test]
    fn test_audio_mime_type() {
        assert_eq!(audio_mime_type(Path::new("x.mp3")), Some("audio/mpeg"));
        assert_eq!(audio_mime_type(Path::new("x.M4B")), Some("audio/mp4"));
        assert_eq!(audio_mime_type(Path::new("x.doc")), None);
    }

    #[test]
    fn test_image_extension_from_signature() {
        assert_eq!(image_extension(&[0x89, b'P', b'N', b'G', 0x0D]), Some("png"));
        assert_eq!(image_extension(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("jpg"));
        assert_eq!(image_extension(b"GIF89a"), Some("gif"));
        assert_eq!(image_extension(b"RIFF\0\0\0\0WEBPVP8 "), Some("webp"));
        assert_eq!(image_extension(b"plain text"), None);
    }
}
