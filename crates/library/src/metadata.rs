use crate::error::{LibraryError, Result};
use lofty::picture::PictureType;
use lofty::prelude::*;
use lofty::probe::Probe;
use std::fs::File;
use std::path::Path;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Tag values and properties read from one audio file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album_artist: Option<String>,
    pub duration_ms: u64,
    /// Embedded artwork, front cover preferred
    pub picture: Option<Vec<u8>>,
}

/// Reads tags and durations from audio files
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataExtractor;

impl MetadataExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Reads tags and duration, failing when the file cannot be parsed
    pub fn read(&self, path: &Path) -> Result<TrackMetadata> {
        if !path.exists() {
            return Err(LibraryError::FileNotFound(path.display().to_string()));
        }

        let tagged_file = Probe::open(path)
            .and_then(|probe| probe.read())
            .map_err(|e| LibraryError::MetadataError(format!("{}: {}", path.display(), e)))?;

        let mut metadata = TrackMetadata {
            duration_ms: tagged_file.properties().duration().as_millis() as u64,
            ..Default::default()
        };

        if let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) {
            metadata.title = non_blank(tag.title().map(|s| s.to_string()));
            metadata.artist = non_blank(tag.artist().map(|s| s.to_string()));
            metadata.album_artist =
                non_blank(tag.get_string(&ItemKey::AlbumArtist).map(|s| s.to_string()));

            let pictures = tag.pictures();
            metadata.picture = pictures
                .iter()
                .find(|p| p.pic_type() == PictureType::CoverFront)
                .or_else(|| pictures.first())
                .map(|p| p.data().to_vec());
        }

        if metadata.duration_ms == 0 {
            metadata.duration_ms = probe_duration_ms(path).unwrap_or(0);
        }

        Ok(metadata)
    }

    /// Reads metadata, falling back to empty tags and zero duration
    pub fn read_or_default(&self, path: &Path) -> TrackMetadata {
        match self.read(path) {
            Ok(metadata) => metadata,
            Err(e) => {
                log::warn!("Metadata unavailable, using defaults: {}", e);
                TrackMetadata {
                    duration_ms: probe_duration_ms(path).unwrap_or(0),
                    ..Default::default()
                }
            }
        }
    }

    /// Duration of one file in milliseconds, zero when it cannot be determined
    pub fn duration_ms(&self, path: &Path) -> u64 {
        self.read_or_default(path).duration_ms
    }
}

/// Asks the decoder for the stream length when the tag reader could not
fn probe_duration_ms(path: &Path) -> Option<u64> {
    let file = File::open(path).ok()?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .ok()?;

    let track = probed.format.default_track()?;
    let frames = track.codec_params.n_frames?;
    let rate = track.codec_params.sample_rate?;
    if rate == 0 {
        return None;
    }

    Some(frames * 1000 / u64::from(rate))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_missing_file() {
        let result = MetadataExtractor::new().read(Path::new("/nonexistent/chapter.mp3"));
        assert!(matches!(result, Err(LibraryError::FileNotFound(_))));
    }

    #[test]
    fn test_garbage_falls_back_to_defaults() {
        let mut file = NamedTempFile::with_suffix(".mp3").unwrap();
        file.write_all(b"This is not an audio file").unwrap();
        file.flush().unwrap();

        let extractor = MetadataExtractor::new();
        let metadata = extractor.read_or_default(file.path());

        assert_eq!(metadata, TrackMetadata::default());
        assert_eq!(extractor.duration_ms(file.path()), 0);
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  ".to_string())), None);
        assert_eq!(non_blank(Some(" Le Guin ".to_string())), Some("Le Guin".to_string()));
        assert_eq!(non_blank(None), None);
    }
}
