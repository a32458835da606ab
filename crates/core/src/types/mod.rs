//! Domain types for Audii
//!
//! - `audiobook`: Audiobook records and the import data-transfer record
//! - `position`: Chapter positions and timeline math
//! - `collection`: User-defined groupings
//! - `datasource`: Folders tracked for re-sync
//! - `playback`: Speed and chapter descriptions
//! - `common`: Shared traits and utilities

mod audiobook;
mod collection;
mod common;
mod datasource;
mod playback;
mod position;

pub use audiobook::{Audiobook, AudiobookData, AudiobookId, SkipTimings};
pub use collection::{Collection, CollectionId};
pub use common::{Duration, Timestamp, Validator};
pub use datasource::{Datasource, DatasourceId};
pub use playback::{Chapter, PlaybackSpeed};
pub use position::{skip_backward, skip_forward, Position, SkipOutcome, Timeline, COMPLETION_THRESHOLD};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_types_are_exported() {
        let _audiobook_id: AudiobookId = AudiobookId::new();
        let _datasource_id: DatasourceId = DatasourceId::new();
        let _position: Position = Position::START;
        let _timings: SkipTimings = SkipTimings::default();
    }

    #[test]
    fn test_duration_formatting() {
        let d = Duration::from_seconds(3665);
        assert!(d.to_string().contains("1:01:05"));
    }
}
