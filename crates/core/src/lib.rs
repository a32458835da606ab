//! Domain model for the Audii audiobook player.
//!
//! Everything here is synchronous and free of I/O: audiobook records, the
//! chapter timeline math, locator comparison and the shared error type.

pub mod error;
pub mod locator;
pub mod types;

pub use error::{AppError, ErrorSeverity, Result};
pub use locator::{is_known, last_segment, same_location};
pub use types::{
    skip_backward, skip_forward, Audiobook, AudiobookData, AudiobookId, Chapter, Collection,
    CollectionId, Datasource, DatasourceId, Duration, PlaybackSpeed, Position, SkipOutcome,
    SkipTimings, Timeline, Timestamp, Validator, COMPLETION_THRESHOLD,
};
