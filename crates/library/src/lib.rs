//! Audii library management
//!
//! Import pipeline, datasource re-sync and the observable repositories that
//! sit between the database and the UI-facing state holders.
//!
//! Filesystem work (walking folders, reading tags, copying covers) is
//! synchronous and runs on the blocking pool when called through
//! [`LibraryManager`].

pub mod content;
pub mod covers;
pub mod error;
pub mod import;
pub mod manager;
pub mod metadata;
pub mod parser;
pub mod repository;
pub mod sync;

pub use content::{ContentClassifier, EntryKind};
pub use covers::CoverStore;
pub use error::{LibraryError, LibraryResult};
pub use import::BookImporter;
pub use manager::{ImportSummary, LibraryManager, LibraryOptions, LibraryStats, SyncSummary};
pub use metadata::{MetadataExtractor, TrackMetadata};
pub use parser::{AudiobookParser, ChapterFile};
pub use repository::{AudiobookRepository, CollectionRepository, DatasourceRepository};
pub use sync::{new_entries, DatasourceSync, DiscoveredEntry, SyncReport};
