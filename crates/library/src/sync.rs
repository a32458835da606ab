//! Datasource re-scan
//!
//! A datasource is a folder imported with "one book per child". Re-scanning
//! lists its direct children again and reports the ones the library does not
//! know yet. Folders that disappeared, or were replaced by a file, are stale.

use crate::parser::AudiobookParser;
use audii_core::{is_known, Datasource, DatasourceId};
use std::path::{Path, PathBuf};

/// A child of a datasource folder with no matching audiobook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredEntry {
    pub location: String,
    pub path: PathBuf,
    pub datasource_id: DatasourceId,
}

impl DiscoveredEntry {
    pub fn is_folder(&self) -> bool {
        self.path.is_dir()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub discovered: Vec<DiscoveredEntry>,
    pub stale: Vec<DatasourceId>,
}

impl SyncReport {
    pub fn is_empty(&self) -> bool {
        self.discovered.is_empty() && self.stale.is_empty()
    }
}

/// Entries of `listing` that match none of `existing`
pub fn new_entries(listing: &[String], existing: &[String]) -> Vec<String> {
    listing
        .iter()
        .filter(|entry| !is_known(entry, existing))
        .cloned()
        .collect()
}

#[derive(Debug, Clone)]
pub struct DatasourceSync {
    parser: AudiobookParser,
}

impl DatasourceSync {
    pub fn new(parser: AudiobookParser) -> Self {
        Self { parser }
    }

    /// Sub-folders and audio files directly inside `dir`
    pub fn listing(&self, dir: &Path) -> Vec<PathBuf> {
        self.parser
            .entries(dir)
            .into_iter()
            .map(|entry| entry.into_path())
            .filter(|path| path.is_dir() || self.parser.classifier().is_audio(path))
            .collect()
    }

    /// Compares every datasource folder against the known audiobook locations
    pub fn scan(&self, datasources: &[Datasource], existing: &[String]) -> SyncReport {
        let mut report = SyncReport::default();
        let mut known = existing.to_vec();

        for datasource in datasources {
            let root = Path::new(&datasource.location);
            if !root.is_dir() {
                log::info!(
                    "Datasource {} is gone or no longer a folder",
                    datasource.location
                );
                report.stale.push(datasource.id.clone());
                continue;
            }

            let listing = self.listing(root);
            let locations: Vec<String> = listing
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect();
            let fresh = new_entries(&locations, &known);

            for (path, location) in listing.into_iter().zip(locations) {
                if !fresh.contains(&location) {
                    continue;
                }
                known.push(location.clone());
                report.discovered.push(DiscoveredEntry {
                    location,
                    path,
                    datasource_id: datasource.id.clone(),
                });
            }
        }

        log::debug!(
            "Datasource scan: {} new entries, {} stale datasources",
            report.discovered.len(),
            report.stale.len()
        );
        report
    }
}
