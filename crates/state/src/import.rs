use crate::error::StateError;
use audii_library::LibraryManager;
use std::path::Path;
use tokio::sync::watch;

/// Progress of the last import started from the import screen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ImportStatus {
    #[default]
    Idle,
    Loading,
    /// Titles of the books that were added
    Success(Vec<String>),
    Error(String),
}

impl ImportStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, ImportStatus::Loading)
    }
}

/// How the chosen path should be imported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    File,
    FolderAsBook,
    FolderAsBooks,
}

pub struct ImportModel {
    library: LibraryManager,
    status: watch::Sender<ImportStatus>,
}

impl ImportModel {
    pub fn new(library: LibraryManager) -> Self {
        let (status, _) = watch::channel(ImportStatus::Idle);
        Self { library, status }
    }

    pub fn subscribe(&self) -> watch::Receiver<ImportStatus> {
        self.status.subscribe()
    }

    pub fn status(&self) -> ImportStatus {
        self.status.borrow().clone()
    }

    /// Runs one import and leaves the outcome in the status
    pub async fn import(&self, kind: ImportKind, path: impl AsRef<Path>) -> ImportStatus {
        let path = path.as_ref();
        self.status.send_replace(ImportStatus::Loading);

        let result: Result<Vec<String>, String> = match kind {
            ImportKind::File => self
                .library
                .import_file(path)
                .await
                .map(|book| vec![book.title])
                .map_err(|e| StateError::from(e).user_message()),
            ImportKind::FolderAsBook => self
                .library
                .import_folder_as_book(path)
                .await
                .map(|book| vec![book.title])
                .map_err(|e| StateError::from(e).user_message()),
            ImportKind::FolderAsBooks => match self.library.import_folder_as_books(path).await {
                // Nothing new means every child was a duplicate
                Ok(summary) if summary.added.is_empty() => match summary.duplicate_message() {
                    Some(message) => Err(message),
                    None => Ok(Vec::new()),
                },
                Ok(summary) => Ok(summary.added.into_iter().map(|b| b.title).collect()),
                Err(e) => Err(StateError::from(e).user_message()),
            },
        };

        let status = match result {
            Ok(titles) => {
                log::info!("Imported {} audiobook(s) from {}", titles.len(), path.display());
                ImportStatus::Success(titles)
            }
            Err(message) => {
                log::warn!("Import of {} failed: {}", path.display(), message);
                ImportStatus::Error(message)
            }
        };

        self.status.send_replace(status.clone());
        status
    }

    /// Back to idle once the result has been shown
    pub fn reset(&self) {
        self.status.send_replace(ImportStatus::Idle);
    }
}
