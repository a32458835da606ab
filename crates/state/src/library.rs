//! Library state holder
//!
//! Mirrors the three repositories into one [`LibraryState`] and runs library
//! operations, keeping the last failure in `error_message`.

use crate::error::{StateError, StateResult};
use audii_core::{Audiobook, AudiobookId, Collection, CollectionId, Datasource};
use audii_library::{LibraryManager, SyncSummary};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Books shown on the "continue listening" shelf
pub const CONTINUE_LISTENING_LIMIT: usize = 2;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibraryState {
    /// Every stored book, most recently modified first
    pub audiobooks: Vec<Audiobook>,
    pub collections: Vec<Collection>,
    pub datasources: Vec<Datasource>,
    pub search: String,
    pub selected_collection: Option<CollectionId>,
    pub is_loading: bool,
    pub error_message: Option<String>,
}

impl LibraryState {
    /// Books passing the search text and the selected collection
    pub fn visible(&self) -> Vec<&Audiobook> {
        self.audiobooks
            .iter()
            .filter(|book| {
                self.selected_collection
                    .is_none_or(|id| book.is_in_collection(id))
            })
            .filter(|book| book.matches_search(&self.search))
            .collect()
    }

    /// Started books, most recent first
    pub fn continue_listening(&self) -> Vec<&Audiobook> {
        self.audiobooks
            .iter()
            .filter(|book| book.is_started())
            .take(CONTINUE_LISTENING_LIMIT)
            .collect()
    }

    pub fn find(&self, id: &AudiobookId) -> Option<&Audiobook> {
        self.audiobooks.iter().find(|book| &book.id == id)
    }
}

pub struct LibraryModel {
    library: LibraryManager,
    state: Arc<watch::Sender<LibraryState>>,
    forwarder: JoinHandle<()>,
}

impl LibraryModel {
    /// Must be called inside a tokio runtime
    pub fn new(library: LibraryManager) -> Self {
        let books = library.audiobooks().subscribe();
        let collections = library.collections().subscribe();
        let datasources = library.datasources().subscribe();

        let (tx, _) = watch::channel(LibraryState {
            audiobooks: books.borrow().clone(),
            collections: collections.borrow().clone(),
            datasources: datasources.borrow().clone(),
            ..LibraryState::default()
        });
        let state = Arc::new(tx);

        let forwarder = tokio::spawn(forward(
            books,
            collections,
            datasources,
            Arc::clone(&state),
        ));

        Self {
            library,
            state,
            forwarder,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<LibraryState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> LibraryState {
        self.state.borrow().clone()
    }

    pub fn library(&self) -> &LibraryManager {
        &self.library
    }

    pub fn set_search(&self, query: impl Into<String>) {
        let query = query.into();
        self.state.send_modify(|state| state.search = query);
    }

    pub fn select_collection(&self, id: Option<CollectionId>) {
        self.state
            .send_modify(|state| state.selected_collection = id);
    }

    pub fn clear_error(&self) {
        self.state.send_if_modified(|state| state.error_message.take().is_some());
    }

    // ===== Import =====

    pub async fn add_file(&self, path: impl AsRef<Path>) -> Option<Audiobook> {
        let path = path.as_ref();
        self.loading(self.library.import_file(path)).await
    }

    pub async fn add_folder_as_book(&self, path: impl AsRef<Path>) -> Option<Audiobook> {
        let path = path.as_ref();
        self.loading(self.library.import_folder_as_book(path)).await
    }

    /// Imports each child of `path` as a book. Duplicates are skipped.
    pub async fn add_folder_as_books(&self, path: impl AsRef<Path>) -> Vec<Audiobook> {
        let path = path.as_ref();
        let Some(summary) = self.loading(self.library.import_folder_as_books(path)).await else {
            return Vec::new();
        };
        if let Some(message) = summary.duplicate_message() {
            self.state
                .send_modify(|state| state.error_message = Some(message));
        }
        summary.added
    }

    pub async fn sync_datasources(&self) -> Option<SyncSummary> {
        self.loading(self.library.sync_datasources()).await
    }

    // ===== Book updates =====

    pub async fn delete(&self, id: &AudiobookId) -> bool {
        self.run(self.library.delete_audiobook(id)).await.is_some()
    }

    pub async fn update_speed(&self, id: &AudiobookId, speed: f32) -> bool {
        self.run(self.library.update_speed(id, speed)).await.is_some()
    }

    pub async fn mark_completed(&self, id: &AudiobookId) -> bool {
        self.run(self.library.mark_completed(id)).await.is_some()
    }

    pub async fn restart(&self, id: &AudiobookId) -> bool {
        self.run(self.library.restart(id)).await.is_some()
    }

    pub async fn add_to_collection(&self, id: &AudiobookId, collection: CollectionId) -> bool {
        self.run(self.library.add_to_collection(id, collection))
            .await
            .is_some()
    }

    pub async fn remove_from_collection(
        &self,
        id: &AudiobookId,
        collection: CollectionId,
    ) -> bool {
        self.run(self.library.remove_from_collection(id, collection))
            .await
            .is_some()
    }

    pub async fn set_collections(&self, id: &AudiobookId, collections: Vec<CollectionId>) -> bool {
        self.run(self.library.set_collections(id, collections))
            .await
            .is_some()
    }

    async fn loading<T, E>(&self, operation: impl Future<Output = Result<T, E>>) -> Option<T>
    where
        StateError: From<E>,
    {
        self.state.send_modify(|state| state.is_loading = true);
        let result = self.run(operation).await;
        self.state.send_modify(|state| state.is_loading = false);
        result
    }

    async fn run<T, E>(&self, operation: impl Future<Output = Result<T, E>>) -> Option<T>
    where
        StateError: From<E>,
    {
        let result: StateResult<T> = operation.await.map_err(StateError::from);
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Library operation failed: {}", e);
                let message = e.user_message();
                self.state
                    .send_modify(|state| state.error_message = Some(message));
                None
            }
        }
    }
}

impl Drop for LibraryModel {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}

async fn forward(
    mut books: watch::Receiver<Vec<Audiobook>>,
    mut collections: watch::Receiver<Vec<Collection>>,
    mut datasources: watch::Receiver<Vec<Datasource>>,
    state: Arc<watch::Sender<LibraryState>>,
) {
    loop {
        tokio::select! {
            changed = books.changed() => {
                if changed.is_err() {
                    break;
                }
                let list = books.borrow_and_update().clone();
                state.send_modify(|state| state.audiobooks = list);
            }
            changed = collections.changed() => {
                if changed.is_err() {
                    break;
                }
                let list = collections.borrow_and_update().clone();
                state.send_modify(|state| {
                    if let Some(id) = state.selected_collection {
                        if !list.iter().any(|c| c.id == id) {
                            state.selected_collection = None;
                        }
                    }
                    state.collections = list;
                });
            }
            changed = datasources.changed() => {
                if changed.is_err() {
                    break;
                }
                let list = datasources.borrow_and_update().clone();
                state.send_modify(|state| state.datasources = list);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audii_core::{AudiobookData, Position};

    fn book(title: &str, author: &str) -> Audiobook {
        Audiobook::from_data(
            AudiobookData {
                title: title.to_string(),
                author: author.to_string(),
                narrator: "Unknown".to_string(),
                location: format!("/books/{}", title),
                durations: vec![60_000, 60_000],
                cover_path: None,
            },
            None,
        )
    }

    #[test]
    fn test_visible_applies_search_and_collection() {
        let mut dune = book("Dune", "Frank Herbert");
        dune.add_to_collection(CollectionId::new(1));
        let emma = book("Emma", "Jane Austen");

        let mut state = LibraryState {
            audiobooks: vec![dune, emma],
            ..LibraryState::default()
        };
        assert_eq!(state.visible().len(), 2);

        state.search = "austen".to_string();
        let titles: Vec<_> = state.visible().iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Emma"]);

        state.search.clear();
        state.selected_collection = Some(CollectionId::new(1));
        let titles: Vec<_> = state.visible().iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Dune"]);
    }

    #[test]
    fn test_continue_listening_keeps_two_started_books() {
        let mut books = vec![
            book("A", "x"),
            book("B", "x"),
            book("C", "x"),
            book("D", "x"),
        ];
        for b in books.iter_mut().skip(1) {
            b.position = Position::new(0, 5_000);
        }

        let state = LibraryState {
            audiobooks: books,
            ..LibraryState::default()
        };
        let titles: Vec<_> = state
            .continue_listening()
            .iter()
            .map(|b| b.title.as_str())
            .collect();
        assert_eq!(titles, vec!["B", "C"]);
    }
}
