use crate::error::StateError;
use audii_core::{Collection, CollectionId};
use audii_library::LibraryManager;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionState {
    pub collections: Vec<Collection>,
    pub error_message: Option<String>,
}

/// Holds the collection list for pickers and the collection screen
pub struct CollectionModel {
    library: LibraryManager,
    state: Arc<watch::Sender<CollectionState>>,
    forwarder: JoinHandle<()>,
}

impl CollectionModel {
    /// Must be called inside a tokio runtime
    pub fn new(library: LibraryManager) -> Self {
        let mut upstream = library.collections().subscribe();
        let (tx, _) = watch::channel(CollectionState {
            collections: upstream.borrow_and_update().clone(),
            error_message: None,
        });
        let state = Arc::new(tx);

        let forward_to = Arc::clone(&state);
        let forwarder = tokio::spawn(async move {
            while upstream.changed().await.is_ok() {
                let list = upstream.borrow_and_update().clone();
                forward_to.send_modify(|state| state.collections = list);
            }
        });

        Self {
            library,
            state,
            forwarder,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<CollectionState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> CollectionState {
        self.state.borrow().clone()
    }

    /// Creates a collection. Blank and duplicate names are rejected.
    pub async fn add(&self, name: &str) -> Option<Collection> {
        match self.library.create_collection(name).await {
            Ok(collection) => Some(collection),
            Err(e) => {
                self.fail(e.into());
                None
            }
        }
    }

    /// Deletes a collection and removes it from every book
    pub async fn delete(&self, id: CollectionId) -> bool {
        match self.library.delete_collection(id).await {
            Ok(()) => true,
            Err(e) => {
                self.fail(e.into());
                false
            }
        }
    }

    pub fn clear_error(&self) {
        self.state
            .send_if_modified(|state| state.error_message.take().is_some());
    }

    fn fail(&self, error: StateError) {
        log::warn!("Collection operation failed: {}", error);
        let message = error.user_message();
        self.state
            .send_modify(|state| state.error_message = Some(message));
    }
}

impl Drop for CollectionModel {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}
