//! Player state holder
//!
//! Wraps the [`PlayerController`] for the UI. Opening a book resolves its
//! chapter files first, speed changes are written back to the book, and the
//! position is saved by a [`ProgressSaver`] plus whenever playback stops.

use crate::error::{StateError, StateResult};
use crate::progress::ProgressSaver;
use audii_core::{AppError, Audiobook, AudiobookId, Chapter, Position};
use audii_library::LibraryManager;
use media_engine::{ControllerState, MediaItem, PlayerController};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub audiobook: Option<Audiobook>,
    pub position: Position,
    pub chapters: Vec<Chapter>,
    pub current_duration_ms: u64,
    pub current_chapter: usize,
    pub total_chapters: usize,
    pub is_loading: bool,
    pub is_playing: bool,
    pub speed: f32,
    pub error_message: Option<String>,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::from_controller(&ControllerState::default())
    }
}

impl PlayerState {
    fn from_controller(controller: &ControllerState) -> Self {
        Self {
            audiobook: controller.audiobook.clone(),
            position: controller.position,
            chapters: controller.chapters.clone(),
            current_duration_ms: controller.current_duration_ms,
            current_chapter: controller.current_chapter,
            total_chapters: controller.total_chapters,
            is_loading: controller.is_loading,
            is_playing: controller.is_playing,
            speed: controller.speed,
            error_message: None,
        }
    }

    /// Takes every controller field, keeping the error message
    fn merge(&mut self, controller: &ControllerState) {
        let error_message = self.error_message.take();
        *self = Self::from_controller(controller);
        self.error_message = error_message;
    }

    pub fn chapter(&self) -> Option<&Chapter> {
        self.chapters.get(self.current_chapter)
    }
}

pub struct PlayerModel {
    library: LibraryManager,
    controller: Arc<PlayerController>,
    saver: ProgressSaver,
    state: Arc<watch::Sender<PlayerState>>,
    forwarder: JoinHandle<()>,
}

impl PlayerModel {
    /// Must be called inside a tokio runtime
    pub fn new(
        library: LibraryManager,
        controller: Arc<PlayerController>,
        save_interval: Duration,
    ) -> Self {
        let mut upstream = controller.subscribe();
        let initial = PlayerState::from_controller(&upstream.borrow_and_update());

        let (tx, _) = watch::channel(initial);
        let state = Arc::new(tx);

        let forward_to = Arc::clone(&state);
        let forwarder = tokio::spawn(async move {
            while upstream.changed().await.is_ok() {
                let latest = upstream.borrow_and_update().clone();
                forward_to.send_modify(|state| state.merge(&latest));
            }
        });

        let saver = ProgressSaver::start(Arc::clone(&controller), library.clone(), save_interval);

        Self {
            library,
            controller,
            saver,
            state,
            forwarder,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PlayerState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> PlayerState {
        self.state.borrow().clone()
    }

    pub fn controller(&self) -> &Arc<PlayerController> {
        &self.controller
    }

    pub fn clear_error(&self) {
        self.state
            .send_if_modified(|state| state.error_message.take().is_some());
    }

    /// Loads a stored book and starts it at its saved position
    pub async fn play_audiobook(&self, id: &AudiobookId) -> bool {
        let result = self.open(id).await;
        self.capture(result).is_some()
    }

    async fn open(&self, id: &AudiobookId) -> StateResult<()> {
        // The stored position of a book that is already playing is stale
        if let Err(e) = self.saver.save_now().await {
            log::warn!("Could not save the current position: {}", e);
        }

        let book = self.library.get(id).await?;

        let location = PathBuf::from(&book.location);
        if !location.exists() {
            return Err(AppError::FileNotFound { path: location }.into());
        }

        let items = self.resolve_items(&book).await?;
        self.controller.play_audiobook(book, items)?;
        Ok(())
    }

    async fn resolve_items(&self, book: &Audiobook) -> StateResult<Vec<MediaItem>> {
        let files = self.library.chapters(book).await?;
        if files.is_empty() {
            return Err(AppError::NoAudioFiles {
                location: book.location.clone(),
            }
            .into());
        }

        Ok(files
            .into_iter()
            .enumerate()
            .map(|(index, file)| {
                let duration_ms = match file.duration_ms {
                    0 => book.durations.get(index).copied().unwrap_or(0),
                    known => known,
                };
                MediaItem::new(file.path, file.title, duration_ms)
            })
            .collect())
    }

    pub fn play(&self) {
        let result = self.controller.play();
        self.capture(result);
    }

    pub fn pause(&self) {
        let result = self.controller.pause();
        self.capture(result);
    }

    pub fn toggle(&self) {
        let result = self.controller.toggle();
        self.capture(result);
    }

    /// Saves the position, then unloads the book
    pub async fn stop(&self) {
        self.save_progress().await;
        let result = self.controller.stop();
        self.capture(result);
    }

    pub fn skip_forward(&self) {
        let result = self.controller.skip_forward();
        self.capture(result);
    }

    pub fn skip_backward(&self) {
        let result = self.controller.skip_backward();
        self.capture(result);
    }

    pub fn next_chapter(&self) -> bool {
        let result = self.controller.next_chapter();
        self.capture(result).unwrap_or(false)
    }

    pub fn previous_chapter(&self) -> bool {
        let result = self.controller.previous_chapter();
        self.capture(result).unwrap_or(false)
    }

    pub fn seek_to(&self, offset_ms: u64) -> bool {
        let result = self.controller.seek_to(offset_ms);
        self.capture(result).unwrap_or(false)
    }

    pub fn go_to_chapter(&self, index: usize) -> bool {
        let result = self.controller.go_to_chapter(index);
        self.capture(result).unwrap_or(false)
    }

    /// Applies the speed and stores it on the current book
    pub async fn change_speed(&self, speed: f32) -> bool {
        let result = self.apply_speed(speed).await;
        self.capture(result).unwrap_or(false)
    }

    async fn apply_speed(&self, speed: f32) -> StateResult<bool> {
        if !self.controller.change_speed(speed)? {
            return Ok(false);
        }
        if let Some((id, _)) = self.controller.current_position() {
            self.library.update_speed(&id, speed).await?;
        }
        Ok(true)
    }

    /// Writes the current position to the library now
    pub async fn save_progress(&self) {
        let result = self.saver.save_now().await;
        self.capture(result);
    }

    /// Saves the position and shuts down the saver and the controller
    pub async fn release(&mut self) {
        self.save_progress().await;
        self.saver.shutdown();
        let result = self.controller.release();
        self.capture(result);
    }

    fn capture<T, E>(&self, result: Result<T, E>) -> Option<T>
    where
        StateError: From<E>,
    {
        match result.map_err(StateError::from) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Player operation failed: {}", e);
                let message = e.user_message();
                self.state
                    .send_modify(|state| state.error_message = Some(message));
                None
            }
        }
    }
}

impl Drop for PlayerModel {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}

