//! Playback controller
//!
//! Owns the single [`PlayerClient`] and publishes a [`ControllerState`]
//! through a `watch` channel. The client is polled on a fixed interval and
//! whenever it pushes an event; commands update the state right away.

use crate::client::{MediaItem, PlayerClient};
use crate::error::{EngineError, EngineResult};
use audii_core::{
    skip_backward, skip_forward, Audiobook, AudiobookId, Chapter, Duration, PlaybackSpeed,
    Position, SkipOutcome,
};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration as StdDuration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Everything the UI needs to render the player
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerState {
    pub audiobook: Option<Audiobook>,
    pub position: Position,
    pub chapters: Vec<Chapter>,
    pub current_duration_ms: u64,
    pub current_chapter: usize,
    pub total_chapters: usize,
    pub is_loading: bool,
    pub is_playing: bool,
    pub speed: f32,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            audiobook: None,
            position: Position::START,
            chapters: Vec::new(),
            current_duration_ms: 0,
            current_chapter: 0,
            total_chapters: 0,
            is_loading: false,
            is_playing: false,
            speed: PlaybackSpeed::NORMAL.value(),
        }
    }
}

impl ControllerState {
    pub fn chapter(&self) -> Option<&Chapter> {
        self.chapters.get(self.current_chapter)
    }

    fn move_to(&mut self, chapter: usize, offset_ms: u64) {
        self.current_chapter = chapter;
        self.position = Position::new(chapter, offset_ms);
        self.current_duration_ms = self
            .chapters
            .get(chapter)
            .map(|c| c.duration.as_millis())
            .unwrap_or(0);
    }
}

pub struct PlayerController {
    client: Arc<dyn PlayerClient>,
    state: Arc<watch::Sender<ControllerState>>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl PlayerController {
    /// Starts polling `client` every `poll_interval`. Must be called inside a
    /// tokio runtime.
    pub fn new(client: Arc<dyn PlayerClient>, poll_interval: StdDuration) -> Self {
        let (tx, _) = watch::channel(ControllerState::default());
        let state = Arc::new(tx);

        let poller = tokio::spawn(poll_loop(
            Arc::clone(&client),
            Arc::clone(&state),
            poll_interval,
        ));

        Self {
            client,
            state,
            poller: Mutex::new(Some(poller)),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ControllerState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ControllerState {
        self.state.borrow().clone()
    }

    /// Current book and where playback is in it
    pub fn current_position(&self) -> Option<(AudiobookId, Position)> {
        let state = self.state.borrow();
        state
            .audiobook
            .as_ref()
            .map(|book| (book.id.clone(), state.position))
    }

    /// Replaces whatever is playing with `book`, resuming at its saved position
    pub fn play_audiobook(&self, book: Audiobook, items: Vec<MediaItem>) -> EngineResult<()> {
        if items.is_empty() {
            return Err(EngineError::NoItems);
        }

        if self.state.borrow().audiobook.is_some() {
            self.stop()?;
        }

        let chapter = book.position.chapter.min(items.len() - 1);
        let offset_ms = book.position.offset_ms;
        let speed = book.speed.clamp(PlaybackSpeed::MIN, PlaybackSpeed::MAX);
        let chapters: Vec<Chapter> = items
            .iter()
            .map(|item| {
                Chapter::new(item.title.clone(), Duration::from_millis(item.duration_ms))
            })
            .collect();

        log::info!(
            "Playing {} from chapter {} at {}ms",
            book.title,
            chapter,
            offset_ms
        );

        self.state.send_modify(|state| {
            state.total_chapters = chapters.len();
            state.chapters = chapters;
            state.move_to(chapter, offset_ms);
            state.speed = speed;
            state.audiobook = Some(book);
            state.is_loading = true;
            state.is_playing = false;
        });

        let started = self
            .client
            .set_items(items)
            .and_then(|_| self.client.seek_to_item(chapter, offset_ms))
            .and_then(|_| self.client.set_speed(speed))
            .and_then(|_| self.client.play());

        self.state.send_modify(|state| {
            state.is_loading = false;
            state.is_playing = started.is_ok();
        });

        started
    }

    pub fn play(&self) -> EngineResult<()> {
        if self.state.borrow().audiobook.is_none() {
            return Ok(());
        }
        self.client.play()?;
        self.state.send_modify(|state| state.is_playing = true);
        Ok(())
    }

    pub fn pause(&self) -> EngineResult<()> {
        self.client.pause()?;
        self.state.send_modify(|state| state.is_playing = false);
        Ok(())
    }

    pub fn toggle(&self) -> EngineResult<()> {
        if self.state.borrow().is_playing {
            self.pause()
        } else {
            self.play()
        }
    }

    /// Stops playback, empties the queue and forgets the current book
    pub fn stop(&self) -> EngineResult<()> {
        self.client.stop()?;
        self.client.clear()?;
        self.state.send_replace(ControllerState::default());
        Ok(())
    }

    /// Jumps ahead by the book's forward timing, or to the next chapter
    /// when the jump would pass the end of this one
    pub fn skip_forward(&self) -> EngineResult<()> {
        let Some(amount) = self.skip_amount(|book| book.skip_timings.forward_ms()) else {
            return Ok(());
        };
        let position = self.live_position();
        let duration = self.state.borrow().current_duration_ms;

        match skip_forward(position.offset_ms, amount, duration) {
            SkipOutcome::Seek(offset_ms) => self.seek_within(position.chapter, offset_ms),
            SkipOutcome::NextChapter => self.next_chapter().map(|_| ()),
        }
    }

    /// Jumps back by the book's backward timing, never leaving the chapter
    pub fn skip_backward(&self) -> EngineResult<()> {
        let Some(amount) = self.skip_amount(|book| book.skip_timings.backward_ms()) else {
            return Ok(());
        };
        let position = self.live_position();
        self.seek_within(
            position.chapter,
            skip_backward(position.offset_ms, amount),
        )
    }

    pub fn next_chapter(&self) -> EngineResult<bool> {
        self.client.seek_to_next_item()?;

        let (current, total) = self.chapter_bounds();
        if current + 1 >= total {
            return Ok(false);
        }
        self.state.send_modify(|state| state.move_to(current + 1, 0));
        Ok(true)
    }

    /// Moves to the previous chapter unless already on the first
    pub fn previous_chapter(&self) -> EngineResult<bool> {
        let (current, _) = self.chapter_bounds();
        if current == 0 {
            return Ok(false);
        }

        self.client.seek_to_previous_item()?;
        self.state.send_modify(|state| state.move_to(current - 1, 0));
        Ok(true)
    }

    /// Seeks inside the current chapter; ignored past its end
    pub fn seek_to(&self, offset_ms: u64) -> EngineResult<bool> {
        let (chapter, duration) = {
            let state = self.state.borrow();
            (state.current_chapter, state.current_duration_ms)
        };
        if duration < offset_ms {
            return Ok(false);
        }

        self.seek_within(chapter, offset_ms)?;
        Ok(true)
    }

    /// Starts chapter `index` from its beginning; ignored when out of range
    pub fn go_to_chapter(&self, index: usize) -> EngineResult<bool> {
        let (_, total) = self.chapter_bounds();
        if index >= total {
            return Ok(false);
        }

        self.client.seek_to_item(index, 0)?;
        self.state.send_modify(|state| state.move_to(index, 0));
        Ok(true)
    }

    /// Applies a new speed; ignored outside 0.5..=3.0
    pub fn change_speed(&self, speed: f32) -> EngineResult<bool> {
        if !PlaybackSpeed::is_supported(speed) {
            return Ok(false);
        }

        self.client.set_speed(speed)?;
        self.state.send_modify(|state| {
            state.speed = speed;
            if let Some(book) = state.audiobook.as_mut() {
                book.speed = speed;
            }
        });
        Ok(true)
    }

    /// Stops polling and releases the player
    pub fn release(&self) -> EngineResult<()> {
        self.stop_polling();
        self.stop()
    }

    fn stop_polling(&self) {
        let poller = self
            .poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(poller) = poller {
            poller.abort();
        }
    }

    fn skip_amount(&self, pick: impl Fn(&Audiobook) -> u64) -> Option<u64> {
        self.state.borrow().audiobook.as_ref().map(pick)
    }

    fn chapter_bounds(&self) -> (usize, usize) {
        let state = self.state.borrow();
        (state.current_chapter, state.total_chapters)
    }

    /// Client position when it agrees with the controller, else the last poll
    fn live_position(&self) -> Position {
        let snapshot = self.client.snapshot();
        let state = self.state.borrow();
        match snapshot.item_index {
            Some(index)
                if snapshot.item_count == state.total_chapters
                    && index == state.current_chapter =>
            {
                Position::new(index, snapshot.position_ms)
            }
            _ => state.position,
        }
    }

    fn seek_within(&self, chapter: usize, offset_ms: u64) -> EngineResult<()> {
        self.client.seek(offset_ms)?;
        self.state
            .send_modify(|state| state.position = Position::new(chapter, offset_ms));
        Ok(())
    }
}

impl Drop for PlayerController {
    fn drop(&mut self) {
        self.stop_polling();
    }
}

async fn poll_loop(
    client: Arc<dyn PlayerClient>,
    state: Arc<watch::Sender<ControllerState>>,
    poll_interval: StdDuration,
) {
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut events = client.subscribe();
    let mut events_open = true;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            event = events.recv(), if events_open => match event {
                Ok(event) => log::debug!("Player event: {:?}", event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::debug!("Skipped {} player events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => events_open = false,
            },
        }

        sync_from_client(client.as_ref(), &state);
    }
}

/// Copies the client's position into the state when both describe the same queue
fn sync_from_client(client: &dyn PlayerClient, state: &watch::Sender<ControllerState>) {
    let snapshot = client.snapshot();

    state.send_if_modified(|state| {
        if state.audiobook.is_none()
            || state.is_loading
            || snapshot.item_count != state.total_chapters
        {
            return false;
        }
        let Some(index) = snapshot.item_index else {
            return false;
        };

        let duration_ms = if snapshot.duration_ms > 0 {
            snapshot.duration_ms
        } else {
            state
                .chapters
                .get(index)
                .map(|c| c.duration.as_millis())
                .unwrap_or(0)
        };
        let position = Position::new(index, snapshot.position_ms);

        if state.position == position
            && state.current_chapter == index
            && state.current_duration_ms == duration_ms
            && state.is_playing == snapshot.is_playing
        {
            return false;
        }

        state.position = position;
        state.current_chapter = index;
        state.current_duration_ms = duration_ms;
        state.is_playing = snapshot.is_playing;
        true
    });
}
