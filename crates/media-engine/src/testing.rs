//! In-memory [`PlayerClient`] for driving the controller in tests

use crate::client::{MediaItem, PlayerClient, PlayerEvent, PlayerSnapshot};
use crate::error::{EngineError, EngineResult};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

#[derive(Debug)]
struct Script {
    items: Vec<MediaItem>,
    index: Option<usize>,
    position_ms: u64,
    playing: bool,
    speed: f32,
    calls: Vec<String>,
}

/// Applies commands instantly and records each one
pub struct ScriptedClient {
    script: Mutex<Script>,
    events: broadcast::Sender<PlayerEvent>,
}

impl Default for ScriptedClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedClient {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            script: Mutex::new(Script {
                items: Vec::new(),
                index: None,
                position_ms: 0,
                playing: false,
                speed: 1.0,
                calls: Vec::new(),
            }),
            events,
        }
    }

    /// Commands received so far, oldest first
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Pretends `ms` of audio were played, rolling into later items
    pub fn advance(&self, ms: u64) {
        let mut script = self.lock();
        if !script.playing {
            return;
        }

        let mut remaining = ms;
        while let Some(index) = script.index {
            let duration = script.items[index].duration_ms;
            let left = duration.saturating_sub(script.position_ms);
            if remaining < left {
                script.position_ms += remaining;
                return;
            }

            remaining -= left;
            if index + 1 < script.items.len() {
                script.index = Some(index + 1);
                script.position_ms = 0;
                let _ = self.events.send(PlayerEvent::ItemChanged(index + 1));
            } else {
                script.position_ms = duration;
                script.playing = false;
                let _ = self.events.send(PlayerEvent::Ended);
                return;
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: String) -> MutexGuard<'_, Script> {
        let mut script = self.lock();
        script.calls.push(call);
        script
    }
}

impl PlayerClient for ScriptedClient {
    fn set_items(&self, items: Vec<MediaItem>) -> EngineResult<()> {
        let mut script = self.record(format!("set_items({})", items.len()));
        script.index = if items.is_empty() { None } else { Some(0) };
        script.items = items;
        script.position_ms = 0;
        script.playing = false;
        Ok(())
    }

    fn seek_to_item(&self, index: usize, offset_ms: u64) -> EngineResult<()> {
        let mut script = self.record(format!("seek_to_item({}, {})", index, offset_ms));
        let Some(duration) = script.items.get(index).map(|item| item.duration_ms) else {
            return Err(EngineError::InvalidState(format!("No item {}", index)));
        };
        script.position_ms = offset_ms.min(duration);
        script.index = Some(index);
        Ok(())
    }

    fn play(&self) -> EngineResult<()> {
        let mut script = self.record("play".to_string());
        if script.index.is_none() {
            return Err(EngineError::NoItems);
        }
        script.playing = true;
        Ok(())
    }

    fn pause(&self) -> EngineResult<()> {
        self.record("pause".to_string()).playing = false;
        Ok(())
    }

    fn stop(&self) -> EngineResult<()> {
        let mut script = self.record("stop".to_string());
        script.playing = false;
        script.position_ms = 0;
        Ok(())
    }

    fn clear(&self) -> EngineResult<()> {
        let mut script = self.record("clear".to_string());
        script.items.clear();
        script.index = None;
        script.position_ms = 0;
        script.playing = false;
        Ok(())
    }

    fn seek(&self, offset_ms: u64) -> EngineResult<()> {
        let mut script = self.record(format!("seek({})", offset_ms));
        if let Some(index) = script.index {
            script.position_ms = offset_ms.min(script.items[index].duration_ms);
        }
        Ok(())
    }

    fn seek_to_next_item(&self) -> EngineResult<()> {
        let mut script = self.record("seek_to_next_item".to_string());
        if let Some(index) = script.index.filter(|i| i + 1 < script.items.len()) {
            script.index = Some(index + 1);
            script.position_ms = 0;
        }
        Ok(())
    }

    fn seek_to_previous_item(&self) -> EngineResult<()> {
        let mut script = self.record("seek_to_previous_item".to_string());
        if let Some(index) = script.index.filter(|&i| i > 0) {
            script.index = Some(index - 1);
            script.position_ms = 0;
        }
        Ok(())
    }

    fn set_speed(&self, speed: f32) -> EngineResult<()> {
        self.record(format!("set_speed({})", speed)).speed = speed;
        Ok(())
    }

    fn snapshot(&self) -> PlayerSnapshot {
        let script = self.lock();
        PlayerSnapshot {
            item_index: script.index,
            item_count: script.items.len(),
            position_ms: script.position_ms,
            duration_ms: script
                .index
                .map(|i| script.items[i].duration_ms)
                .unwrap_or(0),
            is_playing: script.playing,
            speed: script.speed,
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events.subscribe()
    }
}
