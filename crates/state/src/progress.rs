//! Periodic position saving

use audii_library::{LibraryManager, LibraryResult};
use media_engine::PlayerController;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Writes the controller's position to the library on a fixed interval.
///
/// Runs independently of the controller's poll loop. Nothing is written
/// while no audiobook is loaded.
pub struct ProgressSaver {
    controller: Arc<PlayerController>,
    library: LibraryManager,
    task: Option<JoinHandle<()>>,
}

impl ProgressSaver {
    /// Must be called inside a tokio runtime
    pub fn start(
        controller: Arc<PlayerController>,
        library: LibraryManager,
        period: Duration,
    ) -> Self {
        let task = tokio::spawn(save_loop(
            Arc::clone(&controller),
            library.clone(),
            period,
        ));

        Self {
            controller,
            library,
            task: Some(task),
        }
    }

    /// Saves right away. Returns false when nothing is loaded.
    pub async fn save_now(&self) -> LibraryResult<bool> {
        save(&self.controller, &self.library).await
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn shutdown(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for ProgressSaver {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn save_loop(controller: Arc<PlayerController>, library: LibraryManager, period: Duration) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if let Err(e) = save(&controller, &library).await {
            log::warn!("Failed to save playback position: {}", e);
        }
    }
}

async fn save(controller: &PlayerController, library: &LibraryManager) -> LibraryResult<bool> {
    let Some((id, position)) = controller.current_position() else {
        return Ok(false);
    };
    library.save_progress(&id, position).await?;
    log::debug!(
        "Saved position {}:{}ms for {}",
        position.chapter,
        position.offset_ms,
        id
    );
    Ok(true)
}
