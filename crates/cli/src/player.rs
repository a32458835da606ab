use crate::Session;
use anyhow::{bail, Context, Result};
use audii_core::{AudiobookId, Duration as CoreDuration, PlaybackSpeed};
use audii_state::{PlayerModel, PlayerState};
use console::{style, Key, Term};
use media_engine::{LocalPlayer, PlayerClient, PlayerController};
use std::sync::Arc;
use std::thread;
use std::time::Duration as StdDuration;
use tokio::sync::mpsc;
use tokio::time::interval;

const REDRAW_EVERY: StdDuration = StdDuration::from_millis(500);

/// What a key press asks the player to do
#[derive(Debug, Clone, Copy, PartialEq)]
enum Action {
    Toggle,
    SkipForward,
    SkipBackward,
    NextChapter,
    PreviousChapter,
    Faster,
    Slower,
    Quit,
}

fn action_for(key: &Key) -> Option<Action> {
    match key {
        Key::Char(' ') => Some(Action::Toggle),
        Key::ArrowRight => Some(Action::SkipForward),
        Key::ArrowLeft => Some(Action::SkipBackward),
        Key::Char('n') => Some(Action::NextChapter),
        Key::Char('p') => Some(Action::PreviousChapter),
        Key::Char('+') | Key::Char('=') => Some(Action::Faster),
        Key::Char('-') | Key::Char('_') => Some(Action::Slower),
        Key::Char('q') | Key::Escape => Some(Action::Quit),
        _ => None,
    }
}

pub async fn start_playback(session: &Session, id: AudiobookId) -> Result<()> {
    let player = &session.config.player;

    let client: Arc<dyn PlayerClient> =
        Arc::new(LocalPlayer::new().context("Failed to start the playback thread")?);
    let controller = Arc::new(PlayerController::new(
        client,
        StdDuration::from_millis(player.poll_interval_ms),
    ));
    let mut model = PlayerModel::new(
        session.library.clone(),
        controller,
        StdDuration::from_secs(player.progress_save_interval_secs),
    );

    if !model.play_audiobook(&id).await {
        bail!(model.state().error_message.unwrap_or_default());
    }

    let term = Term::stdout();
    if term.hide_cursor().is_err() {
        eprintln!("Warning: Failed to hide cursor");
    }

    let result = player_loop(&term, &model, player.speed_step).await;

    model.release().await;
    let _ = term.show_cursor();

    result
}

async fn player_loop(term: &Term, model: &PlayerModel, speed_step: f32) -> Result<()> {
    let mut actions = spawn_key_reader();
    let mut state = model.subscribe();
    let mut redraw = interval(REDRAW_EVERY);

    loop {
        let snapshot = state.borrow_and_update().clone();
        draw_player_ui(term, &snapshot)?;

        tokio::select! {
            action = actions.recv() => match action {
                Some(Action::Quit) | None => break,
                Some(action) => apply(model, action, &snapshot, speed_step).await,
            },
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = redraw.tick() => {}
        }
    }

    Ok(())
}

async fn apply(model: &PlayerModel, action: Action, state: &PlayerState, speed_step: f32) {
    model.clear_error();
    match action {
        Action::Toggle => model.toggle(),
        Action::SkipForward => model.skip_forward(),
        Action::SkipBackward => model.skip_backward(),
        Action::NextChapter => {
            model.next_chapter();
        }
        Action::PreviousChapter => {
            model.previous_chapter();
        }
        Action::Faster | Action::Slower => {
            let step = if action == Action::Faster {
                speed_step
            } else {
                -speed_step
            };
            let speed = PlaybackSpeed::new_unchecked(state.speed).stepped(step);
            model.change_speed(speed.value()).await;
        }
        Action::Quit => {}
    }
}

/// Reads keys on a plain thread, `Term::read_key` blocks
fn spawn_key_reader() -> mpsc::UnboundedReceiver<Action> {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::spawn(move || {
        let term = Term::stdout();
        while let Ok(key) = term.read_key() {
            let Some(action) = action_for(&key) else {
                continue;
            };
            if tx.send(action).is_err() || action == Action::Quit {
                break;
            }
        }
    });
    rx
}

fn draw_player_ui(term: &Term, state: &PlayerState) -> Result<()> {
    term.clear_screen().context("Failed to clear screen")?;

    let Some(book) = &state.audiobook else {
        term.write_line("  Nothing playing").context("Failed to write status")?;
        return Ok(());
    };

    term.write_line(&format!("\n  {}", style(&book.title).bold().cyan()))
        .context("Failed to write title")?;
    term.write_line(&format!("  by {}", style(&book.author).dim()))
        .context("Failed to write author")?;
    term.write_line("").context("Failed to write blank line")?;

    let chapter_title = state
        .chapter()
        .map(|c| c.title.as_str())
        .unwrap_or("Unknown chapter");
    term.write_line(&format!(
        "  Chapter {}/{}: {}",
        state.current_chapter + 1,
        state.total_chapters,
        chapter_title
    ))
    .context("Failed to write chapter")?;

    let position = CoreDuration::from_millis(state.position.offset_ms);
    let duration = CoreDuration::from_millis(state.current_duration_ms);
    term.write_line(&format!("  {} / {}", position.as_clock(), duration.as_clock()))
        .context("Failed to write position")?;
    term.write_line(&progress_bar(
        state.position.offset_ms,
        state.current_duration_ms,
        50,
    ))
    .context("Failed to write progress bar")?;
    term.write_line("").context("Failed to write blank line")?;

    let status = if state.is_loading {
        style("Loading").dim()
    } else if state.is_playing {
        style("Playing").green()
    } else {
        style("Paused").yellow()
    };
    term.write_line(&format!("  Status: {}", status))
        .context("Failed to write status")?;
    term.write_line(&format!("  Speed: {:.2}x", state.speed))
        .context("Failed to write speed")?;

    if let Some(message) = &state.error_message {
        term.write_line(&format!("  {}", style(message).red()))
            .context("Failed to write error")?;
    }

    term.write_line("").context("Failed to write blank line")?;
    term.write_line("  Controls:")
        .context("Failed to write controls header")?;
    term.write_line("    Space   - Play/Pause")
        .context("Failed to write control")?;
    term.write_line(&format!(
        "    ←/→     - Skip -{}s/+{}s",
        book.skip_timings.backward_secs, book.skip_timings.forward_secs
    ))
    .context("Failed to write control")?;
    term.write_line("    p/n     - Previous/next chapter")
        .context("Failed to write control")?;
    term.write_line("    -/+     - Speed down/up")
        .context("Failed to write control")?;
    term.write_line("    Q/Esc   - Quit")
        .context("Failed to write control")?;

    Ok(())
}

fn progress_bar(position_ms: u64, duration_ms: u64, width: usize) -> String {
    let percent = if duration_ms > 0 {
        (position_ms.min(duration_ms) * 100 / duration_ms) as usize
    } else {
        0
    };
    let filled = (percent * width / 100).min(width);
    format!(
        "  [{}{}] {}%",
        "=".repeat(filled),
        " ".repeat(width - filled),
        percent
    )
}
