//! Queue handling of the local player
//!
//! Nothing here calls `play`, so no audio device is needed.

use media_engine::{LocalPlayer, MediaItem, PlayerClient, PlayerSnapshot};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn write_silence(path: &Path, millis: u32) {
    let rate = 8000u32;
    let data_len = rate * 2 / 1000 * millis;

    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVEfmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&rate.to_le_bytes());
    bytes.extend_from_slice(&(rate * 2).to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    bytes.resize(44 + data_len as usize, 0);

    std::fs::write(path, bytes).unwrap();
}

fn wait_for(player: &LocalPlayer, check: impl Fn(&PlayerSnapshot) -> bool) -> PlayerSnapshot {
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        let snapshot = player.snapshot();
        if check(&snapshot) {
            return snapshot;
        }
        assert!(Instant::now() < deadline, "timed out, last: {:?}", snapshot);
        thread::sleep(Duration::from_millis(10));
    }
}

fn queue(dir: &TempDir) -> Vec<MediaItem> {
    let first = dir.path().join("01.wav");
    let second = dir.path().join("02.wav");
    write_silence(&first, 1000);
    write_silence(&second, 2000);
    vec![
        MediaItem::new(first, "Chapter 1", 0),
        MediaItem::new(second, "Chapter 2", 0),
    ]
}

#[test]
fn test_set_items_loads_first_item() {
    let dir = TempDir::new().unwrap();
    let player = LocalPlayer::new().unwrap();

    player.set_items(queue(&dir)).unwrap();
    let snapshot = wait_for(&player, |s| s.item_count == 2);

    assert_eq!(snapshot.item_index, Some(0));
    assert_eq!(snapshot.duration_ms, 1000);
    assert_eq!(snapshot.position_ms, 0);
    assert!(!snapshot.is_playing);
}

#[test]
fn test_seek_to_item_and_navigation() {
    let dir = TempDir::new().unwrap();
    let player = LocalPlayer::new().unwrap();
    player.set_items(queue(&dir)).unwrap();

    player.seek_to_item(1, 500).unwrap();
    let snapshot = wait_for(&player, |s| s.item_index == Some(1));
    assert_eq!(snapshot.position_ms, 500);
    assert_eq!(snapshot.duration_ms, 2000);

    player.seek_to_next_item().unwrap();
    player.seek_to_previous_item().unwrap();
    let snapshot = wait_for(&player, |s| s.item_index == Some(0));
    assert_eq!(snapshot.position_ms, 0);

    player.seek_to_previous_item().unwrap();
    player.seek(250).unwrap();
    let snapshot = wait_for(&player, |s| s.position_ms == 250);
    assert_eq!(snapshot.item_index, Some(0));
}

#[test]
fn test_clear_empties_queue() {
    let dir = TempDir::new().unwrap();
    let player = LocalPlayer::new().unwrap();
    player.set_items(queue(&dir)).unwrap();
    wait_for(&player, |s| s.item_count == 2);

    player.clear().unwrap();
    let snapshot = wait_for(&player, |s| s.item_count == 0);
    assert_eq!(snapshot.item_index, None);
    assert_eq!(snapshot.duration_ms, 0);
}

#[test]
fn test_speed_is_validated_and_applied() {
    let player = LocalPlayer::new().unwrap();

    assert!(player.set_speed(5.0).is_err());
    player.set_speed(1.75).unwrap();
    wait_for(&player, |s| (s.speed - 1.75).abs() < f32::EPSILON);
}

#[test]
fn test_unreadable_item_reports_error() {
    let dir = TempDir::new().unwrap();
    let broken = dir.path().join("broken.mp3");
    std::fs::write(&broken, b"not audio").unwrap();

    let player = LocalPlayer::new().unwrap();
    let mut events = player.subscribe();
    player
        .set_items(vec![MediaItem::new(broken, "Broken", 4000)])
        .unwrap();

    let snapshot = wait_for(&player, |s| s.item_count == 1);
    assert_eq!(snapshot.duration_ms, 4000);

    let deadline = Instant::now() + Duration::from_secs(3);
    let mut saw_error = false;
    while Instant::now() < deadline && !saw_error {
        match events.try_recv() {
            Ok(media_engine::PlayerEvent::Error(_)) => saw_error = true,
            Ok(_) => {}
            Err(_) => thread::sleep(Duration::from_millis(10)),
        }
    }
    assert!(saw_error);
}
