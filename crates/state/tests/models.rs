//! State holders over a real library and a scripted player

use audii_core::{AudiobookId, Position};
use audii_library::{LibraryManager, LibraryOptions};
use audii_state::{
    CollectionModel, ImportKind, ImportModel, ImportStatus, LibraryModel, PlayerModel,
};
use media_engine::testing::ScriptedClient;
use media_engine::{PlayerClient, PlayerController};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::watch;
use tokio::time::{sleep, timeout, Instant};

const WAIT: Duration = Duration::from_secs(3);

fn write_wav(path: &Path, millis: u32) {
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

    fs::write(path, bytes).unwrap();
}

struct Fixture {
    _dir: TempDir,
    root: PathBuf,
    library: LibraryManager,
}

async fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("Audiobooks");
    fs::create_dir_all(root.join("Dune")).unwrap();
    write_wav(&root.join("Dune/01 - Prologue.wav"), 1000);
    write_wav(&root.join("Dune/02 - Arrakis.wav"), 2000);
    write_wav(&root.join("Solaris.wav"), 1500);
    fs::write(root.join("notes.txt"), b"not a book").unwrap();

    let options = LibraryOptions::new(dir.path().join("audii.db"), dir.path().join("covers"));
    let library = LibraryManager::open(options).await.unwrap();

    Fixture {
        _dir: dir,
        root,
        library,
    }
}

async fn settle<T>(rx: &mut watch::Receiver<T>, check: impl FnMut(&T) -> bool) {
    timeout(WAIT, rx.wait_for(check))
        .await
        .expect("state never settled")
        .expect("state sender dropped");
}

async fn imported(fx: &Fixture, title: &str) -> AudiobookId {
    fx.library.import_folder_as_books(&fx.root).await.unwrap();
    fx.library
        .list()
        .await
        .unwrap()
        .into_iter()
        .find(|b| b.title == title)
        .unwrap()
        .id
}

fn player(fx: &Fixture, save_every: Duration) -> (Arc<ScriptedClient>, PlayerModel) {
    let client = Arc::new(ScriptedClient::new());
    let dyn_client: Arc<dyn PlayerClient> = client.clone();
    let controller = Arc::new(PlayerController::new(dyn_client, Duration::from_millis(20)));
    let model = PlayerModel::new(fx.library.clone(), controller, save_every);
    (client, model)
}

// ===== Library =====

#[tokio::test]
async fn test_library_model_follows_imports() {
    let fx = fixture().await;
    let model = LibraryModel::new(fx.library.clone());
    let mut rx = model.subscribe();
    assert!(model.state().audiobooks.is_empty());

    let added = model.add_folder_as_books(&fx.root).await;
    assert_eq!(added.len(), 2);

    settle(&mut rx, |s| s.audiobooks.len() == 2 && s.datasources.len() == 1).await;
    let state = model.state();
    assert!(!state.is_loading);
    assert_eq!(state.error_message, None);
}

#[tokio::test]
async fn test_library_model_keeps_error_until_cleared() {
    let fx = fixture().await;
    let model = LibraryModel::new(fx.library.clone());

    assert!(model.add_file(fx.root.join("notes.txt")).await.is_none());
    assert_eq!(
        model.state().error_message.as_deref(),
        Some("Error Adding Audiobook")
    );

    assert!(model.add_file(fx.root.join("Solaris.wav")).await.is_some());
    assert!(model.state().error_message.is_some());

    model.clear_error();
    assert_eq!(model.state().error_message, None);
}

#[tokio::test]
async fn test_library_model_reports_known_books_on_reimport() {
    let fx = fixture().await;
    let model = LibraryModel::new(fx.library.clone());
    fx.library.import_file(fx.root.join("Solaris.wav")).await.unwrap();

    let added = model.add_folder_as_books(&fx.root).await;
    let titles: Vec<String> = added.into_iter().map(|b| b.title).collect();
    assert_eq!(titles, vec!["Dune".to_string()]);
    assert_eq!(
        model.state().error_message.as_deref(),
        Some("Audiobook: Solaris already exists")
    );

    model.clear_error();
    assert!(model.add_folder_as_books(&fx.root).await.is_empty());
    let message = model.state().error_message.unwrap();
    assert!(message.contains("Audiobook: Dune already exists"));
}

#[tokio::test]
async fn test_library_model_filters() {
    let fx = fixture().await;
    let model = LibraryModel::new(fx.library.clone());
    let mut rx = model.subscribe();
    model.add_folder_as_books(&fx.root).await;
    settle(&mut rx, |s| s.audiobooks.len() == 2).await;

    model.set_search("dun");
    let titles: Vec<String> = model
        .state()
        .visible()
        .iter()
        .map(|b| b.title.clone())
        .collect();
    assert_eq!(titles, vec!["Dune".to_string()]);

    let shelf = fx.library.create_collection("Sci-Fi").await.unwrap();
    let solaris = model
        .state()
        .audiobooks
        .iter()
        .find(|b| b.title == "Solaris")
        .map(|b| b.id.clone())
        .unwrap();
    assert!(model.add_to_collection(&solaris, shelf.id).await);

    model.set_search("");
    model.select_collection(Some(shelf.id));
    settle(&mut rx, |s| {
        s.visible().len() == 1 && s.visible()[0].title == "Solaris"
    })
    .await;

    fx.library.delete_collection(shelf.id).await.unwrap();
    settle(&mut rx, |s| s.selected_collection.is_none()).await;
}

#[tokio::test]
async fn test_continue_listening_tracks_progress() {
    let fx = fixture().await;
    let model = LibraryModel::new(fx.library.clone());
    let mut rx = model.subscribe();
    let dune = imported(&fx, "Dune").await;

    fx.library
        .save_progress(&dune, Position::new(1, 400))
        .await
        .unwrap();

    settle(&mut rx, |s| s.continue_listening().len() == 1).await;
    assert_eq!(model.state().continue_listening()[0].id, dune);

    assert!(model.restart(&dune).await);
    settle(&mut rx, |s| s.continue_listening().is_empty()).await;
}

// ===== Collections =====

#[tokio::test]
async fn test_collection_model_rejects_duplicates() {
    let fx = fixture().await;
    let model = CollectionModel::new(fx.library.clone());
    let mut rx = model.subscribe();

    let favorites = model.add("Favorites").await.unwrap();
    assert!(model.add("favorites").await.is_none());
    assert_eq!(
        model.state().error_message.as_deref(),
        Some("Collection with the same name already exists")
    );
    settle(&mut rx, |s| s.collections.len() == 1).await;

    model.clear_error();
    assert!(model.delete(favorites.id).await);
    settle(&mut rx, |s| s.collections.is_empty()).await;
}

// ===== Import =====

#[tokio::test]
async fn test_import_model_reports_outcome() {
    let fx = fixture().await;
    let model = ImportModel::new(fx.library.clone());
    assert_eq!(model.status(), ImportStatus::Idle);

    let status = model.import(ImportKind::FolderAsBooks, &fx.root).await;
    let mut titles = match status {
        ImportStatus::Success(titles) => titles,
        other => panic!("unexpected status {:?}", other),
    };
    titles.sort();
    assert_eq!(titles, vec!["Dune".to_string(), "Solaris".to_string()]);

    let again = model.import(ImportKind::FolderAsBooks, &fx.root).await;
    match again {
        ImportStatus::Error(message) => {
            assert!(message.contains("Audiobook: Dune already exists"));
            assert!(message.contains("Audiobook: Solaris already exists"));
        }
        other => panic!("unexpected status {:?}", other),
    }

    let failed = model
        .import(ImportKind::File, fx.root.join("notes.txt"))
        .await;
    assert_eq!(failed, ImportStatus::Error("Error Adding Audiobook".to_string()));
    assert_eq!(model.status(), failed);

    model.reset();
    assert_eq!(model.status(), ImportStatus::Idle);
}

#[tokio::test]
async fn test_import_model_rejects_files_as_folders() {
    let fx = fixture().await;
    let model = ImportModel::new(fx.library.clone());

    let status = model
        .import(ImportKind::FolderAsBooks, fx.root.join("Solaris.wav"))
        .await;
    assert_eq!(status, ImportStatus::Error("Not a folder".to_string()));
}

// ===== Player =====

#[tokio::test]
async fn test_player_model_opens_book() {
    let fx = fixture().await;
    let dune = imported(&fx, "Dune").await;
    let (client, model) = player(&fx, Duration::from_secs(90));

    assert!(model.play_audiobook(&dune).await);

    let mut rx = model.subscribe();
    settle(&mut rx, |s| s.audiobook.is_some() && s.is_playing).await;
    let state = model.state();
    assert_eq!(state.total_chapters, 2);
    assert_eq!(state.chapters[0].title, "01 - Prologue");
    assert!(client.calls().contains(&"set_items(2)".to_string()));
    assert!(client.calls().contains(&"play".to_string()));
}

#[tokio::test]
async fn test_player_model_persists_speed() {
    let fx = fixture().await;
    let dune = imported(&fx, "Dune").await;
    let (_client, model) = player(&fx, Duration::from_secs(90));
    assert!(model.play_audiobook(&dune).await);

    assert!(model.change_speed(1.5).await);
    assert_eq!(fx.library.get(&dune).await.unwrap().speed, 1.5);

    assert!(!model.change_speed(4.0).await);
    assert_eq!(model.state().error_message, None);
    assert_eq!(fx.library.get(&dune).await.unwrap().speed, 1.5);
}

#[tokio::test]
async fn test_player_model_reports_missing_source() {
    let fx = fixture().await;
    let dune = imported(&fx, "Dune").await;
    fs::remove_dir_all(fx.root.join("Dune")).unwrap();
    let (client, model) = player(&fx, Duration::from_secs(90));

    assert!(!model.play_audiobook(&dune).await);
    assert_eq!(
        model.state().error_message.as_deref(),
        Some("The file was not found. It may have been moved or deleted.")
    );
    assert!(client.calls().is_empty());

    model.clear_error();
    assert_eq!(model.state().error_message, None);
}

#[tokio::test]
async fn test_progress_saver_writes_position() {
    let fx = fixture().await;
    let dune = imported(&fx, "Dune").await;
    let (client, model) = player(&fx, Duration::from_millis(50));
    assert!(model.play_audiobook(&dune).await);

    client.advance(700);

    let deadline = Instant::now() + WAIT;
    loop {
        let stored = fx.library.get(&dune).await.unwrap().position;
        if stored == Position::new(0, 700) {
            break;
        }
        assert!(Instant::now() < deadline, "position never saved: {:?}", stored);
        sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn test_stop_saves_position() {
    let fx = fixture().await;
    let dune = imported(&fx, "Dune").await;
    let (_client, model) = player(&fx, Duration::from_secs(90));
    assert!(model.play_audiobook(&dune).await);

    assert!(model.go_to_chapter(1));
    assert!(model.seek_to(1200));
    model.stop().await;

    assert_eq!(
        fx.library.get(&dune).await.unwrap().position,
        Position::new(1, 1200)
    );
    let mut rx = model.subscribe();
    settle(&mut rx, |s| s.audiobook.is_none() && !s.is_playing).await;
}
