use crate::content::ContentClassifier;
use crate::covers::CoverStore;
use crate::error::{LibraryError, Result};
use crate::import::BookImporter;
use crate::parser::{AudiobookParser, ChapterFile};
use crate::repository::{AudiobookRepository, CollectionRepository, DatasourceRepository};
use crate::sync::{DatasourceSync, SyncReport};
use audii_config::{Config, ConfigManager};
use audii_core::{
    is_known, AppError, Audiobook, AudiobookData, AudiobookId, Collection, CollectionId,
    Datasource, DatasourceId, Duration, PlaybackSpeed, Position, SkipTimings,
};
use audii_database::{DatabaseConfig, DbPool};
use log::info;
use std::path::{Path, PathBuf};

/// Everything needed to open a library
#[derive(Debug, Clone)]
pub struct LibraryOptions {
    pub database: DatabaseConfig,
    pub covers_dir: PathBuf,
    pub classifier: ContentClassifier,
    pub follow_symlinks: bool,
    /// Skip amounts given to newly imported books
    pub skip_timings: SkipTimings,
    /// Playback speed given to newly imported books
    pub default_speed: f32,
}

impl LibraryOptions {
    pub fn new(database_path: impl AsRef<Path>, covers_dir: impl Into<PathBuf>) -> Self {
        Self {
            database: DatabaseConfig::from_path(database_path),
            covers_dir: covers_dir.into(),
            classifier: ContentClassifier::default(),
            follow_symlinks: false,
            skip_timings: SkipTimings::default(),
            default_speed: PlaybackSpeed::NORMAL.value(),
        }
    }

    pub fn from_config(config: &Config, manager: &ConfigManager) -> Self {
        Self {
            database: DatabaseConfig::from_path(manager.database_path(config)),
            covers_dir: manager.covers_dir(config),
            classifier: ContentClassifier::from_config(&config.library),
            follow_symlinks: config.library.follow_symlinks,
            skip_timings: SkipTimings::new(
                config.player.skip_forward_secs,
                config.player.skip_backward_secs,
            ),
            default_speed: config.player.default_speed,
        }
    }
}

/// Result of importing a folder of books
#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    pub added: Vec<Audiobook>,
    /// Titles skipped because their location is already in the library
    pub duplicates: Vec<String>,
}

impl ImportSummary {
    /// "already exists" for every skipped title, one per line
    pub fn duplicate_message(&self) -> Option<String> {
        if self.duplicates.is_empty() {
            return None;
        }
        let lines: Vec<String> = self
            .duplicates
            .iter()
            .map(|title| already_exists(title).user_message())
            .collect();
        Some(lines.join("\n"))
    }
}

fn already_exists(title: &str) -> AppError {
    AppError::AlreadyExists {
        entity: "Audiobook".to_string(),
        identifier: title.to_string(),
    }
}

/// Result of re-scanning every datasource
#[derive(Debug, Clone, Default)]
pub struct SyncSummary {
    pub added: Vec<Audiobook>,
    pub removed_datasources: usize,
}

/// Library statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryStats {
    pub total_books: usize,
    pub started: usize,
    pub completed: usize,
    pub collections: usize,
    pub datasources: usize,
    pub total_duration: Duration,
    pub listened: Duration,
}

/// High-level library management
#[derive(Clone)]
pub struct LibraryManager {
    pool: DbPool,
    audiobooks: AudiobookRepository,
    collections: CollectionRepository,
    datasources: DatasourceRepository,
    importer: BookImporter,
    sync: DatasourceSync,
    skip_timings: SkipTimings,
    default_speed: f32,
}

impl LibraryManager {
    /// Opens (and migrates) the database described by `options`
    pub async fn open(options: LibraryOptions) -> Result<Self> {
        info!("Opening library database: {}", options.database.path);
        let pool = audii_database::connect(options.database.clone()).await?;
        Self::with_pool(pool, options).await
    }

    /// Builds a manager on an existing pool, migrating it if needed
    pub async fn with_pool(pool: DbPool, options: LibraryOptions) -> Result<Self> {
        audii_database::run_migrations(&pool).await?;

        let parser = AudiobookParser::new(options.classifier, CoverStore::new(options.covers_dir))
            .with_follow_symlinks(options.follow_symlinks);

        let manager = Self {
            audiobooks: AudiobookRepository::new(pool.clone()),
            collections: CollectionRepository::new(pool.clone()),
            datasources: DatasourceRepository::new(pool.clone()),
            importer: BookImporter::new(parser.clone()),
            sync: DatasourceSync::new(parser),
            skip_timings: options.skip_timings,
            default_speed: options.default_speed,
            pool,
        };

        manager.audiobooks.refresh().await?;
        manager.collections.refresh().await?;
        manager.datasources.refresh().await?;

        Ok(manager)
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn audiobooks(&self) -> &AudiobookRepository {
        &self.audiobooks
    }

    pub fn collections(&self) -> &CollectionRepository {
        &self.collections
    }

    pub fn datasources(&self) -> &DatasourceRepository {
        &self.datasources
    }

    // ===== Reads =====

    /// All books, most recently modified first
    pub async fn list(&self) -> Result<Vec<Audiobook>> {
        self.audiobooks.list().await
    }

    pub async fn get(&self, id: &AudiobookId) -> Result<Audiobook> {
        self.audiobooks.get(id).await
    }

    /// Books whose title or author contains `query`, ignoring case
    pub async fn search(&self, query: &str) -> Result<Vec<Audiobook>> {
        self.audiobooks.search(query).await
    }

    pub async fn in_collection(&self, id: CollectionId) -> Result<Vec<Audiobook>> {
        self.audiobooks.list_by_collection(id).await
    }

    /// The most recently touched books that have been started
    pub async fn continue_listening(&self, limit: usize) -> Result<Vec<Audiobook>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(Audiobook::is_started)
            .take(limit)
            .collect())
    }

    pub async fn list_collections(&self) -> Result<Vec<Collection>> {
        self.collections.list().await
    }

    pub async fn list_datasources(&self) -> Result<Vec<Datasource>> {
        self.datasources.list().await
    }

    /// Chapter files of a book, with titles and durations read from disk
    pub async fn chapters(&self, book: &Audiobook) -> Result<Vec<ChapterFile>> {
        let parser = self.importer.parser().clone();
        let location = PathBuf::from(&book.location);
        blocking(move || Ok(parser.chapters(&location))).await
    }

    pub async fn stats(&self) -> Result<LibraryStats> {
        let books = self.list().await?;
        let collections = self.collections.list().await?.len();
        let datasources = self.datasources.list().await?.len();

        Ok(LibraryStats {
            total_books: books.len(),
            started: books.iter().filter(|b| b.is_started()).count(),
            completed: books.iter().filter(|b| b.is_completed()).count(),
            collections,
            datasources,
            total_duration: Duration::from_millis(
                books.iter().map(|b| b.total_duration().as_millis()).sum(),
            ),
            listened: Duration::from_millis(books.iter().map(|b| b.elapsed().as_millis()).sum()),
        })
    }

    // ===== Import =====

    /// Stores a parsed book unless its location is already in the library
    ///
    /// A book that is not stored takes its copied cover with it.
    pub async fn add_audiobook(
        &self,
        data: AudiobookData,
        datasource_id: Option<DatasourceId>,
    ) -> Result<Audiobook> {
        let cover = data.cover_path.clone();
        let result = self.store(data, datasource_id).await;
        if result.is_err() {
            if let Some(cover) = cover.as_deref() {
                self.discard_cover(cover);
            }
        }
        result
    }

    async fn store(
        &self,
        data: AudiobookData,
        datasource_id: Option<DatasourceId>,
    ) -> Result<Audiobook> {
        let locations = self.audiobooks.list_locations().await?;
        if is_known(&data.location, &locations) {
            return Err(already_exists(&data.title).into());
        }

        let mut book = Audiobook::from_data(data, datasource_id);
        book.skip_timings = self.skip_timings;
        book.speed = self.default_speed;

        self.audiobooks.insert(&book).await?;
        info!("Added audiobook: {} ({})", book.title, book.id);
        Ok(book)
    }

    pub async fn import_file(&self, path: impl AsRef<Path>) -> Result<Audiobook> {
        let importer = self.importer.clone();
        let path = path.as_ref().to_path_buf();
        let data = blocking(move || importer.import_file(&path)).await?;
        self.add_audiobook(data, None).await
    }

    pub async fn import_folder_as_book(&self, path: impl AsRef<Path>) -> Result<Audiobook> {
        let importer = self.importer.clone();
        let path = path.as_ref().to_path_buf();
        let data = blocking(move || importer.import_folder_as_book(&path)).await?;
        self.add_audiobook(data, None).await
    }

    /// Imports every child of `path` as its own book and tracks `path` for re-sync
    pub async fn import_folder_as_books(&self, path: impl AsRef<Path>) -> Result<ImportSummary> {
        let importer = self.importer.clone();
        let root = path.as_ref().to_path_buf();
        let location = root.to_string_lossy().into_owned();
        let parsed = blocking(move || importer.import_folder_as_books(&root)).await?;

        let datasource = self.datasource_for(&location).await?;

        let mut summary = ImportSummary::default();
        for data in parsed {
            let title = data.title.clone();
            match self.add_audiobook(data, Some(datasource.id.clone())).await {
                Ok(book) => summary.added.push(book),
                Err(LibraryError::App(AppError::AlreadyExists { .. })) => {
                    log::debug!("Skipping known audiobook: {}", title);
                    summary.duplicates.push(title);
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "Imported {} audiobook(s) from {} ({} already present)",
            summary.added.len(),
            location,
            summary.duplicates.len()
        );
        Ok(summary)
    }

    async fn datasource_for(&self, location: &str) -> Result<Datasource> {
        let existing = self
            .datasources
            .list()
            .await?
            .into_iter()
            .find(|ds| ds.location == location);

        match existing {
            Some(datasource) => Ok(datasource),
            None => {
                let datasource = Datasource::new(location);
                self.datasources.insert(&datasource).await?;
                Ok(datasource)
            }
        }
    }

    // ===== Updates =====

    /// Deletes a book and the cover the library stored for it
    pub async fn delete_audiobook(&self, id: &AudiobookId) -> Result<()> {
        let book = self.get(id).await?;
        self.audiobooks.delete(id).await?;

        if let Some(cover) = book.cover_path.as_deref() {
            self.discard_cover(cover);
        }

        info!("Deleted audiobook: {}", book.title);
        Ok(())
    }

    fn discard_cover(&self, cover: &str) {
        if let Err(e) = self.importer.parser().covers().remove(Path::new(cover)) {
            log::warn!("Failed to remove cover {}: {}", cover, e);
        }
    }

    pub async fn update_speed(&self, id: &AudiobookId, speed: f32) -> Result<()> {
        let speed = PlaybackSpeed::new(speed)?;
        self.audiobooks.update_speed(id, speed.value()).await
    }

    /// Persists a playback position, clamped to the book's timeline
    pub async fn save_progress(&self, id: &AudiobookId, position: Position) -> Result<()> {
        let book = self.get(id).await?;
        let position = book.timeline().clamp(position);
        self.audiobooks.update_position(id, position).await
    }

    pub async fn mark_completed(&self, id: &AudiobookId) -> Result<()> {
        let book = self.get(id).await?;
        self.audiobooks
            .update_position(id, book.completed_position())
            .await
    }

    pub async fn restart(&self, id: &AudiobookId) -> Result<()> {
        self.audiobooks.update_position(id, Position::START).await
    }

    // ===== Collections =====

    pub async fn create_collection(&self, name: &str) -> Result<Collection> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::invalid_argument("name", "Collection name cannot be empty").into());
        }

        if self.collections.find_by_name(name).await?.is_some() {
            return Err(AppError::invalid_argument(
                "name",
                "Collection with the same name already exists",
            )
            .into());
        }

        let collection = self.collections.insert(name).await?;
        info!("Created collection: {}", collection.name);
        Ok(collection)
    }

    /// Deletes a collection and strips it from every member
    pub async fn delete_collection(&self, id: CollectionId) -> Result<()> {
        for mut book in self.in_collection(id).await? {
            book.remove_from_collection(id);
            self.audiobooks
                .update_collections(&book.id, &book.collections)
                .await?;
        }

        self.collections.delete(id).await
    }

    pub async fn add_to_collection(
        &self,
        book_id: &AudiobookId,
        collection_id: CollectionId,
    ) -> Result<()> {
        self.collections.get(collection_id).await?;

        let mut book = self.get(book_id).await?;
        if book.add_to_collection(collection_id) {
            self.audiobooks
                .update_collections(book_id, &book.collections)
                .await?;
        }
        Ok(())
    }

    pub async fn remove_from_collection(
        &self,
        book_id: &AudiobookId,
        collection_id: CollectionId,
    ) -> Result<()> {
        let mut book = self.get(book_id).await?;
        if book.remove_from_collection(collection_id) {
            self.audiobooks
                .update_collections(book_id, &book.collections)
                .await?;
        }
        Ok(())
    }

    /// Replaces a book's memberships
    pub async fn set_collections(
        &self,
        book_id: &AudiobookId,
        collection_ids: Vec<CollectionId>,
    ) -> Result<()> {
        let mut book = self.get(book_id).await?;
        book.set_collections(collection_ids);
        self.audiobooks
            .update_collections(book_id, &book.collections)
            .await
    }

    // ===== Datasources =====

    /// Drops vanished datasources and imports entries added to the rest
    pub async fn sync_datasources(&self) -> Result<SyncSummary> {
        self.run_sync()
            .await
            .map_err(|e| LibraryError::App(AppError::datasource_sync(e)))
    }

    async fn run_sync(&self) -> Result<SyncSummary> {
        let datasources = self.datasources.list().await?;
        let existing = self.audiobooks.list_locations().await?;

        let sync = self.sync.clone();
        let report: SyncReport = blocking(move || Ok(sync.scan(&datasources, &existing))).await?;

        let mut summary = SyncSummary::default();

        for id in &report.stale {
            self.datasources.delete(id).await?;
            summary.removed_datasources += 1;
        }

        for entry in report.discovered {
            let parser = self.importer.parser().clone();
            let path = entry.path.clone();
            let Some(data) = blocking(move || Ok(parser.parse(&path))).await? else {
                log::debug!("No audio in {}", entry.location);
                continue;
            };

            match self.add_audiobook(data, Some(entry.datasource_id)).await {
                Ok(book) => summary.added.push(book),
                Err(LibraryError::App(AppError::AlreadyExists { .. })) => {}
                Err(e) => return Err(e),
            }
        }

        info!(
            "Datasource sync added {} audiobook(s), removed {} datasource(s)",
            summary.added.len(),
            summary.removed_datasources
        );
        Ok(summary)
    }
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    async fn manager(dir: &TempDir) -> LibraryManager {
        let pool = audii_database::connect_in_memory().await.unwrap();
        let options = LibraryOptions::new(":memory:", dir.path().join("covers"));
        LibraryManager::with_pool(pool, options).await.unwrap()
    }

    fn data(title: &str, location: &str, durations: Vec<u64>) -> AudiobookData {
        AudiobookData {
            title: title.to_string(),
            author: "Unknown".to_string(),
            narrator: "Unknown".to_string(),
            location: location.to_string(),
            durations,
            cover_path: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_location_rejected() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir).await;

        manager
            .add_audiobook(data("Dune", "/books/Dune", vec![1000]), None)
            .await
            .unwrap();
        let err = manager
            .add_audiobook(data("Dune", "/other/Dune", vec![1000]), None)
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "Audiobook: Dune already exists");
        assert_eq!(manager.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_new_books_use_configured_defaults() {
        let dir = TempDir::new().unwrap();
        let pool = audii_database::connect_in_memory().await.unwrap();
        let mut options = LibraryOptions::new(":memory:", dir.path().join("covers"));
        options.skip_timings = SkipTimings::new(30, 15);
        options.default_speed = 1.25;
        let manager = LibraryManager::with_pool(pool, options).await.unwrap();

        let book = manager
            .add_audiobook(data("Dune", "/books/Dune", vec![1000]), None)
            .await
            .unwrap();
        let stored = manager.get(&book.id).await.unwrap();

        assert_eq!(stored.skip_timings, SkipTimings::new(30, 15));
        assert!((stored.speed - 1.25).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_save_progress_clamps() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir).await;
        let book = manager
            .add_audiobook(data("Dune", "/books/Dune", vec![1000, 2000]), None)
            .await
            .unwrap();

        manager
            .save_progress(&book.id, Position::new(7, 99_999))
            .await
            .unwrap();

        let stored = manager.get(&book.id).await.unwrap();
        assert_eq!(stored.position, Position::new(1, 2000));
        assert!(stored.is_completed());
    }

    #[tokio::test]
    async fn test_mark_completed_and_restart() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir).await;
        let book = manager
            .add_audiobook(data("Dune", "/books/Dune", vec![1000, 2000]), None)
            .await
            .unwrap();

        manager.mark_completed(&book.id).await.unwrap();
        let stored = manager.get(&book.id).await.unwrap();
        assert_eq!(stored.progress_percent(), 100);

        manager.restart(&book.id).await.unwrap();
        let stored = manager.get(&book.id).await.unwrap();
        assert_eq!(stored.position, Position::START);
        assert_eq!(stored.progress_percent(), 0);
    }

    #[tokio::test]
    async fn test_update_speed_validates_range() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir).await;
        let book = manager
            .add_audiobook(data("Dune", "/books/Dune", vec![1000]), None)
            .await
            .unwrap();

        manager.update_speed(&book.id, 2.0).await.unwrap();
        assert!(manager.update_speed(&book.id, 3.5).await.is_err());

        let stored = manager.get(&book.id).await.unwrap();
        assert!((stored.speed - 2.0).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_collection_names_are_unique_ignoring_case() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir).await;

        manager.create_collection("Sci-Fi").await.unwrap();
        let err = manager.create_collection("  sci-fi ").await.unwrap_err();

        assert_eq!(
            err.user_message(),
            "Collection with the same name already exists"
        );
        assert!(manager.create_collection("   ").await.is_err());
    }

    #[tokio::test]
    async fn test_delete_collection_strips_membership() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir).await;
        let book = manager
            .add_audiobook(data("Dune", "/books/Dune", vec![1000]), None)
            .await
            .unwrap();
        let scifi = manager.create_collection("Sci-Fi").await.unwrap();
        let classics = manager.create_collection("Classics").await.unwrap();

        manager.add_to_collection(&book.id, scifi.id).await.unwrap();
        manager.add_to_collection(&book.id, classics.id).await.unwrap();
        assert_eq!(manager.in_collection(scifi.id).await.unwrap().len(), 1);

        manager.delete_collection(scifi.id).await.unwrap();

        let stored = manager.get(&book.id).await.unwrap();
        assert_eq!(stored.collections, vec![classics.id]);
        assert!(manager.in_collection(scifi.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_to_unknown_collection_fails() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir).await;
        let book = manager
            .add_audiobook(data("Dune", "/books/Dune", vec![1000]), None)
            .await
            .unwrap();

        let result = manager.add_to_collection(&book.id, CollectionId::new(42)).await;
        assert!(matches!(
            result,
            Err(LibraryError::App(AppError::RecordNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_continue_listening_only_started_books() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir).await;

        let mut ids = Vec::new();
        for title in ["A", "B", "C", "D"] {
            let book = manager
                .add_audiobook(data(title, &format!("/books/{}", title), vec![60_000]), None)
                .await
                .unwrap();
            ids.push(book.id);
        }

        manager
            .save_progress(&ids[0], Position::new(0, 1000))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        manager
            .save_progress(&ids[2], Position::new(0, 1000))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        manager
            .save_progress(&ids[3], Position::new(0, 1000))
            .await
            .unwrap();

        let titles: Vec<String> = manager
            .continue_listening(2)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, vec!["D", "C"]);
    }

    #[tokio::test]
    async fn test_delete_removes_stored_cover() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir).await;

        let source = dir.path().join("Dune");
        fs::create_dir(&source).unwrap();
        fs::write(source.join("01.mp3"), b"x").unwrap();
        fs::write(source.join("cover.png"), [0x89, b'P', b'N', b'G']).unwrap();

        let book = manager.import_folder_as_book(&source).await.unwrap();
        let cover = PathBuf::from(book.cover_path.clone().unwrap());
        assert!(cover.exists());

        manager.delete_audiobook(&book.id).await.unwrap();
        assert!(!cover.exists());
        assert!(manager.get(&book.id).await.is_err());
    }

    #[tokio::test]
    async fn test_rejected_duplicate_leaves_no_cover_behind() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir).await;

        let source = dir.path().join("Dune");
        fs::create_dir(&source).unwrap();
        fs::write(source.join("01.mp3"), b"x").unwrap();
        fs::write(source.join("cover.png"), [0x89, b'P', b'N', b'G']).unwrap();

        manager.import_folder_as_book(&source).await.unwrap();
        for _ in 0..3 {
            assert!(manager.import_folder_as_book(&source).await.is_err());
        }

        let stored = fs::read_dir(dir.path().join("covers")).unwrap().count();
        assert_eq!(stored, 1);
        assert_eq!(manager.list().await.unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_message_names_every_title() {
        let mut summary = ImportSummary::default();
        assert_eq!(summary.duplicate_message(), None);

        summary.duplicates = vec!["Dune".to_string(), "Solaris".to_string()];
        assert_eq!(
            summary.duplicate_message().as_deref(),
            Some("Audiobook: Dune already exists\nAudiobook: Solaris already exists")
        );
    }

    #[tokio::test]
    async fn test_stats() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir).await;
        let dune = manager
            .add_audiobook(data("Dune", "/books/Dune", vec![60_000, 60_000]), None)
            .await
            .unwrap();
        manager
            .add_audiobook(data("Solaris", "/books/Solaris", vec![30_000]), None)
            .await
            .unwrap();
        manager
            .save_progress(&dune.id, Position::new(1, 0))
            .await
            .unwrap();

        let stats = manager.stats().await.unwrap();
        assert_eq!(stats.total_books, 2);
        assert_eq!(stats.started, 1);
        assert_eq!(stats.completed, 0);
        assert_eq!(stats.total_duration, Duration::from_millis(150_000));
        assert_eq!(stats.listened, Duration::from_millis(60_000));
    }
}
