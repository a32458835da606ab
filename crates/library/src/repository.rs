//! Observable repositories
//!
//! Each repository wraps the SQL queries for one table and publishes the full
//! table through a `watch` channel after every write, so subscribers always
//! see the stored state.

use crate::error::Result;
use audii_core::{
    Audiobook, AudiobookId, Collection, CollectionId, Datasource, DatasourceId, Position,
};
use audii_database::{queries, search, DbPool};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Clone)]
pub struct AudiobookRepository {
    pool: DbPool,
    tx: Arc<watch::Sender<Vec<Audiobook>>>,
}

impl AudiobookRepository {
    pub fn new(pool: DbPool) -> Self {
        let (tx, _) = watch::channel(Vec::new());
        Self {
            pool,
            tx: Arc::new(tx),
        }
    }

    /// All audiobooks, most recently modified first, re-sent after each write
    pub fn subscribe(&self) -> watch::Receiver<Vec<Audiobook>> {
        self.tx.subscribe()
    }

    /// Last published list
    pub fn current(&self) -> Vec<Audiobook> {
        self.tx.borrow().clone()
    }

    /// Reloads the table and publishes it
    pub async fn refresh(&self) -> Result<Vec<Audiobook>> {
        let books = queries::list_audiobooks(&self.pool).await?;
        self.tx.send_replace(books.clone());
        Ok(books)
    }

    pub async fn get(&self, id: &AudiobookId) -> Result<Audiobook> {
        Ok(queries::get_audiobook(&self.pool, id).await?)
    }

    pub async fn list(&self) -> Result<Vec<Audiobook>> {
        Ok(queries::list_audiobooks(&self.pool).await?)
    }

    pub async fn list_locations(&self) -> Result<Vec<String>> {
        Ok(queries::list_locations(&self.pool).await?)
    }

    pub async fn list_by_collection(&self, id: CollectionId) -> Result<Vec<Audiobook>> {
        Ok(queries::list_by_collection(&self.pool, id).await?)
    }

    pub async fn list_by_datasource(&self, id: &DatasourceId) -> Result<Vec<Audiobook>> {
        Ok(queries::list_by_datasource(&self.pool, id).await?)
    }

    pub async fn search(&self, query: &str) -> Result<Vec<Audiobook>> {
        Ok(search::search_audiobooks(&self.pool, query).await?)
    }

    pub async fn insert(&self, book: &Audiobook) -> Result<()> {
        queries::create_audiobook(&self.pool, book).await?;
        self.refresh().await?;
        Ok(())
    }

    pub async fn update_position(&self, id: &AudiobookId, position: Position) -> Result<()> {
        queries::update_position(&self.pool, id, position).await?;
        self.refresh().await?;
        Ok(())
    }

    pub async fn update_speed(&self, id: &AudiobookId, speed: f32) -> Result<()> {
        queries::update_speed(&self.pool, id, speed).await?;
        self.refresh().await?;
        Ok(())
    }

    pub async fn update_collections(&self, id: &AudiobookId, ids: &[CollectionId]) -> Result<()> {
        queries::update_collections(&self.pool, id, ids).await?;
        self.refresh().await?;
        Ok(())
    }

    pub async fn delete(&self, id: &AudiobookId) -> Result<()> {
        queries::delete_audiobook(&self.pool, id).await?;
        self.refresh().await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct CollectionRepository {
    pool: DbPool,
    tx: Arc<watch::Sender<Vec<Collection>>>,
}

impl CollectionRepository {
    pub fn new(pool: DbPool) -> Self {
        let (tx, _) = watch::channel(Vec::new());
        Self {
            pool,
            tx: Arc::new(tx),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Collection>> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Vec<Collection> {
        self.tx.borrow().clone()
    }

    pub async fn refresh(&self) -> Result<Vec<Collection>> {
        let collections = queries::list_collections(&self.pool).await?;
        self.tx.send_replace(collections.clone());
        Ok(collections)
    }

    pub async fn list(&self) -> Result<Vec<Collection>> {
        Ok(queries::list_collections(&self.pool).await?)
    }

    pub async fn get(&self, id: CollectionId) -> Result<Collection> {
        Ok(queries::get_collection(&self.pool, id).await?)
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<Collection>> {
        Ok(queries::find_collection_by_name(&self.pool, name).await?)
    }

    pub async fn insert(&self, name: &str) -> Result<Collection> {
        let collection = queries::create_collection(&self.pool, name).await?;
        self.refresh().await?;
        Ok(collection)
    }

    pub async fn delete(&self, id: CollectionId) -> Result<()> {
        queries::delete_collection(&self.pool, id).await?;
        self.refresh().await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct DatasourceRepository {
    pool: DbPool,
    tx: Arc<watch::Sender<Vec<Datasource>>>,
}

impl DatasourceRepository {
    pub fn new(pool: DbPool) -> Self {
        let (tx, _) = watch::channel(Vec::new());
        Self {
            pool,
            tx: Arc::new(tx),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Datasource>> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Vec<Datasource> {
        self.tx.borrow().clone()
    }

    pub async fn refresh(&self) -> Result<Vec<Datasource>> {
        let datasources = queries::list_datasources(&self.pool).await?;
        self.tx.send_replace(datasources.clone());
        Ok(datasources)
    }

    pub async fn list(&self) -> Result<Vec<Datasource>> {
        Ok(queries::list_datasources(&self.pool).await?)
    }

    pub async fn insert(&self, datasource: &Datasource) -> Result<()> {
        queries::create_datasource(&self.pool, datasource).await?;
        self.refresh().await?;
        Ok(())
    }

    pub async fn delete(&self, id: &DatasourceId) -> Result<()> {
        queries::delete_datasource(&self.pool, id).await?;
        self.refresh().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audii_core::AudiobookData;

    async fn pool() -> DbPool {
        let pool = audii_database::connect_in_memory().await.unwrap();
        audii_database::run_migrations(&pool).await.unwrap();
        pool
    }

    fn book(title: &str) -> Audiobook {
        Audiobook::from_data(
            AudiobookData {
                title: title.to_string(),
                author: "Unknown".to_string(),
                narrator: "Unknown".to_string(),
                location: format!("/books/{}", title),
                durations: vec![1000, 2000],
                cover_path: None,
            },
            None,
        )
    }

    #[tokio::test]
    async fn test_writes_publish_the_table() {
        let repo = AudiobookRepository::new(pool().await);
        let mut rx = repo.subscribe();
        assert!(rx.borrow().is_empty());

        let dune = book("Dune");
        repo.insert(&dune).await.unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);

        repo.update_position(&dune.id, Position::new(1, 500))
            .await
            .unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update()[0].position, Position::new(1, 500));

        repo.delete(&dune.id).await.unwrap();
        assert!(repo.current().is_empty());
    }

    #[tokio::test]
    async fn test_collection_repository_publishes() {
        let repo = CollectionRepository::new(pool().await);
        let rx = repo.subscribe();

        let favourites = repo.insert("Favourites").await.unwrap();
        assert_eq!(rx.borrow().len(), 1);
        assert_eq!(
            repo.find_by_name("favourites").await.unwrap(),
            Some(favourites.clone())
        );

        repo.delete(favourites.id).await.unwrap();
        assert!(rx.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_datasource_repository_publishes() {
        let repo = DatasourceRepository::new(pool().await);
        let datasource = Datasource::new("/books");

        repo.insert(&datasource).await.unwrap();
        assert_eq!(repo.current(), vec![datasource.clone()]);

        repo.delete(&datasource.id).await.unwrap();
        assert!(repo.current().is_empty());
    }
}
