//! Database connection management

use audii_core::AppError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;

/// Database connection pool
pub type DbPool = Pool<Sqlite>;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Enable Write-Ahead Logging (WAL) mode
    pub enable_wal: bool,
    /// Create database if it doesn't exist
    pub create_if_missing: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "audii.db".to_string(),
            max_connections: 5,
            enable_wal: true,
            create_if_missing: true,
        }
    }
}

impl DatabaseConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Configuration for a database file at `path`
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self::new(path.as_ref().to_string_lossy().into_owned())
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn with_wal(mut self, enable: bool) -> Self {
        self.enable_wal = enable;
        self
    }

    pub fn with_create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }
}

/// Establishes a connection pool to the database
pub async fn connect(config: DatabaseConfig) -> Result<DbPool, AppError> {
    let mut options = SqliteConnectOptions::from_str(&format!("sqlite:{}", config.path))
        .map_err(|e| AppError::database("Invalid database path", e))?
        .create_if_missing(config.create_if_missing);

    if config.enable_wal {
        options = options
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await
        .map_err(|e| AppError::database("Failed to connect to database", e))?;

    log::debug!("Connected to database at {}", config.path);
    Ok(pool)
}

/// Opens a private in-memory database.
///
/// The pool holds a single connection that is never recycled, since the
/// data lives only as long as that connection.
pub async fn connect_in_memory() -> Result<DbPool, AppError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(|e| AppError::database("Failed to create in-memory database", e))?
        .journal_mode(SqliteJournalMode::Memory);

    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(|e| AppError::database("Failed to connect to in-memory database", e))
}

/// Closes the database connection pool
pub async fn close(pool: DbPool) {
    pool.close().await;
}

/// Checks if the database file exists
pub fn database_exists(path: impl AsRef<Path>) -> bool {
    path.as_ref().exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_connect_creates_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("library.db");

        let pool = connect(DatabaseConfig::from_path(&path)).await.unwrap();

        assert!(database_exists(&path));
        close(pool).await;
    }

    #[tokio::test]
    async fn test_connect_with_wal_mode() {
        let temp_file = NamedTempFile::new().unwrap();
        let config = DatabaseConfig::from_path(temp_file.path()).with_wal(true);
        let pool = connect(config).await.unwrap();

        let result: (String,) = sqlx::query_as("PRAGMA journal_mode;")
            .fetch_one(&pool)
            .await
            .unwrap();

        assert_eq!(result.0.to_lowercase(), "wal");
        close(pool).await;
    }

    #[tokio::test]
    async fn test_missing_database_is_not_created_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.db");

        let config = DatabaseConfig::from_path(&path).with_create_if_missing(false);
        let result = connect(config).await;

        assert!(matches!(result, Err(AppError::DatabaseError { .. })));
        assert!(!database_exists(&path));
    }

    #[test]
    fn test_config_builder() {
        let config = DatabaseConfig::new("test.db")
            .with_max_connections(20)
            .with_wal(false)
            .with_create_if_missing(false);

        assert_eq!(config.path, "test.db");
        assert_eq!(config.max_connections, 20);
        assert!(!config.enable_wal);
        assert!(!config.create_if_missing);
    }

    #[tokio::test]
    async fn test_in_memory_database_keeps_data() {
        let pool = connect_in_memory().await.unwrap();

        sqlx::query("CREATE TABLE probe (x INTEGER)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO probe VALUES (1)")
            .execute(&pool)
            .await
            .unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM probe")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);

        close(pool).await;
    }
}
