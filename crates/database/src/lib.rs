//! Audii Database Layer
//!
//! SQLite storage for audiobooks, collections and datasources, accessed
//! through sqlx. The three tables reference each other only by ids stored
//! in value columns; nothing is enforced with foreign keys.

pub mod connection;
pub mod migrations;
pub mod queries;
pub mod search;

pub use connection::{connect, connect_in_memory, DatabaseConfig, DbPool};
pub use migrations::{current_version, optimize, run_migrations, verify_integrity};

/// Connects to the database described by `config` and brings its schema up to date
pub async fn open(config: DatabaseConfig) -> Result<DbPool, audii_core::AppError> {
    let pool = connect(config).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}
