//! Database migrations
//!
//! Each migration runs once inside a transaction and records its version in
//! `schema_migrations`.

use crate::DbPool;
use audii_core::AppError;

const MIGRATIONS: &[(i64, &str)] = &[
    (1, include_str!("../migrations/001_audiobooks.sql")),
    (2, include_str!("../migrations/002_collections.sql")),
    (3, include_str!("../migrations/003_datasources.sql")),
];

/// Current database schema version
pub const CURRENT_VERSION: i64 = 3;

/// Returns the schema version this build expects
pub fn current_version() -> i64 {
    CURRENT_VERSION
}

/// Runs all pending migrations
pub async fn run_migrations(pool: &DbPool) -> Result<(), AppError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now') * 1000)
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| AppError::database("Failed to create migrations table", e))?;

    for (version, sql) in MIGRATIONS {
        run_migration(pool, *version, sql).await?;
    }

    Ok(())
}

/// Runs a single migration if not already applied
async fn run_migration(pool: &DbPool, version: i64, sql: &str) -> Result<(), AppError> {
    let applied: Option<i64> =
        sqlx::query_scalar("SELECT version FROM schema_migrations WHERE version = ?")
            .bind(version)
            .fetch_optional(pool)
            .await
            .map_err(|e| AppError::database("Failed to check migration status", e))?;

    if applied.is_some() {
        return Ok(());
    }

    let failed = |e: sqlx::Error| AppError::MigrationFailed {
        version: version.to_string(),
        reason: e.to_string(),
    };

    let mut tx = pool.begin().await.map_err(failed)?;
    sqlx::raw_sql(sql).execute(&mut *tx).await.map_err(failed)?;
    sqlx::query("INSERT INTO schema_migrations (version) VALUES (?)")
        .bind(version)
        .execute(&mut *tx)
        .await
        .map_err(failed)?;
    tx.commit().await.map_err(failed)?;

    log::info!("Applied database migration {}", version);
    Ok(())
}

/// Highest applied migration version, 0 for an empty database
pub async fn applied_version(pool: &DbPool) -> Result<i64, AppError> {
    sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM schema_migrations")
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::database("Failed to read schema version", e))
}

/// Verifies database integrity
pub async fn verify_integrity(pool: &DbPool) -> Result<(), AppError> {
    let result: String = sqlx::query_scalar("PRAGMA integrity_check")
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::database("Failed to check integrity", e))?;

    if result != "ok" {
        return Err(AppError::DatabaseError {
            message: format!("Database integrity check failed: {}", result),
            source: None,
        });
    }

    Ok(())
}

/// Optimizes the database
pub async fn optimize(pool: &DbPool) -> Result<(), AppError> {
    sqlx::query("PRAGMA optimize")
        .execute(pool)
        .await
        .map_err(|e| AppError::database("Failed to optimize database", e))?;

    Ok(())
}
