//! Collection database operations

use crate::DbPool;
use audii_core::{AppError, Collection, CollectionId};
use sqlx::Row;

/// Creates a collection and returns it with its assigned id
pub async fn create_collection(pool: &DbPool, name: &str) -> Result<Collection, AppError> {
    let result = sqlx::query("INSERT INTO collections (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await
        .map_err(|e| AppError::database("Failed to create collection", e))?;

    Ok(Collection::new(
        CollectionId::new(result.last_insert_rowid()),
        name,
    ))
}

/// Gets a collection by ID
pub async fn get_collection(pool: &DbPool, id: CollectionId) -> Result<Collection, AppError> {
    let row = sqlx::query("SELECT id, name FROM collections WHERE id = ?")
        .bind(id.value())
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::database("Failed to fetch collection", e))?
        .ok_or_else(|| AppError::RecordNotFound {
            entity: "Collection".to_string(),
            identifier: id.to_string(),
        })?;

    row_to_collection(row)
}

/// Finds a collection by name, ignoring case
pub async fn find_collection_by_name(
    pool: &DbPool,
    name: &str,
) -> Result<Option<Collection>, AppError> {
    let row = sqlx::query(
        "SELECT id, name FROM collections WHERE lower(trim(name)) = lower(trim(?)) LIMIT 1",
    )
    .bind(name)
    .fetch_optional(pool)
    .await
    .map_err(|e| AppError::database("Failed to look up collection", e))?;

    row.map(row_to_collection).transpose()
}

/// Lists all collections ordered by name
pub async fn list_collections(pool: &DbPool) -> Result<Vec<Collection>, AppError> {
    let rows = sqlx::query("SELECT id, name FROM collections ORDER BY name COLLATE NOCASE ASC")
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::database("Failed to list collections", e))?;

    rows.into_iter().map(row_to_collection).collect()
}

/// Deletes a collection
///
/// Audiobooks keep the id in their membership lists until they are
/// rewritten; the library layer strips it.
pub async fn delete_collection(pool: &DbPool, id: CollectionId) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM collections WHERE id = ?")
        .bind(id.value())
        .execute(pool)
        .await
        .map_err(|e| AppError::database("Failed to delete collection", e))?;

    if result.rows_affected() == 0 {
        return Err(AppError::RecordNotFound {
            entity: "Collection".to_string(),
            identifier: id.to_string(),
        });
    }

    Ok(())
}

fn row_to_collection(row: sqlx::sqlite::SqliteRow) -> Result<Collection, AppError> {
    let id: i64 = row
        .try_get("id")
        .map_err(|e| AppError::database("Missing collection ID", e))?;
    let name: String = row
        .try_get("name")
        .map_err(|e| AppError::database("Missing collection name", e))?;

    Ok(Collection::new(CollectionId::new(id), name))
}
