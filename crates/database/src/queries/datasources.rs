//! Datasource database operations

use crate::DbPool;
use audii_core::{AppError, Datasource, DatasourceId};
use sqlx::Row;

/// Registers a folder for future re-sync
pub async fn create_datasource(pool: &DbPool, datasource: &Datasource) -> Result<(), AppError> {
    sqlx::query("INSERT INTO datasources (id, location) VALUES (?, ?)")
        .bind(datasource.id.as_str())
        .bind(&datasource.location)
        .execute(pool)
        .await
        .map_err(|e| AppError::database("Failed to create datasource", e))?;

    Ok(())
}

/// Gets a datasource by ID
pub async fn get_datasource(pool: &DbPool, id: &DatasourceId) -> Result<Datasource, AppError> {
    let row = sqlx::query("SELECT id, location FROM datasources WHERE id = ?")
        .bind(id.as_str())
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::database("Failed to fetch datasource", e))?
        .ok_or_else(|| AppError::RecordNotFound {
            entity: "Datasource".to_string(),
            identifier: id.to_string(),
        })?;

    row_to_datasource(row)
}

/// Lists every registered datasource
pub async fn list_datasources(pool: &DbPool) -> Result<Vec<Datasource>, AppError> {
    let rows = sqlx::query("SELECT id, location FROM datasources ORDER BY location ASC")
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::database("Failed to list datasources", e))?;

    rows.into_iter().map(row_to_datasource).collect()
}

/// Removes a datasource; audiobooks imported from it are kept
pub async fn delete_datasource(pool: &DbPool, id: &DatasourceId) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM datasources WHERE id = ?")
        .bind(id.as_str())
        .execute(pool)
        .await
        .map_err(|e| AppError::database("Failed to delete datasource", e))?;

    if result.rows_affected() == 0 {
        return Err(AppError::RecordNotFound {
            entity: "Datasource".to_string(),
            identifier: id.to_string(),
        });
    }

    Ok(())
}

fn row_to_datasource(row: sqlx::sqlite::SqliteRow) -> Result<Datasource, AppError> {
    let id: String = row
        .try_get("id")
        .map_err(|e| AppError::database("Missing datasource ID", e))?;
    let location: String = row
        .try_get("location")
        .map_err(|e| AppError::database("Missing datasource location", e))?;

    Ok(Datasource {
        id: DatasourceId::from_string(id),
        location,
    })
}
