//! Audiobook database operations
//!
//! Chapter durations and collection ids are stored as JSON arrays in value
//! columns. The position is split into `chapter_index` and `offset_ms`.

use crate::DbPool;
use audii_core::{
    AppError, Audiobook, AudiobookId, CollectionId, DatasourceId, Position, SkipTimings,
    Timestamp,
};
use sqlx::sqlite::SqliteRow;

const SELECT_COLUMNS: &str = r#"
    SELECT id, title, author, narrator, location, durations, chapter_index, offset_ms,
           cover_path, modified_at, skip_forward_secs, skip_backward_secs, speed,
           datasource_id, collections
    FROM audiobooks
"#;

/// Inserts a new audiobook, failing if the id is already taken
pub async fn create_audiobook(pool: &DbPool, book: &Audiobook) -> Result<(), AppError> {
    let durations_json = serde_json::to_string(&book.durations)
        .map_err(|e| AppError::database("Failed to serialize durations", e))?;
    let collections_json = serde_json::to_string(&book.collections)
        .map_err(|e| AppError::database("Failed to serialize collections", e))?;

    sqlx::query(
        r#"
        INSERT INTO audiobooks (
            id, title, author, narrator, location, durations, chapter_index, offset_ms,
            cover_path, modified_at, skip_forward_secs, skip_backward_secs, speed,
            datasource_id, collections
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(book.id.as_str())
    .bind(&book.title)
    .bind(&book.author)
    .bind(&book.narrator)
    .bind(&book.location)
    .bind(durations_json)
    .bind(book.position.chapter as i64)
    .bind(book.position.offset_ms as i64)
    .bind(&book.cover_path)
    .bind(book.modified.as_millis())
    .bind(i64::from(book.skip_timings.forward_secs))
    .bind(i64::from(book.skip_timings.backward_secs))
    .bind(f64::from(book.speed))
    .bind(book.datasource_id.as_ref().map(|id| id.as_str()))
    .bind(collections_json)
    .execute(pool)
    .await
    .map_err(|e| AppError::database("Failed to create audiobook", e))?;

    Ok(())
}

/// Gets an audiobook by ID
pub async fn get_audiobook(pool: &DbPool, id: &AudiobookId) -> Result<Audiobook, AppError> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
        .bind(id.as_str())
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::database("Failed to fetch audiobook", e))?
        .ok_or_else(|| not_found(id))?;

    row_to_audiobook(row)
}

/// Finds an audiobook whose stored location is exactly `location`
pub async fn find_by_location(
    pool: &DbPool,
    location: &str,
) -> Result<Option<Audiobook>, AppError> {
    let row = sqlx::query(&format!("{} WHERE location = ? LIMIT 1", SELECT_COLUMNS))
        .bind(location)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::database("Failed to look up audiobook location", e))?;

    row.map(row_to_audiobook).transpose()
}

/// Lists all audiobooks, most recently modified first
pub async fn list_audiobooks(pool: &DbPool) -> Result<Vec<Audiobook>, AppError> {
    let rows = sqlx::query(&format!("{} ORDER BY modified_at DESC", SELECT_COLUMNS))
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::database("Failed to list audiobooks", e))?;

    rows.into_iter().map(row_to_audiobook).collect()
}

/// Lists the audiobooks imported from a datasource
pub async fn list_by_datasource(
    pool: &DbPool,
    datasource_id: &DatasourceId,
) -> Result<Vec<Audiobook>, AppError> {
    let rows = sqlx::query(&format!(
        "{} WHERE datasource_id = ? ORDER BY modified_at DESC",
        SELECT_COLUMNS
    ))
    .bind(datasource_id.as_str())
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::database("Failed to list datasource audiobooks", e))?;

    rows.into_iter().map(row_to_audiobook).collect()
}

/// Lists the members of a collection
///
/// Membership lives in each audiobook's sorted id list, so filtering
/// happens after loading.
pub async fn list_by_collection(
    pool: &DbPool,
    collection_id: CollectionId,
) -> Result<Vec<Audiobook>, AppError> {
    Ok(list_audiobooks(pool)
        .await?
        .into_iter()
        .filter(|book| book.is_in_collection(collection_id))
        .collect())
}

/// Returns the stored location of every audiobook
pub async fn list_locations(pool: &DbPool) -> Result<Vec<String>, AppError> {
    sqlx::query_scalar("SELECT location FROM audiobooks")
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::database("Failed to list audiobook locations", e))
}

/// Counts stored audiobooks
pub async fn count_audiobooks(pool: &DbPool) -> Result<i64, AppError> {
    sqlx::query_scalar("SELECT COUNT(*) FROM audiobooks")
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::database("Failed to count audiobooks", e))
}

/// Replaces every column of an existing audiobook
pub async fn update_audiobook(pool: &DbPool, book: &Audiobook) -> Result<(), AppError> {
    let durations_json = serde_json::to_string(&book.durations)
        .map_err(|e| AppError::database("Failed to serialize durations", e))?;
    let collections_json = serde_json::to_string(&book.collections)
        .map_err(|e| AppError::database("Failed to serialize collections", e))?;

    let result = sqlx::query(
        r#"
        UPDATE audiobooks SET
            title = ?, author = ?, narrator = ?, location = ?, durations = ?,
            chapter_index = ?, offset_ms = ?, cover_path = ?, modified_at = ?,
            skip_forward_secs = ?, skip_backward_secs = ?, speed = ?,
            datasource_id = ?, collections = ?
        WHERE id = ?
        "#,
    )
    .bind(&book.title)
    .bind(&book.author)
    .bind(&book.narrator)
    .bind(&book.location)
    .bind(durations_json)
    .bind(book.position.chapter as i64)
    .bind(book.position.offset_ms as i64)
    .bind(&book.cover_path)
    .bind(book.modified.as_millis())
    .bind(i64::from(book.skip_timings.forward_secs))
    .bind(i64::from(book.skip_timings.backward_secs))
    .bind(f64::from(book.speed))
    .bind(book.datasource_id.as_ref().map(|id| id.as_str()))
    .bind(collections_json)
    .bind(book.id.as_str())
    .execute(pool)
    .await
    .map_err(|e| AppError::database("Failed to update audiobook", e))?;

    ensure_updated(result.rows_affected(), &book.id)
}

/// Stores a new playback position
pub async fn update_position(
    pool: &DbPool,
    id: &AudiobookId,
    position: Position,
) -> Result<(), AppError> {
    let result = sqlx::query(
        "UPDATE audiobooks SET chapter_index = ?, offset_ms = ?, modified_at = ? WHERE id = ?",
    )
    .bind(position.chapter as i64)
    .bind(position.offset_ms as i64)
    .bind(Timestamp::now().as_millis())
    .bind(id.as_str())
    .execute(pool)
    .await
    .map_err(|e| AppError::database("Failed to update playback position", e))?;

    ensure_updated(result.rows_affected(), id)
}

/// Stores a new playback speed
pub async fn update_speed(pool: &DbPool, id: &AudiobookId, speed: f32) -> Result<(), AppError> {
    let result = sqlx::query("UPDATE audiobooks SET speed = ?, modified_at = ? WHERE id = ?")
        .bind(f64::from(speed))
        .bind(Timestamp::now().as_millis())
        .bind(id.as_str())
        .execute(pool)
        .await
        .map_err(|e| AppError::database("Failed to update playback speed", e))?;

    ensure_updated(result.rows_affected(), id)
}

/// Stores a new collection membership list
pub async fn update_collections(
    pool: &DbPool,
    id: &AudiobookId,
    collections: &[CollectionId],
) -> Result<(), AppError> {
    let collections_json = serde_json::to_string(collections)
        .map_err(|e| AppError::database("Failed to serialize collections", e))?;

    let result =
        sqlx::query("UPDATE audiobooks SET collections = ?, modified_at = ? WHERE id = ?")
            .bind(collections_json)
            .bind(Timestamp::now().as_millis())
            .bind(id.as_str())
            .execute(pool)
            .await
            .map_err(|e| AppError::database("Failed to update audiobook collections", e))?;

    ensure_updated(result.rows_affected(), id)
}

/// Deletes an audiobook
pub async fn delete_audiobook(pool: &DbPool, id: &AudiobookId) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM audiobooks WHERE id = ?")
        .bind(id.as_str())
        .execute(pool)
        .await
        .map_err(|e| AppError::database("Failed to delete audiobook", e))?;

    ensure_updated(result.rows_affected(), id)
}

fn not_found(id: &AudiobookId) -> AppError {
    AppError::RecordNotFound {
        entity: "Audiobook".to_string(),
        identifier: id.to_string(),
    }
}

fn ensure_updated(rows_affected: u64, id: &AudiobookId) -> Result<(), AppError> {
    if rows_affected == 0 {
        Err(not_found(id))
    } else {
        Ok(())
    }
}

pub(crate) fn row_to_audiobook(row: SqliteRow) -> Result<Audiobook, AppError> {
    use sqlx::Row;

    let id: String = row
        .try_get("id")
        .map_err(|e| AppError::database("Missing audiobook ID", e))?;

    let durations_json: String = row
        .try_get("durations")
        .map_err(|e| AppError::database("Missing durations", e))?;
    let durations: Vec<u64> = serde_json::from_str(&durations_json)
        .map_err(|e| AppError::database("Failed to deserialize durations", e))?;

    let collections_json: String = row
        .try_get("collections")
        .map_err(|e| AppError::database("Missing collections", e))?;
    let mut collections: Vec<CollectionId> = serde_json::from_str(&collections_json)
        .map_err(|e| AppError::database("Failed to deserialize collections", e))?;
    collections.sort();
    collections.dedup();

    let chapter_index: i64 = row
        .try_get("chapter_index")
        .map_err(|e| AppError::database("Missing chapter index", e))?;
    let offset_ms: i64 = row
        .try_get("offset_ms")
        .map_err(|e| AppError::database("Missing chapter offset", e))?;

    let modified_ms: i64 = row
        .try_get("modified_at")
        .map_err(|e| AppError::database("Missing modification time", e))?;

    let skip_forward: i64 = row
        .try_get("skip_forward_secs")
        .map_err(|e| AppError::database("Missing skip forward timing", e))?;
    let skip_backward: i64 = row
        .try_get("skip_backward_secs")
        .map_err(|e| AppError::database("Missing skip backward timing", e))?;

    let speed: f64 = row
        .try_get("speed")
        .map_err(|e| AppError::database("Missing speed", e))?;

    let datasource_id: Option<String> = row
        .try_get("datasource_id")
        .map_err(|e| AppError::database("Missing datasource ID", e))?;

    Ok(Audiobook {
        id: AudiobookId::from_string(id),
        title: row
            .try_get("title")
            .map_err(|e| AppError::database("Missing title", e))?,
        author: row
            .try_get("author")
            .map_err(|e| AppError::database("Missing author", e))?,
        narrator: row
            .try_get("narrator")
            .map_err(|e| AppError::database("Missing narrator", e))?,
        location: row
            .try_get("location")
            .map_err(|e| AppError::database("Missing location", e))?,
        durations,
        position: Position::new(chapter_index.max(0) as usize, offset_ms.max(0) as u64),
        cover_path: row
            .try_get("cover_path")
            .map_err(|e| AppError::database("Missing cover path", e))?,
        modified: Timestamp::from_millis(modified_ms),
        skip_timings: SkipTimings::new(
            skip_forward.clamp(0, i64::from(u32::MAX)) as u32,
            skip_backward.clamp(0, i64::from(u32::MAX)) as u32,
        ),
        speed: speed as f32,
        datasource_id: datasource_id.map(DatasourceId::from_string),
        collections,
    })
}
