//! Title and author search

use crate::queries::audiobooks::row_to_audiobook;
use crate::DbPool;
use audii_core::{AppError, Audiobook};

/// Finds audiobooks whose title or author contains `query`, ignoring case.
///
/// An empty query matches everything.
pub async fn search_audiobooks(pool: &DbPool, query: &str) -> Result<Vec<Audiobook>, AppError> {
    let pattern = format!("%{}%", escape_like(&query.trim().to_lowercase()));

    let rows = sqlx::query(
        r#"
        SELECT id, title, author, narrator, location, durations, chapter_index, offset_ms,
               cover_path, modified_at, skip_forward_secs, skip_backward_secs, speed,
               datasource_id, collections
        FROM audiobooks
        WHERE lower(title) LIKE ? ESCAPE '\' OR lower(author) LIKE ? ESCAPE '\'
        ORDER BY modified_at DESC
        "#,
    )
    .bind(&pattern)
    .bind(&pattern)
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::database("Failed to search audiobooks", e))?;

    rows.into_iter().map(row_to_audiobook).collect()
}

fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%_done"), "100\\%\\_done");
        assert_eq!(escape_like("plain"), "plain");
    }
}
