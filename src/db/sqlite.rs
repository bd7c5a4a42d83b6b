use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use crate::error::{AppError, AppResult};

/// Creates a SQLite connection pool
///
/// Opens (creating if necessary) the database file behind `database_url`
/// and initializes the schema. The pool is the store handle every service
/// receives at construction time.
pub async fn create_pool(database_url: &str) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    init_schema(&pool).await?;

    Ok(pool)
}

/// Creates an in-memory database pool for tests and local experiments
///
/// An in-memory SQLite database lives and dies with its connection, so the
/// pool is pinned to a single connection that is never recycled.
pub async fn create_memory_pool() -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    init_schema(&pool).await?;

    Ok(pool)
}

/// Creates tables and indexes if they don't exist
async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS news_items (
            news_id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            body TEXT NOT NULL DEFAULT '',
            url TEXT NOT NULL DEFAULT '',
            image_url TEXT NOT NULL DEFAULT '',
            published_at TEXT,
            source_name TEXT NOT NULL DEFAULT '',
            source_url TEXT NOT NULL DEFAULT '',
            labels TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS interactions (
            interaction_id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            news_id TEXT NOT NULL,
            kind TEXT NOT NULL DEFAULT 'click',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_interactions_user_id ON interactions(user_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_interactions_news_id ON interactions(news_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_interactions_created_at ON interactions(created_at)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_news_items_published_at ON news_items(published_at)")
        .execute(pool)
        .await?;

    tracing::debug!("Database schema initialized");

    Ok(())
}

/// Encodes a timestamp as fixed-width RFC 3339 UTC text
///
/// Fixed width (microsecond precision, explicit offset) makes lexicographic
/// `ORDER BY` and `MAX` on timestamp columns chronological.
pub(crate) fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Decodes a timestamp column written by [`format_ts`]
pub(crate) fn parse_ts(raw: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| AppError::Internal(format!("Malformed stored timestamp '{}': {}", raw, e)))
}

/// Decodes a labels column (JSON array text; empty means no labels)
pub(crate) fn parse_labels(raw: &str) -> AppResult<Vec<String>> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw)
        .map_err(|e| AppError::Internal(format!("Malformed stored labels '{}': {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_round_trip() {
        // Storage keeps microsecond precision.
        let now = Utc::now();
        let parsed = parse_ts(&format_ts(now)).unwrap();
        assert_eq!(parsed.timestamp_micros(), now.timestamp_micros());
    }

    #[test]
    fn test_timestamp_text_order_is_chronological() {
        let earlier = Utc::now();
        let later = earlier + chrono::Duration::milliseconds(1);
        assert!(format_ts(earlier) < format_ts(later));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_ts("yesterday").is_err());
    }

    #[test]
    fn test_memory_pool_has_schema() {
        let pool = tokio_test::block_on(create_memory_pool()).unwrap();
        let count: i64 = tokio_test::block_on(
            sqlx::query_scalar("SELECT COUNT(*) FROM news_items").fetch_one(&pool),
        )
        .unwrap();
        assert_eq!(count, 0);
    }
}
