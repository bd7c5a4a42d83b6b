use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::{
    db::{format_ts, parse_labels, parse_ts},
    error::{AppError, AppResult},
    models::{normalize_labels, NewsItem, NewsItemDraft},
};

/// Raw `news_items` row; labels and timestamps decode on the way out
#[derive(sqlx::FromRow)]
struct ItemRow {
    news_id: String,
    title: String,
    description: String,
    body: String,
    url: String,
    image_url: String,
    published_at: Option<String>,
    source_name: String,
    source_url: String,
    labels: String,
    created_at: String,
    updated_at: String,
}

impl ItemRow {
    fn into_item(self) -> AppResult<NewsItem> {
        Ok(NewsItem {
            id: self.news_id,
            title: self.title,
            description: self.description,
            body: self.body,
            url: self.url,
            image_url: self.image_url,
            published_at: self.published_at.as_deref().map(parse_ts).transpose()?,
            source_name: self.source_name,
            source_url: self.source_url,
            labels: parse_labels(&self.labels)?,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}

const SELECT_ITEM: &str = "SELECT news_id, title, description, body, url, image_url, \
     published_at, source_name, source_url, labels, created_at, updated_at FROM news_items";

/// The content catalog: labeled news items supplied by the upstream
/// fetch-and-classify pipeline
///
/// The recommendation core only reads from the catalog; ingestion lives
/// here too so validation (id resolution, label cap) happens at one
/// boundary.
#[derive(Clone)]
pub struct Catalog {
    pool: SqlitePool,
}

impl Catalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a news item, fully replacing any existing record with the
    /// same identifier
    ///
    /// Replacement substitutes the label set (no merging with stale labels)
    /// and refreshes `updated_at`; `created_at` of the original record is
    /// preserved. Returns the stored item.
    pub async fn upsert(&self, draft: NewsItemDraft) -> AppResult<NewsItem> {
        let id = draft.resolve_id()?;
        let labels = normalize_labels(&draft.labels);
        let labels_json = serde_json::to_string(&labels)
            .map_err(|e| AppError::Internal(format!("Label serialization failed: {}", e)))?;
        let now = format_ts(Utc::now());

        sqlx::query(
            r#"
            INSERT INTO news_items
                (news_id, title, description, body, url, image_url,
                 published_at, source_name, source_url, labels, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(news_id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                body = excluded.body,
                url = excluded.url,
                image_url = excluded.image_url,
                published_at = excluded.published_at,
                source_name = excluded.source_name,
                source_url = excluded.source_url,
                labels = excluded.labels,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&id)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(&draft.body)
        .bind(&draft.url)
        .bind(&draft.image_url)
        .bind(draft.published_at.map(format_ts))
        .bind(&draft.source_name)
        .bind(&draft.source_url)
        .bind(&labels_json)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        tracing::debug!(news_id = %id, label_count = labels.len(), "Catalog item stored");

        self.get(&id).await?.ok_or_else(|| {
            AppError::Internal(format!("Item {} vanished immediately after upsert", id))
        })
    }

    /// Inserts a batch of items, returning how many were admitted
    ///
    /// Drafts that fail boundary validation are skipped with a warning;
    /// storage failures abort the batch.
    pub async fn upsert_batch(&self, drafts: Vec<NewsItemDraft>) -> AppResult<usize> {
        let mut stored = 0;
        for draft in drafts {
            match self.upsert(draft).await {
                Ok(_) => stored += 1,
                Err(e) if e.is_client_error() => {
                    tracing::warn!(error = %e, "Skipping invalid news item draft");
                }
                Err(e) => return Err(e),
            }
        }
        tracing::info!(stored, "Catalog batch ingested");
        Ok(stored)
    }

    /// Looks up a single item by id
    pub async fn get(&self, news_id: &str) -> AppResult<Option<NewsItem>> {
        let row = sqlx::query_as::<_, ItemRow>(&format!("{SELECT_ITEM} WHERE news_id = ?"))
            .bind(news_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(ItemRow::into_item).transpose()
    }

    pub async fn contains(&self, news_id: &str) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM news_items WHERE news_id = ?")
            .bind(news_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    /// All items, newest published first; `None` returns the whole catalog
    pub async fn all(&self, limit: Option<i64>) -> AppResult<Vec<NewsItem>> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "{SELECT_ITEM} ORDER BY published_at DESC, news_id ASC LIMIT ?"
        ))
        .bind(limit.unwrap_or(-1))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ItemRow::into_item).collect()
    }

    /// Items carrying the given category label, newest published first
    pub async fn by_label(&self, label: &str) -> AppResult<Vec<NewsItem>> {
        // Labels are stored as a JSON array string; matching the quoted
        // label is enough and keeps the query on one indexed table.
        let pattern = format!("%\"{}\"%", label);
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "{SELECT_ITEM} WHERE labels LIKE ? ORDER BY published_at DESC, news_id ASC"
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ItemRow::into_item).collect()
    }

    pub async fn count(&self) -> AppResult<i64> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM news_items")
            .fetch_one(&self.pool)
            .await?)
    }

    /// Deletes items published (or, when unpublished, created) before the
    /// cutoff, returning how many were removed
    ///
    /// Interactions referencing pruned items stay in the log; readers skip
    /// them when resolving against the catalog.
    pub async fn prune_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let cutoff = format_ts(cutoff);
        let result = sqlx::query(
            "DELETE FROM news_items \
             WHERE (published_at IS NOT NULL AND published_at < ?) \
                OR (published_at IS NULL AND created_at < ?)",
        )
        .bind(&cutoff)
        .bind(&cutoff)
        .execute(&self.pool)
        .await?;

        let removed = result.rows_affected();
        if removed > 0 {
            tracing::info!(removed, %cutoff, "Pruned stale catalog items");
        }
        Ok(removed)
    }
}
