use std::collections::HashSet;

use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    db::{format_ts, parse_ts},
    error::{AppError, AppResult},
    models::{Interaction, InteractionKind},
};

/// Raw `interactions` row
#[derive(sqlx::FromRow)]
struct InteractionRow {
    interaction_id: i64,
    user_id: String,
    news_id: String,
    kind: String,
    created_at: String,
}

impl InteractionRow {
    fn into_interaction(self) -> AppResult<Interaction> {
        Ok(Interaction {
            id: self.interaction_id,
            user_id: self.user_id,
            news_id: self.news_id,
            kind: InteractionKind::parse(&self.kind),
            created_at: parse_ts(&self.created_at)?,
        })
    }
}

/// Append-only log of user engagement events
///
/// `record` is the only mutator; every aggregate (history, popularity,
/// clicked set) is computed from the log at read time, so counts can never
/// drift from the events that back them.
#[derive(Clone)]
pub struct InteractionStore {
    pool: SqlitePool,
}

impl InteractionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Appends an engagement event and returns it
    ///
    /// Fails with `NotFound` when the item is not in the catalog; the
    /// existence check and the insert share one transaction so the
    /// invariant holds under concurrent writers. Repeated engagement with
    /// the same item is valid and raises its popularity each time.
    pub async fn record(
        &self,
        user_id: &str,
        news_id: &str,
        kind: InteractionKind,
    ) -> AppResult<Interaction> {
        // An immediate transaction takes the write lock before the existence
        // check, so overlapping writers queue on the busy timeout instead of
        // failing the read-to-write upgrade with SQLITE_BUSY.
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM news_items WHERE news_id = ?")
            .bind(news_id)
            .fetch_one(&mut *tx)
            .await?;
        if exists == 0 {
            return Err(AppError::NotFound(format!(
                "News item {} is not in the catalog",
                news_id
            )));
        }

        // Persist at storage precision so the returned event compares equal
        // to what a subsequent read observes.
        let stored_ts = format_ts(Utc::now());
        let result = sqlx::query(
            "INSERT INTO interactions (user_id, news_id, kind, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(news_id)
        .bind(kind.as_str())
        .bind(&stored_ts)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            user_id = %user_id,
            news_id = %news_id,
            kind = kind.as_str(),
            "Interaction recorded"
        );

        Ok(Interaction {
            id: result.last_insert_rowid(),
            user_id: user_id.to_string(),
            news_id: news_id.to_string(),
            kind,
            created_at: parse_ts(&stored_ts)?,
        })
    }

    /// The user's events, most recent first
    ///
    /// Unknown users get an empty history, not an error. `None` returns
    /// everything.
    pub async fn history(&self, user_id: &str, limit: Option<i64>) -> AppResult<Vec<Interaction>> {
        let rows = sqlx::query_as::<_, InteractionRow>(
            "SELECT interaction_id, user_id, news_id, kind, created_at FROM interactions \
             WHERE user_id = ? ORDER BY created_at DESC, interaction_id DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(limit.unwrap_or(-1))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(InteractionRow::into_interaction).collect()
    }

    /// Every item id the user has engaged with, regardless of kind
    ///
    /// Used by the recommender for exclusion: any engagement means the user
    /// has already seen the item.
    pub async fn clicked_set(&self, user_id: &str) -> AppResult<HashSet<String>> {
        let ids: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT news_id FROM interactions WHERE user_id = ?")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(ids.into_iter().collect())
    }

    /// Number of events referencing an item; zero if none
    pub async fn popularity_count(&self, news_id: &str) -> AppResult<i64> {
        Ok(
            sqlx::query_scalar("SELECT COUNT(*) FROM interactions WHERE news_id = ?")
                .bind(news_id)
                .fetch_one(&self.pool)
                .await?,
        )
    }

    /// Item ids with their engagement counts, most engaged first
    ///
    /// Ties break toward the item engaged with most recently (freshness
    /// among equals), then ascending id for determinism. `None` returns the
    /// full aggregate.
    pub async fn top_popular(&self, limit: Option<i64>) -> AppResult<Vec<(String, i64)>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT news_id, COUNT(*) AS clicks FROM interactions \
             GROUP BY news_id \
             ORDER BY clicks DESC, MAX(created_at) DESC, news_id ASC \
             LIMIT ?",
        )
        .bind(limit.unwrap_or(-1))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Total events in the log
    pub async fn event_count(&self) -> AppResult<i64> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM interactions")
            .fetch_one(&self.pool)
            .await?)
    }

    /// Distinct users present in the log
    pub async fn unique_users(&self) -> AppResult<i64> {
        Ok(
            sqlx::query_scalar("SELECT COUNT(DISTINCT user_id) FROM interactions")
                .fetch_one(&self.pool)
                .await?,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::create_memory_pool, models::NewsItemDraft, services::Catalog};

    async fn setup() -> (Catalog, InteractionStore) {
        let pool = create_memory_pool().await.unwrap();
        let catalog = Catalog::new(pool.clone());
        for id in ["a1", "a2", "a3"] {
            catalog
                .upsert(NewsItemDraft {
                    id: Some(id.to_string()),
                    title: format!("Story {}", id),
                    ..Default::default()
                })
                .await
                .unwrap();
        }
        (catalog, InteractionStore::new(pool))
    }

    #[tokio::test]
    async fn test_record_unknown_item_is_rejected_and_not_persisted() {
        let (_, store) = setup().await;
        let err = store
            .record("u1", "missing-id", InteractionKind::Click)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(store.popularity_count("missing-id").await.unwrap(), 0);
        assert_eq!(store.event_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_popularity_count_matches_record_calls() {
        let (_, store) = setup().await;
        for n in 1..=4 {
            store.record("u1", "a1", InteractionKind::Click).await.unwrap();
            assert_eq!(store.popularity_count("a1").await.unwrap(), n);
        }
    }

    #[tokio::test]
    async fn test_duplicate_events_are_accepted() {
        let (_, store) = setup().await;
        let first = store.record("u1", "a1", InteractionKind::Click).await.unwrap();
        let second = store.record("u1", "a1", InteractionKind::Click).await.unwrap();
        assert!(second.id > first.id);
        assert_eq!(store.popularity_count("a1").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_history_is_most_recent_first_and_bounded() {
        let (_, store) = setup().await;
        store.record("u1", "a1", InteractionKind::Click).await.unwrap();
        store.record("u1", "a2", InteractionKind::View).await.unwrap();
        store.record("u1", "a3", InteractionKind::Click).await.unwrap();

        let full = store.history("u1", None).await.unwrap();
        assert_eq!(full.len(), 3);
        assert_eq!(full[0].news_id, "a3");
        assert_eq!(full[2].news_id, "a1");

        let bounded = store.history("u1", Some(2)).await.unwrap();
        assert_eq!(bounded.len(), 2);
        assert_eq!(bounded[0].news_id, "a3");

        assert!(store.history("nobody", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clicked_set_covers_all_kinds() {
        let (_, store) = setup().await;
        store.record("u1", "a1", InteractionKind::Click).await.unwrap();
        store.record("u1", "a2", InteractionKind::Like).await.unwrap();
        store.record("u2", "a3", InteractionKind::Click).await.unwrap();

        let seen = store.clicked_set("u1").await.unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen.contains("a1") && seen.contains("a2"));
    }

    #[tokio::test]
    async fn test_top_popular_orders_by_count_then_recency() {
        let (_, store) = setup().await;
        // a1 twice (early), a2 twice (later), a3 once
        store.record("u1", "a1", InteractionKind::Click).await.unwrap();
        store.record("u2", "a1", InteractionKind::Click).await.unwrap();
        store.record("u1", "a2", InteractionKind::Click).await.unwrap();
        store.record("u2", "a2", InteractionKind::Click).await.unwrap();
        store.record("u3", "a3", InteractionKind::Click).await.unwrap();

        let top = store.top_popular(None).await.unwrap();
        assert_eq!(top.len(), 3);
        // a2's latest event is newer than a1's, so it wins the tie
        assert_eq!(top[0], ("a2".to_string(), 2));
        assert_eq!(top[1], ("a1".to_string(), 2));
        assert_eq!(top[2], ("a3".to_string(), 1));

        let top_one = store.top_popular(Some(1)).await.unwrap();
        assert_eq!(top_one.len(), 1);
    }
}
