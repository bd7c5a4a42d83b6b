use std::collections::BTreeMap;

use sqlx::SqlitePool;

use crate::{
    db::parse_labels,
    error::AppResult,
    models::UserStats,
};

/// Derives a user's category preference profile from their engagement
/// history
///
/// Profiles are computed fresh from the log on every call and never cached,
/// so they are always consistent with the events behind them.
#[derive(Clone)]
pub struct PreferenceEngine {
    pool: SqlitePool,
}

impl PreferenceEngine {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The user's weighted category profile
    ///
    /// Each event adds one to the weight of every label its item carries
    /// (an item with three labels contributes one to each). Events whose
    /// item has since left the catalog contribute nothing. The map is
    /// sparse: labels the user never engaged with have no entry.
    pub async fn preferences(&self, user_id: &str) -> AppResult<BTreeMap<String, u64>> {
        let label_rows: Vec<String> = sqlx::query_scalar(
            "SELECT ni.labels FROM interactions i \
             JOIN news_items ni ON ni.news_id = i.news_id \
             WHERE i.user_id = ?",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut weights = BTreeMap::new();
        for raw in &label_rows {
            for label in parse_labels(raw)? {
                *weights.entry(label).or_insert(0) += 1;
            }
        }

        tracing::debug!(
            user_id = %user_id,
            events = label_rows.len(),
            categories = weights.len(),
            "Preference profile derived"
        );

        Ok(weights)
    }

    /// The user's highest-weighted category, if they have any
    ///
    /// Ties break toward the lexicographically smallest label so the
    /// answer is reproducible.
    pub async fn favorite_category(&self, user_id: &str) -> AppResult<Option<String>> {
        let weights = self.preferences(user_id).await?;

        // BTreeMap iterates in ascending label order, so keeping the first
        // strict maximum yields the smallest label among ties.
        let mut best: Option<(String, u64)> = None;
        for (label, weight) in weights {
            match &best {
                Some((_, top)) if *top >= weight => {}
                _ => best = Some((label, weight)),
            }
        }
        Ok(best.map(|(label, _)| label))
    }

    /// Engagement totals plus favorite category, for the statistics view
    pub async fn user_stats(&self, user_id: &str) -> AppResult<UserStats> {
        let (total_events, unique_items): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(DISTINCT news_id) FROM interactions WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(UserStats {
            user_id: user_id.to_string(),
            total_events,
            unique_items,
            favorite_category: self.favorite_category(user_id).await?,
        })
    }
}
