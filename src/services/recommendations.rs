use std::collections::BTreeMap;

use crate::{
    error::AppResult,
    models::NewsItem,
    services::{Catalog, InteractionStore, PopularityRanker, PreferenceEngine},
};

/// Produces ranked, personalized recommendation lists
///
/// Pure content-based filtering: a user's ranking depends only on their own
/// history and the catalog, never on other users' interactions, which keeps
/// the computation deterministic and linear in catalog size.
#[derive(Clone)]
pub struct Recommender {
    catalog: Catalog,
    store: InteractionStore,
    preferences: PreferenceEngine,
    popularity: PopularityRanker,
}

impl Recommender {
    pub fn new(
        catalog: Catalog,
        store: InteractionStore,
        preferences: PreferenceEngine,
        popularity: PopularityRanker,
    ) -> Self {
        Self {
            catalog,
            store,
            preferences,
            popularity,
        }
    }

    /// Ranked unseen items for the user, at most `limit` of them
    ///
    /// Items the user has already engaged with never appear. Users with no
    /// preference signal get the global popularity ranking instead.
    ///
    /// Ranking is fully deterministic: descending profile score, then
    /// descending publication time (unknown last), then ascending id.
    pub async fn recommend(&self, user_id: &str, limit: usize) -> AppResult<Vec<NewsItem>> {
        let profile = self.preferences.preferences(user_id).await?;
        let seen = self.store.clicked_set(user_id).await?;

        if profile.is_empty() {
            tracing::info!(user_id = %user_id, "No preference signal, using popularity fallback");
            return self.popularity.top(limit, &seen).await;
        }

        let mut candidates: Vec<(u64, NewsItem)> = self
            .catalog
            .all(None)
            .await?
            .into_iter()
            .filter(|item| !seen.contains(&item.id))
            .map(|item| (score(&profile, &item), item))
            .collect();

        candidates.sort_by(|(score_a, item_a), (score_b, item_b)| {
            score_b
                .cmp(score_a)
                .then_with(|| item_b.published_at.cmp(&item_a.published_at))
                .then_with(|| item_a.id.cmp(&item_b.id))
        });

        tracing::info!(
            user_id = %user_id,
            candidates = candidates.len(),
            limit,
            "Recommendations ranked"
        );

        Ok(candidates
            .into_iter()
            .take(limit)
            .map(|(_, item)| item)
            .collect())
    }
}

/// Sum of profile weights over the item's labels
///
/// Labels outside the profile contribute nothing; an unlabeled item scores
/// zero and sorts last.
fn score(profile: &BTreeMap<String, u64>, item: &NewsItem) -> u64 {
    item.labels
        .iter()
        .map(|label| profile.get(label).copied().unwrap_or(0))
        .sum()
}
