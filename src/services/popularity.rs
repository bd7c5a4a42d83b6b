use std::collections::HashSet;

use crate::{
    error::AppResult,
    models::NewsItem,
    services::{Catalog, InteractionStore},
};

/// Ranks items by global engagement count
///
/// Serves as the recommendation fallback when a user has no preference
/// signal, and as a "trending" surface in its own right.
#[derive(Clone)]
pub struct PopularityRanker {
    store: InteractionStore,
    catalog: Catalog,
}

impl PopularityRanker {
    pub fn new(store: InteractionStore, catalog: Catalog) -> Self {
        Self { store, catalog }
    }

    /// The most engaged-with items, excluding the given ids
    ///
    /// Scans the full popularity aggregate before filtering so exclusions
    /// cannot starve the result. Ids whose item has been removed from the
    /// catalog are skipped silently: a log entry can outlive its item.
    pub async fn top(&self, limit: usize, exclude: &HashSet<String>) -> AppResult<Vec<NewsItem>> {
        let ranked = self.store.top_popular(None).await?;

        let mut items = Vec::with_capacity(limit);
        for (news_id, count) in ranked {
            if items.len() == limit {
                break;
            }
            if exclude.contains(&news_id) {
                continue;
            }
            match self.catalog.get(&news_id).await? {
                Some(item) => items.push(item),
                None => {
                    tracing::warn!(news_id = %news_id, count, "Skipping orphaned popular item");
                }
            }
        }

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::create_memory_pool,
        models::{InteractionKind, NewsItemDraft},
    };

    async fn setup() -> (Catalog, InteractionStore, PopularityRanker) {
        let pool = create_memory_pool().await.unwrap();
        let catalog = Catalog::new(pool.clone());
        let store = InteractionStore::new(pool);
        let ranker = PopularityRanker::new(store.clone(), catalog.clone());
        (catalog, store, ranker)
    }

    async fn seed(catalog: &Catalog, id: &str) {
        catalog
            .upsert(NewsItemDraft {
                id: Some(id.to_string()),
                title: format!("Story {}", id),
                ..Default::default()
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_top_orders_by_engagement_and_respects_limit() {
        let (catalog, store, ranker) = setup().await;
        for id in ["a1", "a2", "a3"] {
            seed(&catalog, id).await;
        }
        for _ in 0..3 {
            store.record("u1", "a2", InteractionKind::Click).await.unwrap();
        }
        store.record("u1", "a1", InteractionKind::Click).await.unwrap();
        store.record("u2", "a1", InteractionKind::Click).await.unwrap();
        store.record("u2", "a3", InteractionKind::Click).await.unwrap();

        let top = ranker.top(2, &HashSet::new()).await.unwrap();
        let ids: Vec<&str> = top.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a2", "a1"]);
    }

    #[tokio::test]
    async fn test_top_excludes_given_ids() {
        let (catalog, store, ranker) = setup().await;
        for id in ["a1", "a2"] {
            seed(&catalog, id).await;
        }
        store.record("u1", "a1", InteractionKind::Click).await.unwrap();
        store.record("u1", "a2", InteractionKind::Click).await.unwrap();

        let exclude: HashSet<String> = ["a1".to_string()].into_iter().collect();
        let top = ranker.top(10, &exclude).await.unwrap();
        let ids: Vec<&str> = top.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a2"]);
    }

    #[tokio::test]
    async fn test_top_skips_items_removed_from_catalog() {
        let (catalog, store, ranker) = setup().await;
        for id in ["a1", "a2"] {
            seed(&catalog, id).await;
        }
        for _ in 0..5 {
            store.record("u1", "a1", InteractionKind::Click).await.unwrap();
        }
        store.record("u1", "a2", InteractionKind::Click).await.unwrap();

        // a1 leaves the catalog but keeps its events.
        catalog
            .prune_older_than(chrono::Utc::now() + chrono::Duration::days(1))
            .await
            .unwrap();
        seed(&catalog, "a2").await;

        let top = ranker.top(10, &HashSet::new()).await.unwrap();
        let ids: Vec<&str> = top.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a2"]);
    }
}
