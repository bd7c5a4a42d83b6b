use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use newsrec::{
    config::Config,
    db::create_pool,
    models::{InteractionKind, NewsItemDraft},
    services::{Catalog, InteractionStore, PopularityRanker, PreferenceEngine, Recommender},
};

/// Demo driver: seeds a few labeled articles, simulates a reader, and
/// prints what the recommendation core derives from their clicks.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let pool = create_pool(&config.database_url).await?;

    let catalog = Catalog::new(pool.clone());
    let store = InteractionStore::new(pool.clone());
    let preferences = PreferenceEngine::new(pool.clone());
    let popularity = PopularityRanker::new(store.clone(), catalog.clone());
    let recommender = Recommender::new(
        catalog.clone(),
        store.clone(),
        preferences.clone(),
        popularity.clone(),
    );

    let seeded = catalog.upsert_batch(sample_items()).await?;
    println!("Catalog holds {} items ({} seeded)", catalog.count().await?, seeded);

    let user_id = format!("demo-{}", Uuid::new_v4());
    for news_id in ["rust-borrowck", "gpu-shortage", "transfer-window"] {
        store.record(&user_id, news_id, InteractionKind::Click).await?;
    }

    println!("\nPreference profile for {}:", user_id);
    for (label, weight) in preferences.preferences(&user_id).await? {
        println!("  {:<12} {}", label, weight);
    }

    let stats = preferences.user_stats(&user_id).await?;
    println!(
        "\n{} events over {} items, favorite category: {}",
        stats.total_events,
        stats.unique_items,
        stats.favorite_category.as_deref().unwrap_or("none")
    );

    println!("\nTrending:");
    for (news_id, count) in store.top_popular(Some(5)).await? {
        println!("  {:>3}  {}", count, news_id);
    }

    println!("\nRecommended for {}:", user_id);
    for item in recommender
        .recommend(&user_id, config.recommendation_limit)
        .await?
    {
        println!("  {}  {:?}", item.title, item.labels);
    }

    Ok(())
}

fn sample_items() -> Vec<NewsItemDraft> {
    let specs: [(&str, &str, &[&str]); 6] = [
        (
            "rust-borrowck",
            "Borrow checker improvements land in stable",
            &["technology"],
        ),
        (
            "gpu-shortage",
            "GPU supply tightens as demand surges",
            &["technology", "finance"],
        ),
        (
            "transfer-window",
            "Transfer window closes with record spending",
            &["sports", "finance"],
        ),
        (
            "chip-ipo",
            "Chip designer prices its IPO above range",
            &["finance", "technology"],
        ),
        (
            "marathon-upset",
            "Outsider takes the city marathon",
            &["sports"],
        ),
        (
            "quiet-firmware",
            "Firmware update silences fan noise complaints",
            &["technology"],
        ),
    ];

    specs
        .into_iter()
        .map(|(id, title, labels)| NewsItemDraft {
            id: Some(id.to_string()),
            title: title.to_string(),
            url: format!("https://news.example.com/{}", id),
            published_at: Some(chrono::Utc::now()),
            labels: labels.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        })
        .collect()
}
