mod interaction;
mod news_item;

pub use interaction::{Interaction, InteractionKind, UserStats};
pub use news_item::{normalize_labels, NewsItem, NewsItemDraft, MAX_LABELS};
