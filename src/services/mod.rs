mod catalog;
mod interactions;
mod popularity;
mod preferences;
mod recommendations;

pub use catalog::Catalog;
pub use interactions::InteractionStore;
pub use popularity::PopularityRanker;
pub use preferences::PreferenceEngine;
pub use recommendations::Recommender;
