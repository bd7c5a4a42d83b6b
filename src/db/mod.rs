mod sqlite;

pub use sqlite::{create_memory_pool, create_pool};

pub(crate) use sqlite::{format_ts, parse_labels, parse_ts};
