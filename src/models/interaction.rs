use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of engagement event
///
/// Parsing is deliberately liberal: an unrecognized kind degrades to
/// [`InteractionKind::Click`] instead of rejecting the event, because losing
/// a tracking signal costs more than a sloppy taxonomy.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    #[default]
    Click,
    View,
    Like,
    Share,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::Click => "click",
            InteractionKind::View => "view",
            InteractionKind::Like => "like",
            InteractionKind::Share => "share",
        }
    }

    /// Parses a kind string, defaulting unknown values to `Click`
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "click" => InteractionKind::Click,
            "view" => InteractionKind::View,
            "like" => InteractionKind::Like,
            "share" => InteractionKind::Share,
            _ => InteractionKind::Click,
        }
    }
}

/// One record of a user engaging with one news item at one point in time
///
/// Append-only: events are never mutated or deleted by normal operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    /// Monotonic event identifier (storage rowid)
    pub id: i64,
    pub user_id: String,
    pub news_id: String,
    pub kind: InteractionKind,
    pub created_at: DateTime<Utc>,
}

/// Summary of a user's engagement, for the statistics view
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserStats {
    pub user_id: String,
    /// Total events recorded for the user
    pub total_events: i64,
    /// Distinct items the user has engaged with
    pub unique_items: i64,
    /// Highest-weighted category label, if the user has any history
    pub favorite_category: Option<String>,
}
