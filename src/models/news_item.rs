use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Maximum number of category labels kept per item
///
/// The upstream classifier emits a ranked label list; only the top three
/// carry enough confidence to be useful, so the catalog boundary caps the
/// stored set there.
pub const MAX_LABELS: usize = 3;

/// A news article with its pre-assigned category labels
///
/// Owned by the catalog. The recommendation core treats an item as
/// immutable for the duration of a single computation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsItem {
    /// Unique, stable identifier
    pub id: String,
    pub title: String,
    pub description: String,
    pub body: String,
    pub url: String,
    pub image_url: String,
    /// Publication time as reported by the source, if known
    pub published_at: Option<DateTime<Utc>>,
    pub source_name: String,
    pub source_url: String,
    /// Ordered category labels, most confident first, at most [`MAX_LABELS`]
    pub labels: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for catalog ingestion
///
/// Upstream fetching/classification hands these over; the catalog resolves
/// the identifier and enforces the label cap before anything is stored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsItemDraft {
    /// Explicit identifier; derived from the URL (or title) when empty
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source_name: String,
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

impl NewsItemDraft {
    /// Resolves the item identifier for this draft
    ///
    /// An explicit id wins. Otherwise the id is derived deterministically
    /// from the source URL (UUIDv5 in the URL namespace), falling back to
    /// the title, so re-ingesting the same article always maps to the same
    /// catalog record.
    pub fn resolve_id(&self) -> AppResult<String> {
        if let Some(id) = self.id.as_deref() {
            if !id.trim().is_empty() {
                return Ok(id.trim().to_string());
            }
        }

        let basis = if !self.url.trim().is_empty() {
            self.url.trim()
        } else if !self.title.trim().is_empty() {
            self.title.trim()
        } else {
            return Err(AppError::InvalidInput(
                "News item draft has no id, url, or title to identify it".to_string(),
            ));
        };

        Ok(Uuid::new_v5(&Uuid::NAMESPACE_URL, basis.as_bytes())
            .simple()
            .to_string())
    }
}

/// Normalizes a classifier label list for storage
///
/// Trims whitespace, drops empties and duplicates (keeping first
/// occurrence, so confidence order survives), and truncates to
/// [`MAX_LABELS`].
pub fn normalize_labels(labels: &[String]) -> Vec<String> {
    let mut seen = Vec::with_capacity(MAX_LABELS);
    for label in labels {
        let label = label.trim();
        if label.is_empty() || seen.iter().any(|s: &String| s == label) {
            continue;
        }
        seen.push(label.to_string());
        if seen.len() == MAX_LABELS {
            break;
        }
    }
    seen
}
