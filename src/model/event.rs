//! News events synced from the official feed

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A translated news item.
///
/// `external_id` is the feed's guid; it is unique so reruns of the sync job
/// never insert the same item twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub id: i64,
    pub external_id: String,
    pub title: String,
    /// Sanitized, translated HTML
    pub content: String,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn new(external_id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: 0,
            external_id: external_id.into(),
            title: title.into(),
            content: content.into(),
            original_title: None,
            link: None,
            published_at: None,
            created_at: Utc::now(),
        }
    }
}
