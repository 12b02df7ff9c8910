use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

/// The slice of a title the homepage needs to render a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaSummary {
    pub id: u64,
    pub media_type: MediaType,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f32>,
}

/// Homepage sections in display order. Saved and loaded as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomepageSnapshot {
    pub sections: IndexMap<String, Vec<MediaSummary>>,
    pub captured_at: DateTime<Utc>,
}

impl HomepageSnapshot {
    /// An empty snapshot captured now.
    pub fn now() -> Self {
        Self {
            sections: IndexMap::new(),
            captured_at: Utc::now(),
        }
    }

    /// Appends or replaces a section, keeping its position if it existed.
    pub fn with_section(mut self, name: impl Into<String>, items: Vec<MediaSummary>) -> Self {
        self.sections.insert(name.into(), items);
        self
    }
}

/// Asset URLs per route, as last seen by the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestSnapshot {
    pub routes: IndexMap<String, Vec<String>>,
    pub captured_at: DateTime<Utc>,
}

impl ManifestSnapshot {
    pub fn now() -> Self {
        Self {
            routes: IndexMap::new(),
            captured_at: Utc::now(),
        }
    }
}
