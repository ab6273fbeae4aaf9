//! Content rows and the metadata generated for them.

use serde::{Deserialize, Serialize};

/// A row of the content table.
///
/// Only `metakey` and `metadesc` are ever written back; the remaining
/// columns are read as generation input.
#[derive(Debug, Clone, PartialEq, Eq, Default, sqlx::FromRow)]
pub struct ContentRecord {
    pub id: i64,
    pub title: String,
    pub fulltext: Option<String>,
    pub introtext: Option<String>,
    pub metakey: Option<String>,
    pub metadesc: Option<String>,
    /// Publication flag. `None` counts as published.
    pub state: Option<i64>,
}

impl ContentRecord {
    /// Returns `false` only for an explicit `state = 0`.
    pub fn is_published(&self) -> bool {
        self.state.unwrap_or(1) != 0
    }

    /// Title shortened to `max` characters for progress output.
    pub fn short_title(&self, max: usize) -> String {
        if self.title.chars().count() <= max {
            self.title.clone()
        } else {
            let truncated: String = self.title.chars().take(max).collect();
            format!("{}...", truncated)
        }
    }
}

/// Keywords and description returned by the generator.
///
/// Deserialization is strict: both fields are required and any other field
/// is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratedMeta {
    pub meta_keywords: String,
    pub meta_description: String,
}
