//! Input topics requesting one generated post each.

use serde::{Deserialize, Serialize};

/// One unit of work: a blog idea plus an optional reference link.
///
/// The idea string doubles as the correlation key in progress events, so it
/// must be non-empty after trimming. Construction through [`Topic::new`]
/// enforces that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    /// The blog idea to write about.
    pub idea: String,
    /// Optional reference URL supplied alongside the idea.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_link: Option<String>,
}

impl Topic {
    /// Create a topic, trimming the idea. Returns `None` for blank ideas.
    pub fn new(idea: &str, reference_link: Option<&str>) -> Option<Self> {
        let idea = idea.trim();
        if idea.is_empty() {
            return None;
        }
        let reference_link = reference_link
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);
        Some(Self {
            idea: idea.to_string(),
            reference_link,
        })
    }
}
