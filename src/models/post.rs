//! Finished posts and the intermediate section results that build them.

use serde::{Deserialize, Serialize};

/// Output of one section generation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionResult {
    /// Generated body text for the section.
    pub content: String,
    /// Tokens the backend reported consuming for this section. Placeholder
    /// sections report their own word count so cost never rounds to zero.
    pub tokens_consumed: u64,
}

/// A cited source attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub name: String,
    pub link: String,
}

/// One finished blog post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub title: String,
    /// ISO calendar date of generation (YYYY-MM-DD).
    pub date: String,
    pub slug: String,
    pub content: String,
    pub sources: Vec<SourceRef>,
    /// Aggregate cost as a decimal string, floor 0.01.
    pub cost: String,
}

/// Derive a URL slug from a title: lowercase, non-word characters stripped,
/// whitespace runs collapsed to single hyphens, repeated hyphens collapsed.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;
    for ch in title.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch);
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_hyphen = true;
        }
        // Other punctuation is dropped entirely.
    }
    slug
}

/// Count whitespace-separated words. Used by the word-count acceptance
/// policy and as the token fallback when the backend reports no usage.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
