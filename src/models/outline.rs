//! Post outlines produced by the outline generation step.

use serde::{Deserialize, Serialize};

/// One outline section: a heading plus its subheadings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineSection {
    pub heading: String,
    #[serde(default)]
    pub subheadings: Vec<String>,
}

/// Structured skeleton guiding section generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outline {
    pub title: String,
    pub sections: Vec<OutlineSection>,
}

impl Outline {
    /// Whether the outline is usable: a non-empty title and at least one
    /// section with a non-empty heading.
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty()
            && !self.sections.is_empty()
            && self.sections.iter().all(|s| !s.heading.trim().is_empty())
    }

    /// Fixed five-section skeleton used when outline generation fails or
    /// returns something unusable. Carries the topic idea as the title.
    pub fn default_skeleton(idea: &str) -> Self {
        let section = |heading: &str, subs: &[&str]| OutlineSection {
            heading: heading.to_string(),
            subheadings: subs.iter().map(|s| s.to_string()).collect(),
        };
        Self {
            title: idea.to_string(),
            sections: vec![
                section("Introduction", &["Why this matters", "What to expect"]),
                section("Background", &["Key concepts", "Current landscape"]),
                section("Main Analysis", &["Core arguments", "Supporting evidence"]),
                section("Practical Takeaways", &["Action steps", "Common pitfalls"]),
                section("Conclusion", &["Summary", "Looking ahead"]),
            ],
        }
    }

    /// Word-count floor for a section body under this heading: introductions
    /// and conclusions are allowed to be shorter than body sections.
    pub fn min_words_for(heading: &str) -> usize {
        let h = heading.to_lowercase();
        if h.contains("introduction") || h.contains("conclusion") {
            150
        } else {
            300
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_skeleton_shape() {
        let outline = Outline::default_skeleton("Topic X");
        assert_eq!(outline.title, "Topic X");
        assert_eq!(outline.sections.len(), 5);
        assert_eq!(outline.sections[0].heading, "Introduction");
        assert_eq!(outline.sections[4].heading, "Conclusion");
        assert!(outline.is_valid());
    }

    #[test]
    fn test_validity() {
        let empty = Outline {
            title: "T".into(),
            sections: vec![],
        };
        assert!(!empty.is_valid());

        let blank_title = Outline {
            title: "  ".into(),
            sections: vec![OutlineSection {
                heading: "H".into(),
                subheadings: vec![],
            }],
        };
        assert!(!blank_title.is_valid());
    }

    #[test]
    fn test_word_count_policy() {
        assert_eq!(Outline::min_words_for("Introduction"), 150);
        assert_eq!(Outline::min_words_for("Conclusion"), 150);
        assert_eq!(Outline::min_words_for("Background"), 300);
        assert_eq!(Outline::min_words_for("Main Analysis"), 300);
    }
}
