//! Outline, section, and source generation steps for one topic.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::llm::TextGenerator;
use crate::models::{Outline, SectionResult, SourceRef, Topic};

use super::lenient;
use super::retry::{self, RetryPolicy};

/// Prompt for the outline step. Expects a JSON object back.
const OUTLINE_PROMPT: &str = r#"You are an experienced content editor planning a blog post.

Create an outline for a blog post about: {idea}
{reference}
Respond with ONLY a JSON object in exactly this shape, no prose before or after:

{
  "title": "An engaging post title",
  "sections": [
    {"heading": "Introduction", "subheadings": ["hook", "what the reader will learn"]},
    {"heading": "First main point", "subheadings": ["supporting detail", "example"]},
    {"heading": "Conclusion", "subheadings": ["summary", "call to action"]}
  ]
}

Use 4 to 6 sections. The first must be an Introduction and the last a Conclusion."#;

/// Prompt for one body section.
const SECTION_PROMPT: &str = r#"You are writing one section of a blog post titled "{title}" about: {idea}

Write the section "{heading}" covering these points: {subheadings}

Requirements:
- At least {min_words} words of flowing, readable prose in markdown
- Start with the section heading as a markdown heading line
- No preamble, no meta commentary, just the section content"#;

/// Prompt for the source list. Expects a JSON array back.
const SOURCES_PROMPT: &str = r#"List 3 to 5 reputable sources a reader could consult to learn more about: {idea}

Respond with ONLY a JSON array in exactly this shape:

[
  {"name": "Source name", "link": "https://example.com/page"}
]"#;

/// Drives the individual generation steps for one topic. Every method
/// degrades instead of failing: a bad outline becomes the default skeleton,
/// a bad section becomes a placeholder, a bad source list becomes empty.
pub struct SectionGenerator {
    backend: Arc<dyn TextGenerator>,
    policy: RetryPolicy,
}

impl SectionGenerator {
    pub fn new(backend: Arc<dyn TextGenerator>, policy: RetryPolicy) -> Self {
        Self { backend, policy }
    }

    /// Generate the post outline. One call, one JSON-shaped response
    /// expected; any backend or parse failure falls back to the fixed
    /// five-section skeleton carrying the topic as the title.
    pub async fn generate_outline(&self, topic: &Topic) -> Outline {
        let reference = match &topic.reference_link {
            Some(link) => format!("Use this reference for context: {}\n", link),
            None => String::new(),
        };
        let prompt = OUTLINE_PROMPT
            .replace("{idea}", &topic.idea)
            .replace("{reference}", &reference);

        let raw = match self.backend.generate(&prompt).await {
            Ok(completion) => completion.text,
            Err(e) => {
                warn!(topic = %topic.idea, error = %e, "outline generation failed");
                return Outline::default_skeleton(&topic.idea);
            }
        };

        match lenient::parse_json::<Outline>(&raw) {
            Some(outline) if outline.is_valid() => outline,
            _ => {
                warn!(topic = %topic.idea, "unusable outline, using default skeleton");
                Outline::default_skeleton(&topic.idea)
            }
        }
    }

    /// Generate one section body, validated against the heading-specific
    /// word-count policy with bounded retry.
    pub async fn generate_section(
        &self,
        topic: &Topic,
        title: &str,
        heading: &str,
        subheadings: &[String],
    ) -> SectionResult {
        let min_words = Outline::min_words_for(heading);
        let subheads = if subheadings.is_empty() {
            "the heading topic".to_string()
        } else {
            subheadings.join(", ")
        };
        let prompt = SECTION_PROMPT
            .replace("{title}", title)
            .replace("{idea}", &topic.idea)
            .replace("{heading}", heading)
            .replace("{subheadings}", &subheads)
            .replace("{min_words}", &min_words.to_string());

        retry::attempt(
            self.backend.as_ref(),
            &prompt,
            heading,
            |words| words >= min_words,
            &self.policy,
        )
        .await
    }

    /// Generate the source list. Expects a JSON array; on parse failure
    /// scrapes URL-shaped substrings from the raw text; gives up with an
    /// empty list (never an error).
    pub async fn generate_sources(&self, topic: &Topic) -> Vec<SourceRef> {
        let prompt = SOURCES_PROMPT.replace("{idea}", &topic.idea);
        let raw = match self.backend.generate(&prompt).await {
            Ok(completion) => completion.text,
            Err(e) => {
                warn!(topic = %topic.idea, error = %e, "source generation failed");
                return Vec::new();
            }
        };

        if let Some(sources) = lenient::parse_json::<Vec<SourceRef>>(&raw) {
            let sources: Vec<SourceRef> = sources
                .into_iter()
                .filter(|s| !s.name.trim().is_empty() && !s.link.trim().is_empty())
                .take(5)
                .collect();
            if !sources.is_empty() {
                return sources;
            }
        }

        debug!(topic = %topic.idea, "source list did not parse, scraping URLs");
        lenient::extract_urls(&raw)
            .into_iter()
            .take(5)
            .map(|link| {
                let name = url::Url::parse(&link)
                    .ok()
                    .and_then(|u| u.host_str().map(str::to_string))
                    .unwrap_or_else(|| link.clone());
                SourceRef { name, link }
            })
            .collect()
    }
}
