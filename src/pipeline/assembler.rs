//! Assembles one finished post per topic.

use std::sync::Arc;

use chrono::Utc;
use regex::Regex;
use tracing::debug;

use crate::llm::TextGenerator;
use crate::models::{slugify, Post, Topic};

use super::generator::SectionGenerator;
use super::retry::RetryPolicy;

/// Per-topic assembly: outline, concurrent section fan-out with ordered
/// gather, sources generated alongside, then cleanup and cost aggregation.
/// Never fails; every internal failure has already degraded to a skeleton,
/// placeholder, or empty list by the time it reaches assembly.
pub struct PostAssembler {
    generator: SectionGenerator,
}

impl PostAssembler {
    pub fn new(backend: Arc<dyn TextGenerator>, policy: RetryPolicy) -> Self {
        Self {
            generator: SectionGenerator::new(backend, policy),
        }
    }

    /// Produce the post for one topic.
    pub async fn assemble(&self, topic: &Topic) -> Post {
        let outline = self.generator.generate_outline(topic).await;
        debug!(topic = %topic.idea, sections = outline.sections.len(), "outline ready");

        // Sections fan out concurrently; join_all gathers them back in
        // outline order, not completion order. Sources run alongside so
        // they never block section generation.
        let sections = futures::future::join_all(outline.sections.iter().map(|section| {
            self.generator.generate_section(
                topic,
                &outline.title,
                &section.heading,
                &section.subheadings,
            )
        }));
        let (results, sources) = tokio::join!(sections, self.generator.generate_sources(topic));

        let total_tokens: u64 = results.iter().map(|r| r.tokens_consumed).sum();
        let content = results
            .iter()
            .zip(&outline.sections)
            .map(|(result, section)| clean_section(&result.content, &section.heading))
            .collect::<Vec<_>>()
            .join("\n\n");

        Post {
            slug: slugify(&outline.title),
            title: outline.title,
            date: Utc::now().date_naive().to_string(),
            content,
            sources,
            // The backend reports one combined token count per call, so the
            // same total feeds both pricing terms. Fixed billing rule;
            // changing it would change observable output.
            cost: compute_cost(total_tokens, total_tokens),
        }
    }
}

/// Normalize one section body: heading lines lose any redundant
/// `Section N:` prefix and collapse to a single markdown heading marker,
/// links pointing at the literal `null` placeholder are unwrapped to their
/// text, and a missing leading heading is restored from the outline.
fn clean_section(content: &str, heading: &str) -> String {
    let section_prefix = Regex::new(r"(?i)^section\s+\d+\s*[:.\-]?\s*").ok();
    let null_link = Regex::new(r"\[([^\]]*)\]\(null\)").ok();

    let mut lines = Vec::new();
    for line in content.lines() {
        if let Some(text) = line.trim_start().strip_prefix('#') {
            let mut text = text.trim_start_matches('#').trim().to_string();
            if let Some(re) = &section_prefix {
                text = re.replace(&text, "").to_string();
            }
            lines.push(format!("## {}", text));
        } else {
            lines.push(line.to_string());
        }
    }
    let mut cleaned = lines.join("\n").trim().to_string();

    if let Some(re) = &null_link {
        cleaned = re.replace_all(&cleaned, "$1").to_string();
    }

    if !cleaned.starts_with("## ") {
        cleaned = format!("## {}\n\n{}", heading, cleaned);
    }
    cleaned
}

/// Aggregate cost for a post: `in/1000 * 0.03 + out/1000 * 0.06`, floored
/// at 0.01, rendered with up to four fractional digits (trailing zeros
/// trimmed, two digits minimum).
pub fn compute_cost(input_tokens: u64, output_tokens: u64) -> String {
    let cost = (input_tokens as f64 / 1000.0) * 0.03 + (output_tokens as f64 / 1000.0) * 0.06;
    let cost = cost.max(0.01);
    let mut formatted = format!("{:.4}", cost);
    if let Some(dot) = formatted.find('.') {
        while formatted.len() - dot - 1 > 2 && formatted.ends_with('0') {
            formatted.pop();
        }
    }
    formatted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Completion, LlmError};
    use crate::pipeline::retry::is_placeholder;
    use async_trait::async_trait;

    #[test]
    fn test_cost_formula() {
        assert_eq!(compute_cost(1000, 1000), "0.09");
        assert_eq!(compute_cost(0, 0), "0.01");
        assert_eq!(compute_cost(100, 100), "0.01");
        assert_eq!(compute_cost(12_000, 12_000), "1.08");
        assert_eq!(compute_cost(10_000, 10_000), "0.90");
    }

    #[test]
    fn test_clean_section_strips_section_prefix() {
        let cleaned = clean_section("### Section 2: Background\n\nBody text.", "Background");
        assert!(cleaned.starts_with("## Background"));
        assert!(!cleaned.contains("Section 2"));
    }

    #[test]
    fn test_clean_section_restores_missing_heading() {
        let cleaned = clean_section("Just body text.", "Background");
        assert_eq!(cleaned, "## Background\n\nJust body text.");
    }

    #[test]
    fn test_clean_section_unwraps_null_links() {
        let cleaned = clean_section("## H\n\nSee [the study](null) for data.", "H");
        assert!(cleaned.contains("See the study for data."));
        assert!(!cleaned.contains("(null)"));
        // Real links survive.
        let kept = clean_section("## H\n\n[ok](https://example.com)", "H");
        assert!(kept.contains("[ok](https://example.com)"));
    }

    struct ShortOutputBackend;

    #[async_trait]
    impl TextGenerator for ShortOutputBackend {
        async fn generate(&self, _prompt: &str) -> Result<Completion, LlmError> {
            Ok(Completion::new("too short".to_string(), Some(2)))
        }
    }

    #[tokio::test]
    async fn test_degraded_post_costs_exactly_the_floor() {
        let assembler = PostAssembler::new(
            Arc::new(ShortOutputBackend),
            RetryPolicy {
                max_retries: 2,
                retry_delay_ms: 0,
            },
        );
        let topic = Topic::new("Topic that always fails", None).unwrap();
        let post = assembler.assemble(&topic).await;

        // Outline fell back to the skeleton, every section is a placeholder,
        // sources are empty, and the cost hit the floor.
        assert_eq!(post.title, "Topic that always fails");
        assert_eq!(post.cost, "0.01");
        assert!(post.sources.is_empty());
        let first_body = post
            .content
            .lines()
            .find(|l| !l.is_empty() && !l.starts_with("## "))
            .unwrap();
        assert!(is_placeholder(first_body));
        assert_eq!(post.slug, "topic-that-always-fails");
    }
}
