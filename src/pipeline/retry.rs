//! Word-count validation with bounded retry around a single generative call.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::llm::TextGenerator;
use crate::models::{word_count, SectionResult};

/// Sentinel prefix marking degraded output substituted after the retry
/// budget is exhausted. Downstream reporting distinguishes placeholder text
/// from genuine content by this prefix.
pub const PLACEHOLDER_PREFIX: &str = "[placeholder]";

/// Retry budget and pacing for one generative step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Attempts per step before substituting a placeholder.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Flat delay between attempts, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    500
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl RetryPolicy {
    fn delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Whether a piece of content is a substituted placeholder rather than
/// genuine generated text.
pub fn is_placeholder(content: &str) -> bool {
    content.trim_start().starts_with(PLACEHOLDER_PREFIX)
}

/// Build the placeholder substituted when all attempts for `label` failed.
/// Deliberately short: its word count doubles as its token cost.
pub fn placeholder_for(label: &str, attempts: u32) -> SectionResult {
    let content = format!(
        "{} Unable to generate \"{}\" after {} attempts; replace this section manually.",
        PLACEHOLDER_PREFIX, label, attempts
    );
    let tokens = word_count(&content) as u64;
    SectionResult {
        content,
        tokens_consumed: tokens,
    }
}

/// Call the backend with `prompt` until `accept` holds for the output's
/// word count or the retry budget runs out. Backend failures (timeouts,
/// malformed responses) count against the same budget instead of
/// propagating. On exhaustion a clearly-marked placeholder is returned, so
/// this function never fails.
pub async fn attempt<F>(
    backend: &dyn TextGenerator,
    prompt: &str,
    label: &str,
    accept: F,
    policy: &RetryPolicy,
) -> SectionResult
where
    F: Fn(usize) -> bool,
{
    let attempts = policy.max_retries.max(1);
    for attempt in 1..=attempts {
        match backend.generate(prompt).await {
            Ok(completion) => {
                let words = word_count(&completion.text);
                if accept(words) {
                    debug!(label, words, attempt, "section accepted");
                    return SectionResult {
                        content: completion.text.trim().to_string(),
                        tokens_consumed: completion.tokens,
                    };
                }
                debug!(label, words, attempt, "section rejected by word count");
            }
            Err(e) => {
                warn!(label, attempt, error = %e, "generation attempt failed");
            }
        }
        if attempt < attempts {
            tokio::time::sleep(policy.delay()).await;
        }
    }

    warn!(label, attempts, "retry budget exhausted, using placeholder");
    placeholder_for(label, attempts)
}
