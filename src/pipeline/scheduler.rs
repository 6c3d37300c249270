//! Batch scheduling of per-topic generation jobs.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::llm::TextGenerator;
use crate::models::{Post, Topic};

use super::assembler::PostAssembler;
use super::cancel::CancelToken;
use super::progress::{ProgressEvent, ProgressSender};
use super::retry::RetryPolicy;

/// Scheduler knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Topics per batch chunk.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Pacing delay between topics, in milliseconds. Keeps a long topic
    /// list from hammering the backend; not a correctness requirement.
    #[serde(default = "default_topic_delay_ms")]
    pub topic_delay_ms: u64,
    /// Retry budget for individual generation steps.
    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_batch_size() -> usize {
    5
}
fn default_topic_delay_ms() -> u64 {
    300
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            topic_delay_ms: default_topic_delay_ms(),
            retry: RetryPolicy::default(),
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every topic was processed.
    Completed,
    /// The cancellation token aborted the run early.
    Cancelled,
}

/// Result of a run: the posts completed before any cancellation, in input
/// order, plus how the run ended. Callers must check `status` rather than
/// assume the whole topic list was processed.
#[derive(Debug)]
pub struct RunOutcome {
    pub posts: Vec<Post>,
    pub status: RunStatus,
}

/// Drives assembly across an ordered topic list in contiguous batches,
/// emitting progress events and polling the cancellation token between
/// topics.
///
/// Topics inside a chunk run sequentially, so the output order is the input
/// order by construction and the backend sees at most one topic's section
/// fan-out in flight at a time. A topic whose assembly is already under way
/// when cancellation arrives is allowed to finish and is included in the
/// outcome; no topic after it starts.
pub struct BatchScheduler {
    assembler: PostAssembler,
    config: SchedulerConfig,
}

impl BatchScheduler {
    pub fn new(backend: Arc<dyn TextGenerator>, config: SchedulerConfig) -> Self {
        Self {
            assembler: PostAssembler::new(backend, config.retry.clone()),
            config,
        }
    }

    /// Run the batch. Resets the cancellation token first: a stale `true`
    /// left by a previously aborted run must not abort this one.
    pub async fn run(
        &self,
        topics: &[Topic],
        progress: &ProgressSender,
        cancel: &CancelToken,
    ) -> RunOutcome {
        cancel.reset();

        let batch_size = self.config.batch_size.max(1);
        let mut posts = Vec::with_capacity(topics.len());

        for (chunk_index, chunk) in topics.chunks(batch_size).enumerate() {
            let start = chunk_index * batch_size + 1;
            let end = start + chunk.len() - 1;
            progress.send(ProgressEvent::BatchStarted { start, end });

            for topic in chunk {
                if cancel.is_cancelled() {
                    info!(completed = posts.len(), "run cancelled");
                    progress.send(ProgressEvent::Cancelled);
                    return RunOutcome {
                        posts,
                        status: RunStatus::Cancelled,
                    };
                }

                progress.send(ProgressEvent::Processing {
                    topic: topic.idea.clone(),
                });
                let post = self.assembler.assemble(topic).await;
                progress.send(ProgressEvent::Completed {
                    topic: topic.idea.clone(),
                    title: post.title.clone(),
                });
                posts.push(post);

                if posts.len() < topics.len() && self.config.topic_delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(self.config.topic_delay_ms)).await;
                }
            }
        }

        info!(posts = posts.len(), "run completed");
        progress.send(ProgressEvent::Info {
            message: format!("Generated {} posts", posts.len()),
        });
        RunOutcome {
            posts,
            status: RunStatus::Completed,
        }
    }
}
