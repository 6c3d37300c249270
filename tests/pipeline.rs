//! End-to-end pipeline tests over a scripted backend.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use contentmill::llm::{Completion, LlmError, TextGenerator};
use contentmill::models::Topic;
use contentmill::pipeline::progress::{self, ProgressEvent};
use contentmill::pipeline::{
    BatchScheduler, CancelToken, RetryPolicy, RunStatus, SchedulerConfig, PLACEHOLDER_PREFIX,
};

/// Backend that answers every step correctly on the first attempt. The
/// outline comes wrapped in prose to exercise the lenient parser on the
/// real path.
struct CooperativeBackend {
    /// Cancels this token on every call when set, simulating a cancel
    /// request arriving while a topic is being generated.
    cancel_during_calls: Option<CancelToken>,
    calls: AtomicUsize,
}

impl CooperativeBackend {
    fn new() -> Self {
        Self {
            cancel_during_calls: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn cancelling(token: CancelToken) -> Self {
        Self {
            cancel_during_calls: Some(token),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TextGenerator for CooperativeBackend {
    async fn generate(&self, prompt: &str) -> Result<Completion, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(token) = &self.cancel_during_calls {
            token.cancel();
        }

        let text = if prompt.contains("Create an outline") {
            let idea = prompt
                .lines()
                .find_map(|l| l.strip_prefix("Create an outline for a blog post about: "))
                .unwrap_or("?");
            format!(
                "Sure, here is your outline:\n\
                 {{\"title\": \"Post: {idea}\", \"sections\": [\n\
                 {{\"heading\": \"Introduction\", \"subheadings\": [\"hook\"]}},\n\
                 {{\"heading\": \"Details\", \"subheadings\": [\"depth\"]}},\n\
                 {{\"heading\": \"Conclusion\", \"subheadings\": [\"wrap\"]}}\n\
                 ]}}\nHope that helps!"
            )
        } else if prompt.contains("JSON array") {
            r#"[{"name": "Example Source", "link": "https://example.com/ref"}]"#.to_string()
        } else {
            "## Heading\n\n".to_string() + &"word ".repeat(320)
        };
        Ok(Completion::new(text, Some(250)))
    }
}

/// Backend whose output is always far below the minimum word count and
/// never valid JSON.
struct DegenerateBackend;

#[async_trait]
impl TextGenerator for DegenerateBackend {
    async fn generate(&self, _prompt: &str) -> Result<Completion, LlmError> {
        Ok(Completion::new("nope".to_string(), Some(1)))
    }
}

fn fast_config() -> SchedulerConfig {
    SchedulerConfig {
        batch_size: 5,
        topic_delay_ms: 0,
        retry: RetryPolicy {
            max_retries: 2,
            retry_delay_ms: 0,
        },
    }
}

fn topics(ideas: &[&str]) -> Vec<Topic> {
    ideas.iter().map(|i| Topic::new(i, None).unwrap()).collect()
}

async fn drain(mut rx: tokio::sync::mpsc::UnboundedReceiver<ProgressEvent>) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn end_to_end_two_topics_in_order() {
    let scheduler = BatchScheduler::new(Arc::new(CooperativeBackend::new()), fast_config());
    let (tx, rx) = progress::channel();
    let cancel = CancelToken::new();

    let outcome = scheduler.run(&topics(&["A", "B"]), &tx, &cancel).await;
    drop(tx);
    let events = drain(rx).await;

    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.posts.len(), 2);
    assert_eq!(outcome.posts[0].title, "Post: A");
    assert_eq!(outcome.posts[1].title, "Post: B");

    assert_eq!(
        events,
        vec![
            ProgressEvent::BatchStarted { start: 1, end: 2 },
            ProgressEvent::Processing {
                topic: "A".to_string()
            },
            ProgressEvent::Completed {
                topic: "A".to_string(),
                title: "Post: A".to_string()
            },
            ProgressEvent::Processing {
                topic: "B".to_string()
            },
            ProgressEvent::Completed {
                topic: "B".to_string(),
                title: "Post: B".to_string()
            },
            ProgressEvent::Info {
                message: "Generated 2 posts".to_string()
            },
        ]
    );
}

#[tokio::test]
async fn posts_carry_content_sources_and_cost() {
    let scheduler = BatchScheduler::new(Arc::new(CooperativeBackend::new()), fast_config());
    let (tx, _rx) = progress::channel();

    let outcome = scheduler
        .run(&topics(&["Writing Rust"]), &tx, &CancelToken::new())
        .await;
    let post = &outcome.posts[0];

    assert_eq!(post.slug, "post-writing-rust");
    assert!(post.content.contains("## "));
    assert_eq!(post.sources.len(), 1);
    assert_eq!(post.sources[0].link, "https://example.com/ref");
    // 3 sections x 250 tokens = 750 total; 0.75 * (0.03 + 0.06) = 0.0675.
    assert_eq!(post.cost, "0.0675");
    // Date is an ISO calendar date.
    assert_eq!(post.date.len(), 10);
    assert!(post.date.chars().nth(4) == Some('-'));
}

#[tokio::test]
async fn stale_cancellation_flag_does_not_kill_a_new_run() {
    let scheduler = BatchScheduler::new(Arc::new(CooperativeBackend::new()), fast_config());
    let (tx, _rx) = progress::channel();
    let cancel = CancelToken::new();
    cancel.cancel(); // left over from a previous aborted run

    let outcome = scheduler.run(&topics(&["A", "B"]), &tx, &cancel).await;
    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.posts.len(), 2);
}

#[tokio::test]
async fn cancellation_mid_run_stops_before_the_next_topic() {
    let cancel = CancelToken::new();
    let backend = CooperativeBackend::cancelling(cancel.clone());
    let scheduler = BatchScheduler::new(Arc::new(backend), fast_config());
    let (tx, rx) = progress::channel();

    // The backend cancels during topic A's generation: A is allowed to
    // finish and is included, B never starts.
    let outcome = scheduler.run(&topics(&["A", "B", "C"]), &tx, &cancel).await;
    drop(tx);
    let events = drain(rx).await;

    assert_eq!(outcome.status, RunStatus::Cancelled);
    assert_eq!(outcome.posts.len(), 1);
    assert_eq!(outcome.posts[0].title, "Post: A");

    assert_eq!(events.last(), Some(&ProgressEvent::Cancelled));
    assert!(!events.contains(&ProgressEvent::Processing {
        topic: "B".to_string()
    }));
    // Processing always precedes Completed for the same topic.
    let processing_a = events
        .iter()
        .position(|e| matches!(e, ProgressEvent::Processing { topic } if topic == "A"))
        .unwrap();
    let completed_a = events
        .iter()
        .position(|e| matches!(e, ProgressEvent::Completed { topic, .. } if topic == "A"))
        .unwrap();
    assert!(processing_a < completed_a);
}

#[tokio::test]
async fn degenerate_backend_yields_placeholder_posts_at_floor_cost() {
    let scheduler = BatchScheduler::new(Arc::new(DegenerateBackend), fast_config());
    let (tx, _rx) = progress::channel();

    let outcome = scheduler
        .run(&topics(&["Impossible topic"]), &tx, &CancelToken::new())
        .await;

    assert_eq!(outcome.status, RunStatus::Completed);
    let post = &outcome.posts[0];
    // Outline fell back to the default skeleton carrying the idea as title.
    assert_eq!(post.title, "Impossible topic");
    assert!(post.content.contains(PLACEHOLDER_PREFIX));
    assert!(post.sources.is_empty());
    assert_eq!(post.cost, "0.01");
}

#[tokio::test]
async fn batches_chunk_the_topic_list() {
    let mut config = fast_config();
    config.batch_size = 2;
    let scheduler = BatchScheduler::new(Arc::new(CooperativeBackend::new()), config);
    let (tx, rx) = progress::channel();

    let outcome = scheduler
        .run(&topics(&["A", "B", "C", "D", "E"]), &tx, &CancelToken::new())
        .await;
    drop(tx);
    let events = drain(rx).await;

    assert_eq!(outcome.posts.len(), 5);
    let starts: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::BatchStarted { start, end } => Some((*start, *end)),
            _ => None,
        })
        .collect();
    assert_eq!(starts, vec![(1, 2), (3, 4), (5, 5)]);
}
