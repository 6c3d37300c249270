//! Ordered progress event stream from the scheduler to an observer.
//!
//! A single-producer append-only channel: the scheduler pushes events as
//! they happen, the consumer reads them incrementally while the run is still
//! going, and end-of-stream (the sender dropping) signals completion rather
//! than a sentinel event.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// One progress event. `Processing` always precedes `Completed` for the
/// same topic; events are otherwise strictly ordered by emission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// A contiguous chunk of topics is starting (1-based, inclusive).
    BatchStarted { start: usize, end: usize },
    /// Generation for a topic has begun. The topic idea is the key.
    Processing { topic: String },
    /// A topic finished, yielding a post with the given title.
    Completed { topic: String, title: String },
    /// The run was aborted by the cancellation token.
    Cancelled,
    /// Terminal failure of the whole run.
    Error { message: String },
    /// Informational progress text with no structural meaning.
    Info { message: String },
}

impl ProgressEvent {
    /// Human-readable description, used for progress lines on the wire and
    /// in CLI output.
    pub fn describe(&self) -> String {
        match self {
            ProgressEvent::BatchStarted { start, end } => {
                format!("Processing topics {} to {}", start, end)
            }
            ProgressEvent::Processing { topic } => format!("Generating post for: {}", topic),
            ProgressEvent::Completed { title, .. } => format!("Completed: {}", title),
            ProgressEvent::Cancelled => "Process cancelled by user".to_string(),
            ProgressEvent::Error { message } => message.clone(),
            ProgressEvent::Info { message } => message.clone(),
        }
    }
}

/// Sending half of a progress channel. Delivery is best effort: events for
/// a consumer that has gone away are dropped silently rather than failing
/// the run.
#[derive(Debug, Clone)]
pub struct ProgressSender {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ProgressSender {
    pub fn send(&self, event: ProgressEvent) {
        let _ = self.tx.send(event);
    }
}

/// Create a progress channel. Dropping the sender closes the stream for the
/// consumer.
pub fn channel() -> (ProgressSender, mpsc::UnboundedReceiver<ProgressEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ProgressSender { tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let (tx, mut rx) = channel();
        tx.send(ProgressEvent::BatchStarted { start: 1, end: 2 });
        tx.send(ProgressEvent::Processing {
            topic: "A".to_string(),
        });
        drop(tx);

        assert_eq!(
            rx.recv().await,
            Some(ProgressEvent::BatchStarted { start: 1, end: 2 })
        );
        assert_eq!(
            rx.recv().await,
            Some(ProgressEvent::Processing {
                topic: "A".to_string()
            })
        );
        // Sender dropped: stream closes without a sentinel.
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn test_send_after_receiver_dropped_is_silent() {
        let (tx, rx) = channel();
        drop(rx);
        tx.send(ProgressEvent::Cancelled);
    }

    #[test]
    fn test_serde_tagging() {
        let event = ProgressEvent::Completed {
            topic: "A".to_string(),
            title: "T".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"completed\""));
        let back: ProgressEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
