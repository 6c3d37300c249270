//! The batch content-generation pipeline.
//!
//! Turns an ordered list of topics into finished posts through per-topic
//! multi-step generation (outline → sections → sources), with bounded
//! retries, partial-failure tolerance, cooperative cancellation, and an
//! ordered progress stream:
//!
//! - [`cancel`] - per-run cancellation token, polled between steps
//! - [`progress`] - in-process ordered event channel
//! - [`wire`] - tagged-line framing of the event stream for transport
//! - [`lenient`] - lenient parser for structured data in free-text output
//! - [`retry`] - word-count validation with bounded retry
//! - [`generator`] - outline, section, and source generation steps
//! - [`assembler`] - assembles one post per topic, never fails
//! - [`scheduler`] - drives batches of topics in input order

pub mod assembler;
pub mod cancel;
pub mod generator;
pub mod lenient;
pub mod progress;
pub mod retry;
pub mod scheduler;
pub mod wire;

pub use assembler::PostAssembler;
pub use cancel::CancelToken;
pub use progress::{ProgressEvent, ProgressSender};
pub use retry::{RetryPolicy, PLACEHOLDER_PREFIX};
pub use scheduler::{BatchScheduler, RunOutcome, RunStatus, SchedulerConfig};
pub use wire::{Frame, FrameDecoder};
