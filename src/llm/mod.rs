//! LLM backend integration.
//!
//! Supports Ollama-compatible APIs for local inference. The pipeline only
//! sees the [`TextGenerator`] trait, so tests can substitute scripted fakes.

mod client;

pub use client::{Completion, LlmClient, LlmConfig, LlmError, TextGenerator};
