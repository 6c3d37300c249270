//! LLM client for blog content generation.
//!
//! Supports Ollama API for local LLM inference, in both buffered and
//! streaming calling conventions.

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::word_count;

/// Configuration for the LLM client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Ollama API endpoint (default: http://localhost:11434)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Model to use for generation
    #[serde(default = "default_model")]
    pub model: String,
    /// Maximum tokens in response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Temperature for generation (0.0 - 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Request the streaming API and accumulate fragments client-side
    #[serde(default)]
    pub stream: bool,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}
fn default_model() -> String {
    "llama3.2:instruct".to_string()
}
fn default_max_tokens() -> u32 {
    2048
}
fn default_temperature() -> f32 {
    0.7
}
fn default_timeout_secs() -> u64 {
    300
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            stream: false,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmConfig {
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }
}

/// One completed generation: the text plus the token count the backend
/// reported consuming. Backends that report no usage fall back to the
/// completion's own word count so downstream cost accounting never sees zero
/// for non-empty output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub tokens: u64,
}

impl Completion {
    pub fn new(text: String, tokens: Option<u64>) -> Self {
        let tokens = tokens.unwrap_or_else(|| word_count(&text) as u64);
        Self { text, tokens }
    }
}

/// Capability consumed by the generation pipeline: one prompt in, one
/// completion out. Implemented by [`LlmClient`] for Ollama and by scripted
/// fakes in tests.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Completion, LlmError>;
}

/// LLM client for content generation.
pub struct LlmClient {
    config: LlmConfig,
    client: reqwest::Client,
}

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Ollama API response format (one object, or one object per line when
/// streaming).
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    eval_count: Option<u64>,
    #[serde(default)]
    error: Option<String>,
}

impl LlmClient {
    /// Create a new LLM client with the given configuration.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Get the config.
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Check if the LLM service is available.
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.config.endpoint);
        match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn request_body(&self, prompt: &str, stream: bool) -> OllamaRequest {
        OllamaRequest {
            model: self.config.model.clone(),
            prompt: prompt.to_string(),
            stream,
            options: OllamaOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens,
            },
        }
    }

    async fn send(&self, prompt: &str, stream: bool) -> Result<reqwest::Response, LlmError> {
        let url = format!("{}/api/generate", self.config.endpoint);
        let resp = self
            .client
            .post(&url)
            .json(&self.request_body(prompt, stream))
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
        }
        Ok(resp)
    }

    /// Buffered call: one request, one JSON response.
    async fn generate_buffered(&self, prompt: &str) -> Result<Completion, LlmError> {
        let resp = self.send(prompt, false).await?;
        let body: OllamaResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;
        if let Some(error) = body.error {
            return Err(LlmError::Api(error));
        }
        Ok(Completion::new(body.response, body.eval_count))
    }

    /// Streaming call: the backend sends one JSON record per line; fragments
    /// are accumulated into a single completion. Records may arrive split
    /// across transport chunks, so lines are reassembled through a carry
    /// buffer before parsing. Stops on `done` or an `error` field.
    async fn generate_streaming(&self, prompt: &str) -> Result<Completion, LlmError> {
        let resp = self.send(prompt, true).await?;
        let mut stream = resp.bytes_stream();

        let mut carry = String::new();
        let mut text = String::new();
        let mut tokens = None;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| LlmError::Connection(e.to_string()))?;
            carry.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(pos) = carry.find('\n') {
                let line: String = carry.drain(..=pos).collect();
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let record: OllamaResponse = serde_json::from_str(line)
                    .map_err(|e| LlmError::Parse(format!("bad stream record: {}", e)))?;
                if let Some(error) = record.error {
                    return Err(LlmError::Api(error));
                }
                text.push_str(&record.response);
                if record.done {
                    tokens = record.eval_count;
                }
            }
        }

        // A final record without a trailing newline still counts.
        let tail = carry.trim();
        if !tail.is_empty() {
            if let Ok(record) = serde_json::from_str::<OllamaResponse>(tail) {
                if let Some(error) = record.error {
                    return Err(LlmError::Api(error));
                }
                text.push_str(&record.response);
                if record.done {
                    tokens = record.eval_count.or(tokens);
                }
            }
        }

        Ok(Completion::new(text, tokens))
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, prompt: &str) -> Result<Completion, LlmError> {
        debug!(model = %self.config.model, chars = prompt.len(), "llm request");
        if self.config.stream {
            self.generate_streaming(prompt).await
        } else {
            self.generate_buffered(prompt).await
        }
    }
}

/// Errors that can occur during LLM operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Failed to connect to the LLM service
    #[error("connection error: {0}")]
    Connection(String),
    /// API returned an error
    #[error("API error: {0}")]
    Api(String),
    /// Failed to parse a response
    #[error("parse error: {0}")]
    Parse(String),
}
