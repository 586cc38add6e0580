//! LLM client abstraction and request/response types.
//!
//! This module defines the core abstractions for interacting with LLM
//! providers. Providers may answer with a bare string, a chat-style
//! message, or an arbitrary structured object; all of them are normalized
//! into [`LlmPayload`] so that callers only ever consume the text accessor
//! and provider metadata never leaks upward.

use docchat_core::{AppError, AppResult};
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// LLM completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    /// The prompt text to send to the LLM
    pub prompt: String,

    /// Model identifier (e.g., "llama3.2")
    pub model: String,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Temperature for sampling (0.0 - 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Top-p nucleus sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Enable streaming responses
    #[serde(default)]
    pub stream: bool,

    /// System prompt (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

impl LlmRequest {
    /// Create a new LLM request with required fields.
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            max_tokens: None,
            temperature: None,
            top_p: None,
            stream: false,
            system: None,
        }
    }

    /// Enable streaming for this request.
    pub fn with_streaming(mut self) -> Self {
        self.stream = true;
        self
    }

    /// Set the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the temperature for sampling.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Normalized provider response payload.
///
/// Providers disagree on response shape: some return plain text, some a
/// chat message object, some a structured document. Everything funnels
/// through this enum, and downstream components only ever call
/// [`LlmPayload::as_text`] / [`LlmPayload::into_text`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LlmPayload {
    /// A bare completion string
    Text(String),

    /// A chat-style message with a content field
    Chat { content: String },

    /// An arbitrary structured response the provider did not flatten
    Structured(serde_json::Value),
}

impl LlmPayload {
    /// Borrow the textual answer, if one is present.
    ///
    /// For structured payloads this looks for the conventional
    /// `content` / `response` string fields.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            LlmPayload::Text(text) => Some(text),
            LlmPayload::Chat { content } => Some(content),
            LlmPayload::Structured(value) => value
                .get("content")
                .or_else(|| value.get("response"))
                .and_then(|v| v.as_str()),
        }
    }

    /// Extract the textual answer, consuming the payload.
    ///
    /// A payload with no recognizable text field is a generation error:
    /// metadata or tool-call artifacts must never reach the caller as an
    /// answer.
    pub fn into_text(self) -> AppResult<String> {
        match self {
            LlmPayload::Text(text) => Ok(text),
            LlmPayload::Chat { content } => Ok(content),
            LlmPayload::Structured(value) => value
                .get("content")
                .or_else(|| value.get("response"))
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
                .ok_or_else(|| {
                    AppError::Generation(
                        "Provider response carried no textual payload".to_string(),
                    )
                }),
        }
    }
}

/// LLM completion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// The normalized response payload
    pub payload: LlmPayload,

    /// Model that generated the response
    pub model: String,

    /// Usage statistics
    pub usage: LlmUsage,

    /// Whether the response was complete
    #[serde(default = "default_true")]
    pub done: bool,
}

fn default_true() -> bool {
    true
}

impl LlmResponse {
    /// Extract the textual answer from the payload.
    pub fn into_text(self) -> AppResult<String> {
        self.payload.into_text()
    }
}

/// Token usage statistics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LlmUsage {
    /// Tokens in the prompt
    #[serde(default)]
    pub prompt_tokens: u32,

    /// Tokens in the completion
    #[serde(default)]
    pub completion_tokens: u32,

    /// Total tokens used
    #[serde(default)]
    pub total_tokens: u32,
}

impl LlmUsage {
    /// Create usage stats from prompt and completion token counts.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// A chunk from a streaming LLM response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmStreamChunk {
    /// Incremental text content
    pub content: String,

    /// Model generating the stream
    pub model: String,

    /// Whether this is the final chunk
    #[serde(default)]
    pub done: bool,

    /// Usage statistics (only in final chunk)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<LlmUsage>,
}

/// Stream of LLM chunks.
pub type LlmStream = Pin<Box<dyn Stream<Item = AppResult<LlmStreamChunk>> + Send>>;

/// Trait for LLM providers.
///
/// This trait abstracts the underlying LLM provider and exposes a unified
/// interface for completion, streaming, and local model discovery.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Get the provider name (e.g., "ollama").
    fn provider_name(&self) -> &str;

    /// Perform a non-streaming completion.
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse>;

    /// Perform a streaming completion.
    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream>;

    /// List the model identifiers installed on the provider.
    async fn list_models(&self) -> AppResult<Vec<String>>;
}
