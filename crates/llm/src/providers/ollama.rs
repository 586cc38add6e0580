//! Ollama LLM provider implementation.
//!
//! This module provides integration with Ollama, a local LLM runtime.
//! Ollama API: https://github.com/ollama/ollama/blob/main/docs/api.md

use crate::client::{
    LlmClient, LlmPayload, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage,
};
use docchat_core::{AppError, AppResult};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Request timeout for generate calls; generation is the slowest operation
/// in the system and the only unbounded-latency one.
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    stream: bool,
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    model: String,
    response: String,
    done: bool,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

/// Ollama `/api/tags` response format.
#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

/// A single installed model entry. Older Ollama versions report `name`,
/// newer ones `model`.
#[derive(Debug, Deserialize)]
struct ModelTag {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// Ollama LLM client.
pub struct OllamaClient {
    /// Base URL for Ollama API
    base_url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create a new Ollama client with default settings.
    ///
    /// Default URL: http://localhost:11434
    pub fn new() -> Self {
        Self::with_base_url("http://localhost:11434")
    }

    /// Create a new Ollama client with a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.into(),
            client,
        }
    }

    /// Convert LlmRequest to Ollama format.
    fn to_ollama_request(&self, request: &LlmRequest) -> OllamaRequest {
        OllamaRequest {
            model: request.model.clone(),
            prompt: request.prompt.clone(),
            system: request.system.clone(),
            temperature: request.temperature,
            num_predict: request.max_tokens,
            stream: request.stream,
        }
    }

    /// Convert Ollama response to the normalized LlmResponse.
    fn convert_response(&self, response: OllamaResponse) -> LlmResponse {
        let usage = LlmUsage::new(
            response.prompt_eval_count.unwrap_or(0),
            response.eval_count.unwrap_or(0),
        );

        LlmResponse {
            payload: LlmPayload::Text(response.response),
            model: response.model,
            usage,
            done: response.done,
        }
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!("Sending completion request to Ollama");
        tracing::debug!("Request: {:?}", request);

        let ollama_request = self.to_ollama_request(request);
        let url = format!("{}/api/generate", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&ollama_request)
            .send()
            .await
            .map_err(|e| AppError::Generation(format!("Failed to send request to Ollama: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Generation(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        // For non-streaming, Ollama returns a single JSON object
        let ollama_response: OllamaResponse = response
            .json()
            .await
            .map_err(|e| AppError::Generation(format!("Failed to parse Ollama response: {}", e)))?;

        tracing::info!("Received completion from Ollama");
        tracing::debug!("Response: {:?}", ollama_response);

        Ok(self.convert_response(ollama_response))
    }

    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
        tracing::info!("Starting streaming request to Ollama");
        tracing::debug!("Request: {:?}", request);

        let mut ollama_request = self.to_ollama_request(request);
        ollama_request.stream = true;

        let url = format!("{}/api/generate", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&ollama_request)
            .send()
            .await
            .map_err(|e| AppError::Generation(format!("Failed to send streaming request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Generation(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        // Convert byte stream to line-delimited JSON chunks
        let stream = response.bytes_stream().map(move |result| {
            let bytes =
                result.map_err(|e| AppError::Generation(format!("Stream error: {}", e)))?;

            // Ollama sends newline-delimited JSON
            let text = String::from_utf8_lossy(&bytes);
            let chunks: Vec<AppResult<LlmStreamChunk>> = text
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(|line| {
                    let ollama_response: OllamaResponse =
                        serde_json::from_str(line).map_err(|e| {
                            AppError::Generation(format!("Failed to parse chunk: {}", e))
                        })?;

                    Ok(LlmStreamChunk {
                        content: ollama_response.response,
                        model: ollama_response.model,
                        done: ollama_response.done,
                        usage: if ollama_response.done {
                            Some(LlmUsage::new(
                                ollama_response.prompt_eval_count.unwrap_or(0),
                                ollama_response.eval_count.unwrap_or(0),
                            ))
                        } else {
                            None
                        },
                    })
                })
                .collect();

            Ok(futures::stream::iter(chunks))
        });

        Ok(Box::pin(stream.flat_map(|result| match result {
            Ok(chunks) => chunks,
            Err(e) => futures::stream::iter(vec![Err(e)]),
        })))
    }

    async fn list_models(&self) -> AppResult<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Generation(format!("Failed to query Ollama models: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::Generation(format!(
                "Ollama API error ({}) while listing models",
                status
            )));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| AppError::Generation(format!("Failed to parse model list: {}", e)))?;

        let names = tags
            .models
            .into_iter()
            .filter_map(|tag| tag.model.or(tag.name))
            .collect::<Vec<_>>();

        tracing::debug!("Ollama reports {} installed models", names.len());

        Ok(names)
    }
}
