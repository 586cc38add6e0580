//! Shared test doubles.

use docchat_core::{AppError, AppResult};
use docchat_llm::{LlmClient, LlmPayload, LlmRequest, LlmResponse, LlmStream, LlmUsage};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Scripted LLM client.
///
/// Answers with the queued responses in order (falling back to a fixed
/// string once drained) and records every request for inspection. The
/// failing variant errors on every call, standing in for an unreachable
/// model server.
pub struct MockLlm {
    responses: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<LlmRequest>>,
    failing: bool,
}

impl MockLlm {
    pub fn with_responses(responses: Vec<&str>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(String::from).collect()),
            requests: Mutex::new(Vec::new()),
            failing: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    /// Every request the mock has seen, in order.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmClient for MockLlm {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());

        if self.failing {
            return Err(AppError::Generation("mock llm is down".to_string()));
        }

        let content = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "mock answer".to_string());

        Ok(LlmResponse {
            payload: LlmPayload::Text(content),
            model: request.model.clone(),
            usage: LlmUsage::default(),
            done: true,
        })
    }

    async fn stream(&self, _request: &LlmRequest) -> AppResult<LlmStream> {
        Err(AppError::Generation(
            "streaming not supported by mock".to_string(),
        ))
    }

    async fn list_models(&self) -> AppResult<Vec<String>> {
        Ok(vec!["test-model".to_string()])
    }
}
