//! Grounded answer synthesis.
//!
//! Assembles the retrieved chunk texts and the literal question into a
//! single grounding prompt and invokes the language model once. Only the
//! textual payload of the response ever reaches the caller.

use crate::types::ScoredChunk;
use docchat_core::AppResult;
use docchat_llm::{LlmClient, LlmRequest};
use docchat_prompt::{render_template, PromptLibrary, ANSWER_PROMPT_ID};
use std::collections::HashMap;
use std::sync::Arc;

/// Answer returned when retrieval produced no context at all.
pub const INSUFFICIENT_CONTEXT_ANSWER: &str =
    "I could not find enough information in the document to answer that.";

const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Synthesizes answers from retrieved context.
pub struct Synthesizer {
    client: Arc<dyn LlmClient>,
    model: String,
    library: PromptLibrary,
}

impl Synthesizer {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>, library: PromptLibrary) -> Self {
        Self {
            client,
            model: model.into(),
            library,
        }
    }

    /// Generate an answer grounded in `context`, in retrieval order.
    ///
    /// With no context the answer degrades to a fixed insufficient-context
    /// reply; fabricating grounding would be worse than admitting the
    /// gap. Generation failures surface as-is; retry policy belongs to
    /// the caller.
    pub async fn synthesize(&self, question: &str, context: &[ScoredChunk]) -> AppResult<String> {
        if context.is_empty() {
            tracing::info!("No context retrieved, returning insufficient-context answer");
            return Ok(INSUFFICIENT_CONTEXT_ANSWER.to_string());
        }

        let definition = self.library.get(ANSWER_PROMPT_ID)?;

        let mut variables = HashMap::new();
        variables.insert("context".to_string(), build_context(context));
        variables.insert("question".to_string(), question.to_string());

        let prompt = render_template(&definition.template, &variables)?;

        tracing::debug!(
            "Synthesizing answer from {} context chunks ({} prompt chars)",
            context.len(),
            prompt.len()
        );

        let request = LlmRequest::new(prompt, &self.model).with_temperature(0.3);
        let response = self.client.complete(&request).await?;

        // The payload accessor is the only path from provider output to
        // the caller; structured wrappers never leak upward.
        response.into_text()
    }
}

/// Concatenate chunk texts in the retriever's returned order.
fn build_context(context: &[ScoredChunk]) -> String {
    context
        .iter()
        .map(|scored| scored.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::support::MockLlm;
    use crate::types::Chunk;

    fn scored(seq: u32, text: &str) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk {
                document_id: "doc-1".to_string(),
                sequence_index: seq,
                text: text.to_string(),
                start_offset: 0,
            },
            score: 0.9,
        }
    }

    #[test]
    fn test_build_context_preserves_order() {
        let context = vec![scored(0, "first"), scored(1, "second"), scored(2, "third")];
        let built = build_context(&context);

        assert_eq!(built, "first\n\n---\n\nsecond\n\n---\n\nthird");
    }

    #[tokio::test]
    async fn test_synthesize_sends_context_and_question() {
        let llm = MockLlm::with_responses(vec!["Grounded answer."]);
        let synthesizer = Synthesizer::new(
            std::sync::Arc::new(llm),
            "test-model",
            PromptLibrary::builtin(),
        );

        let context = vec![scored(0, "The warranty lasts two years.")];
        let answer = synthesizer
            .synthesize("How long is the warranty?", &context)
            .await
            .unwrap();

        assert_eq!(answer, "Grounded answer.");
    }

    #[tokio::test]
    async fn test_synthesize_prompt_contains_literal_question() {
        let llm = std::sync::Arc::new(MockLlm::with_responses(vec!["ok"]));
        let synthesizer =
            Synthesizer::new(llm.clone(), "test-model", PromptLibrary::builtin());

        synthesizer
            .synthesize("Exactly this question?", &[scored(0, "ctx")])
            .await
            .unwrap();

        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].prompt.contains("Exactly this question?"));
        assert!(requests[0].prompt.contains("ctx"));
        assert!(requests[0]
            .prompt
            .contains("based ONLY on the following context"));
    }

    #[tokio::test]
    async fn test_synthesize_empty_context_degrades() {
        // A failing client proves the LLM is never consulted
        let llm = MockLlm::failing();
        let synthesizer = Synthesizer::new(
            std::sync::Arc::new(llm),
            "test-model",
            PromptLibrary::builtin(),
        );

        let answer = synthesizer.synthesize("Anything?", &[]).await.unwrap();
        assert_eq!(answer, INSUFFICIENT_CONTEXT_ANSWER);
    }

    #[tokio::test]
    async fn test_synthesize_surfaces_generation_errors() {
        let llm = MockLlm::failing();
        let synthesizer = Synthesizer::new(
            std::sync::Arc::new(llm),
            "test-model",
            PromptLibrary::builtin(),
        );

        let result = synthesizer
            .synthesize("Anything?", &[scored(0, "ctx")])
            .await;
        assert!(matches!(
            result,
            Err(docchat_core::AppError::Generation(_))
        ));
    }
}
