//! Multi-query expansion.
//!
//! One question becomes several paraphrased retrieval variants to widen
//! recall past the limitations of distance-based similarity search. The
//! language model proposes the paraphrases; parsing is defensive and a
//! failed call degrades to single-query retrieval instead of failing the
//! turn.

use crate::types::Query;
use docchat_core::AppResult;
use docchat_llm::{LlmClient, LlmRequest};
use docchat_prompt::{render_template, PromptLibrary, EXPAND_PROMPT_ID};
use std::collections::HashMap;
use std::sync::Arc;

/// Expands a question into retrieval variants via the LLM.
pub struct QueryExpander {
    client: Arc<dyn LlmClient>,
    model: String,
    library: PromptLibrary,
    variant_count: usize,
}

impl QueryExpander {
    /// Create an expander asking for `variant_count` paraphrases.
    pub fn new(
        client: Arc<dyn LlmClient>,
        model: impl Into<String>,
        library: PromptLibrary,
        variant_count: usize,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            library,
            variant_count,
        }
    }

    /// Expand a question into a [`Query`].
    ///
    /// The original question is always the first variant. Generation
    /// failure is not an error here: the query falls back to the original
    /// question alone and retrieval proceeds.
    pub async fn expand(&self, question: &str) -> Query {
        if self.variant_count == 0 {
            return Query::single(question);
        }

        match self.generate_paraphrases(question).await {
            Ok(paraphrases) => {
                let mut variants = Vec::with_capacity(paraphrases.len() + 1);
                variants.push(question.to_string());
                variants.extend(paraphrases);

                tracing::debug!(
                    "Expanded question into {} retrieval variants",
                    variants.len()
                );

                Query {
                    original_text: question.to_string(),
                    variants,
                    k: self.variant_count,
                }
            }
            Err(e) => {
                tracing::warn!(
                    "Query expansion failed, falling back to single-query retrieval: {}",
                    e
                );
                Query::single(question)
            }
        }
    }

    async fn generate_paraphrases(&self, question: &str) -> AppResult<Vec<String>> {
        let definition = self.library.get(EXPAND_PROMPT_ID)?;

        let mut variables = HashMap::new();
        variables.insert(
            "variant_count".to_string(),
            self.variant_count.to_string(),
        );
        variables.insert("question".to_string(), question.to_string());

        let prompt = render_template(&definition.template, &variables)?;

        let request = LlmRequest::new(prompt, &self.model).with_temperature(0.7);
        let response = self.client.complete(&request).await?;
        let text = response.into_text()?;

        Ok(parse_paraphrases(&text, question, self.variant_count))
    }
}

/// Split model output into candidate paraphrases.
///
/// One candidate per line; blanks, list markers, duplicates, and echoes of
/// the original are discarded; at most `limit` survive.
fn parse_paraphrases(text: &str, original: &str, limit: usize) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();

    for line in text.lines() {
        let candidate = strip_list_marker(line);
        if candidate.is_empty() {
            continue;
        }
        if candidate.eq_ignore_ascii_case(original.trim()) {
            continue;
        }
        if seen.iter().any(|s| s.eq_ignore_ascii_case(candidate)) {
            continue;
        }

        seen.push(candidate.to_string());
        if seen.len() == limit {
            break;
        }
    }

    seen
}

/// Strip leading bullet or numbering markers the model likes to add.
fn strip_list_marker(line: &str) -> &str {
    let trimmed = line.trim();

    if let Some(rest) = trimmed.strip_prefix(['-', '*']) {
        return rest.trim_start();
    }

    let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &trimmed[digits..];
        if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return rest.trim_start();
        }
    }

    trimmed
}
