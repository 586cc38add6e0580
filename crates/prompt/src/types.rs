//! Prompt domain types.

use serde::{Deserialize, Serialize};

/// A prompt definition, built-in or loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier (e.g., "rag.answer.default")
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// Template string with Handlebars syntax
    pub template: String,
}

impl PromptDefinition {
    /// Validate required fields.
    pub fn validate(&self) -> docchat_core::AppResult<()> {
        if self.id.is_empty() {
            return Err(docchat_core::AppError::Config(
                "Prompt ID cannot be empty".to_string(),
            ));
        }

        if self.template.is_empty() {
            return Err(docchat_core::AppError::Config(format!(
                "Prompt template for '{}' cannot be empty",
                self.id
            )));
        }

        Ok(())
    }
}
