//! Prompt library with built-in definitions and YAML overrides.

use crate::types::PromptDefinition;
use docchat_core::{AppError, AppResult};
use std::collections::HashMap;
use std::path::Path;

/// Identifier of the query-expansion prompt.
pub const EXPAND_PROMPT_ID: &str = "rag.expand.default";

/// Identifier of the grounded-answer prompt.
pub const ANSWER_PROMPT_ID: &str = "rag.answer.default";

const EXPAND_TEMPLATE: &str = "\
You are an AI language model assistant. Your task is to generate {{variant_count}} different versions
of the given user question to retrieve relevant passages from a vector index.
By generating multiple perspectives on the user question, your goal is to help the user
overcome some of the limitations of distance-based similarity search.
Provide these alternative questions separated by newlines.
Original question: {{question}}";

const ANSWER_TEMPLATE: &str = "\
Answer the question based ONLY on the following context:
{{context}}
Question: {{question}}";

/// Collection of prompt definitions, keyed by ID.
///
/// Starts from the built-ins; [`PromptLibrary::load_overrides`] replaces
/// any of them with same-ID YAML files from a directory.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    definitions: HashMap<String, PromptDefinition>,
}

impl PromptLibrary {
    /// Create a library holding the built-in prompts.
    pub fn builtin() -> Self {
        let mut definitions = HashMap::new();

        for def in [
            PromptDefinition {
                id: EXPAND_PROMPT_ID.to_string(),
                title: "Query expansion".to_string(),
                template: EXPAND_TEMPLATE.to_string(),
            },
            PromptDefinition {
                id: ANSWER_PROMPT_ID.to_string(),
                title: "Grounded answer".to_string(),
                template: ANSWER_TEMPLATE.to_string(),
            },
        ] {
            definitions.insert(def.id.clone(), def);
        }

        Self { definitions }
    }

    /// Load `*.yml` / `*.yaml` overrides from a directory.
    ///
    /// A missing directory is not an error; invalid files are.
    pub fn load_overrides(&mut self, dir: &Path) -> AppResult<()> {
        if !dir.exists() {
            return Ok(());
        }

        for entry in walkdir::WalkDir::new(dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            let is_yaml = matches!(
                path.extension().and_then(|s| s.to_str()),
                Some("yml") | Some("yaml")
            );
            if !path.is_file() || !is_yaml {
                continue;
            }

            let contents = std::fs::read_to_string(path).map_err(|e| {
                AppError::Config(format!("Failed to read prompt file {:?}: {}", path, e))
            })?;

            let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
                AppError::Config(format!("Failed to parse prompt YAML {:?}: {}", path, e))
            })?;

            definition.validate()?;

            tracing::info!("Loaded prompt override: {}", definition.id);
            self.definitions.insert(definition.id.clone(), definition);
        }

        Ok(())
    }

    /// Look up a prompt definition by ID.
    pub fn get(&self, id: &str) -> AppResult<&PromptDefinition> {
        self.definitions
            .get(id)
            .ok_or_else(|| AppError::Config(format!("Unknown prompt ID: {}", id)))
    }

    /// All known prompt IDs.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.definitions.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}
