//! Prompt templates for docchat.
//!
//! The RAG core uses two templates: one asking the language model for
//! paraphrased query variants, and one instructing it to answer strictly
//! from retrieved context. Both ship as built-ins and can be overridden by
//! YAML files in the data directory's `prompts/` folder.

pub mod builder;
pub mod library;
pub mod types;

pub use builder::render_template;
pub use library::{PromptLibrary, ANSWER_PROMPT_ID, EXPAND_PROMPT_ID};
pub use types::PromptDefinition;
