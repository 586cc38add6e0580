//! Language-model integration crate for docchat.
//!
//! This crate provides a provider-agnostic abstraction for interacting with
//! locally hosted Large Language Models. It supports multiple providers
//! through a unified trait-based interface and normalizes every provider
//! response into a single payload type with an explicit text accessor.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//!
//! # Example
//! ```no_run
//! use docchat_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Hello, world!", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.into_text()?);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use catalog::ModelCatalog;
pub use client::{
    LlmClient, LlmPayload, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage,
};
pub use factory::create_client;
pub use providers::OllamaClient;
