//! Embedding provider capability.
//!
//! The index never talks to an embedding model directly; it consumes this
//! trait. The dimension is fixed per provider instance and validated by
//! the collection before any upsert.

pub mod providers;

use docchat_core::{AppError, AppResult};
use std::sync::Arc;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "ollama", "mock")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

/// Create an embedding provider based on configuration.
pub fn create_provider(
    provider: &str,
    endpoint: &str,
    model: &str,
    dimensions: usize,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match provider {
        "ollama" => Ok(Arc::new(providers::ollama::OllamaProvider::new(
            endpoint, model, dimensions,
        )?)),

        "mock" => Ok(Arc::new(providers::mock::MockProvider::new(dimensions))),

        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: ollama, mock",
            provider
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_mock_provider() {
        let provider = create_provider("mock", "", "hash-v1", 384).unwrap();
        assert_eq!(provider.provider_name(), "mock");
        assert_eq!(provider.dimensions(), 384);
    }

    #[test]
    fn test_create_ollama_provider() {
        let provider =
            create_provider("ollama", "http://localhost:11434", "nomic-embed-text", 768).unwrap();
        assert_eq!(provider.provider_name(), "ollama");
        assert_eq!(provider.model_name(), "nomic-embed-text");
    }

    #[test]
    fn test_create_unknown_provider() {
        let result = create_provider("unknown", "", "m", 8);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_provider_embed_single() {
        let provider = create_provider("mock", "", "hash-v1", 384).unwrap();
        let embedding = provider.embed("test text").await.unwrap();
        assert_eq!(embedding.len(), 384);
    }
}
