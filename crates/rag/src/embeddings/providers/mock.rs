//! Deterministic mock embedding provider.
//!
//! Produces content-aware vectors from word and character-trigram hashes,
//! unit-normalized. No network, no model weights, fully deterministic,
//! which makes it the provider of choice for tests and offline smoke
//! runs. Texts sharing vocabulary land near each other; unrelated texts
//! do not.

use crate::embeddings::EmbeddingProvider;
use async_trait::async_trait;
use docchat_core::AppResult;
use std::collections::{HashMap, HashSet};

/// Words too common to carry signal.
const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them",
];

/// Hash-based embedding provider.
#[derive(Debug, Clone)]
pub struct MockProvider {
    dimensions: usize,
}

impl MockProvider {
    /// Create a provider emitting vectors of the given dimension.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let dim = self.dimensions;
        let mut embedding = vec![0.0f32; dim];

        let stop_words: HashSet<&str> = STOP_WORDS.iter().copied().collect();
        let lower = text.to_lowercase();

        let words: Vec<&str> = lower
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|w| w.len() > 2 && !stop_words.contains(w))
            .collect();

        let mut word_freq: HashMap<&str, u32> = HashMap::new();
        for word in words.iter().copied() {
            *word_freq.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in &word_freq {
            // Character trigrams spread each word over several dimensions
            let chars: Vec<char> = word.chars().collect();
            for i in 0..chars.len().saturating_sub(2) {
                let trigram_hash = chars[i..i + 3]
                    .iter()
                    .fold(0u64, |acc, c| acc.wrapping_mul(37).wrapping_add(*c as u64));

                let dim_idx = (trigram_hash as usize) % dim;
                embedding[dim_idx] += (*freq as f32).sqrt();
            }

            // Whole-word signal
            let word_hash = word
                .bytes()
                .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            let base_dim = (word_hash as usize) % dim;
            embedding[base_dim] += *freq as f32;
        }

        // Normalize to unit vector
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

#[async_trait]
impl EmbeddingProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "hash-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}
