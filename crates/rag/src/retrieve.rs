//! Concurrent multi-variant retrieval.
//!
//! Each query variant is embedded and searched independently; the calls
//! are read-only against a ready collection and run on a bounded pool.
//! Results merge by chunk identity keeping the best score seen: a chunk
//! surfaced by two variants is at least as relevant as its best match.

use crate::embeddings::EmbeddingProvider;
use crate::index::{CollectionHandle, VectorIndex};
use crate::types::{Query, RetrievalResult, ScoredChunk};
use docchat_core::AppResult;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashMap;
use std::sync::Arc;

/// Bound on concurrently running per-variant searches.
const MAX_CONCURRENT_VARIANTS: usize = 4;

/// Runs an expanded query set against the vector index.
pub struct Retriever {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl Retriever {
    pub fn new(index: Arc<VectorIndex>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { index, embedder }
    }

    /// Retrieve the best `limit` chunks across all variants.
    ///
    /// `k_per_variant` chunks are requested per variant; after the
    /// max-score merge the combined set is sorted by descending score
    /// (ties broken by ascending `sequence_index`) and truncated to
    /// `limit`, bounding the context handed to the synthesizer. An empty
    /// collection yields an empty result, not an error.
    pub async fn retrieve(
        &self,
        handle: &CollectionHandle,
        query: &Query,
        k_per_variant: usize,
        limit: usize,
    ) -> AppResult<RetrievalResult> {
        let per_variant: Vec<Vec<ScoredChunk>> = stream::iter(query.variants.iter().map(|variant| {
            let embedder = Arc::clone(&self.embedder);
            let index = Arc::clone(&self.index);
            let handle = handle.clone();
            let variant = variant.clone();
            async move {
                let embedding = embedder.embed(&variant).await?;
                index.query(&handle, &embedding, k_per_variant)
            }
        }))
        .buffer_unordered(MAX_CONCURRENT_VARIANTS)
        .try_collect()
        .await?;

        let mut merged: HashMap<(String, u32), ScoredChunk> = HashMap::new();
        for scored in per_variant.into_iter().flatten() {
            let key = (
                scored.chunk.document_id.clone(),
                scored.chunk.sequence_index,
            );
            match merged.get_mut(&key) {
                Some(existing) if existing.score >= scored.score => {}
                Some(existing) => *existing = scored,
                None => {
                    merged.insert(key, scored);
                }
            }
        }

        let mut hits: Vec<ScoredChunk> = merged.into_values().collect();
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.chunk.sequence_index.cmp(&b.chunk.sequence_index))
        });
        hits.truncate(limit);

        tracing::info!(
            "Retrieved {} chunks from {} variants (limit {})",
            hits.len(),
            query.variants.len(),
            limit
        );

        Ok(RetrievalResult::new(hits))
    }
}
