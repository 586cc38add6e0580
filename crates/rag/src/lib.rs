//! The docchat RAG core.
//!
//! This crate turns an extracted document into a queryable vector
//! collection and a question into an answer grounded in that collection:
//!
//! - [`chunker`] splits document text into overlapping, offset-tracked
//!   chunks.
//! - [`embeddings`] exposes the embedding provider capability (Ollama
//!   and a deterministic mock).
//! - [`index`] is the SQLite-backed vector index with explicit collection
//!   lifecycle (create → ready → delete).
//! - [`expand`] widens a question into retrieval variants via the LLM.
//! - [`retrieve`] runs concurrent per-variant retrieval with merge and
//!   deduplication.
//! - [`synthesize`] generates the grounded answer.
//! - [`session`] sequences ingestion, querying, and deletion under the
//!   one-collection-per-session invariant.
//! - [`store`] persists session snapshots across process runs.

pub mod chunker;
pub mod embeddings;
pub mod expand;
pub mod index;
pub mod retrieve;
pub mod session;
pub mod store;
pub mod synthesize;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use chunker::ChunkConfig;
pub use embeddings::{create_provider, EmbeddingProvider};
pub use expand::QueryExpander;
pub use index::{CollectionHandle, VectorIndex};
pub use retrieve::Retriever;
pub use session::{OrchestratorConfig, Session, SessionOrchestrator, SessionState};
pub use store::SessionStore;
pub use synthesize::Synthesizer;
pub use types::{
    ChatMessage, ChatRole, Chunk, CollectionInfo, CollectionState, Document, IngestStats, Query,
    RetrievalResult, ScoredChunk,
};
