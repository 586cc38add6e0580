//! Session orchestration.
//!
//! A [`Session`] owns the state machine `Empty → Indexing → Ready →
//! Querying* → Deleting → Empty`; the [`SessionOrchestrator`] drives it,
//! sequencing ingestion, retrieval, synthesis, and deletion. At most one
//! collection is attached to a session at a time; starting a new
//! ingestion while one is attached is rejected with `SessionBusy` rather
//! than silently orphaning the prior collection's storage.

use crate::chunker::{self, ChunkConfig};
use crate::embeddings::EmbeddingProvider;
use crate::expand::QueryExpander;
use crate::index::{CollectionHandle, VectorIndex};
use crate::retrieve::Retriever;
use crate::synthesize::Synthesizer;
use crate::types::{ChatMessage, Chunk, CollectionInfo, Document, IngestStats};
use docchat_core::{AppError, AppResult};
use docchat_llm::{LlmClient, LlmRequest};
use docchat_prompt::PromptLibrary;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No document attached
    Empty,

    /// A collection build is in flight
    Indexing,

    /// A collection is attached and servable
    Ready,

    /// The attached collection is being removed
    Deleting,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Indexing => "indexing",
            Self::Ready => "ready",
            Self::Deleting => "deleting",
        }
    }
}

/// Explicit session state, passed to every operation.
///
/// Questions do not change session state, so [`SessionOrchestrator::ask`]
/// takes `&Session` and multiple questions may run concurrently; the
/// chat history sits behind a lock of its own.
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    collection: Option<CollectionHandle>,
    source_name: Option<String>,
    history: Mutex<Vec<ChatMessage>>,
}

impl Session {
    /// A fresh, empty session.
    pub fn empty() -> Self {
        Self {
            state: SessionState::Empty,
            collection: None,
            source_name: None,
            history: Mutex::new(Vec::new()),
        }
    }

    /// Rebuild a session from persisted parts.
    pub(crate) fn from_parts(
        state: SessionState,
        collection: Option<CollectionHandle>,
        source_name: Option<String>,
        history: Vec<ChatMessage>,
    ) -> Self {
        Self {
            state,
            collection,
            source_name,
            history: Mutex::new(history),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn collection(&self) -> Option<&CollectionHandle> {
        self.collection.as_ref()
    }

    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    /// Snapshot of the chat history.
    pub fn history(&self) -> Vec<ChatMessage> {
        self.history.lock().expect("history lock poisoned").clone()
    }

    /// Append a completed question/answer turn.
    ///
    /// Called only after a turn succeeds; a failed turn leaves history
    /// untouched.
    fn record_turn(&self, question: &str, answer: &str) {
        let mut history = self.history.lock().expect("history lock poisoned");
        history.push(ChatMessage::user(question));
        history.push(ChatMessage::assistant(answer));
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::empty()
    }
}

/// Tunables for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Chat/synthesis model identifier
    pub chat_model: String,

    /// Chunking parameters for ingestion
    pub chunking: ChunkConfig,

    /// Paraphrase variants requested per question
    pub query_variants: usize,

    /// Chunks requested from the index per variant
    pub k_per_variant: usize,

    /// Overall number of chunks handed to the synthesizer
    pub top_k: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            chat_model: "llama3.2".to_string(),
            chunking: ChunkConfig::default(),
            query_variants: 2,
            k_per_variant: 4,
            top_k: 5,
        }
    }
}

/// Sequences ingestion → indexing → retrieval → synthesis per user turn.
pub struct SessionOrchestrator {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmClient>,
    expander: QueryExpander,
    retriever: Retriever,
    synthesizer: Synthesizer,
    config: OrchestratorConfig,
}

impl SessionOrchestrator {
    /// Wire an orchestrator from its collaborators.
    pub fn new(
        index: Arc<VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmClient>,
        library: PromptLibrary,
        config: OrchestratorConfig,
    ) -> Self {
        let expander = QueryExpander::new(
            Arc::clone(&llm),
            config.chat_model.clone(),
            library.clone(),
            config.query_variants,
        );
        let retriever = Retriever::new(Arc::clone(&index), Arc::clone(&embedder));
        let synthesizer = Synthesizer::new(Arc::clone(&llm), config.chat_model.clone(), library);

        Self {
            index,
            embedder,
            llm,
            expander,
            retriever,
            synthesizer,
            config,
        }
    }

    /// Ingest a document: chunk, embed, and commit a ready collection.
    ///
    /// Only legal from `Empty`; an attached document must be deleted
    /// first. Every failure path deletes the partially built collection
    /// before the error surfaces, so nothing half-built is ever servable
    /// or orphaned.
    pub async fn ingest(
        &self,
        session: &mut Session,
        document: Document,
    ) -> AppResult<IngestStats> {
        if session.state != SessionState::Empty {
            return Err(AppError::SessionBusy(format!(
                "Session already has '{}' attached; delete it before ingesting",
                session.source_name.as_deref().unwrap_or("a document")
            )));
        }

        tracing::info!(
            "Ingesting '{}' ({} chars)",
            document.source_name,
            document.raw_text.chars().count()
        );

        session.state = SessionState::Indexing;

        match self.build_collection(&document).await {
            Ok((handle, stats)) => {
                session.collection = Some(handle);
                session.source_name = Some(document.source_name.clone());
                session.state = SessionState::Ready;
                Ok(stats)
            }
            Err(e) => {
                session.collection = None;
                session.source_name = None;
                session.state = SessionState::Empty;
                Err(e)
            }
        }
    }

    async fn build_collection(
        &self,
        document: &Document,
    ) -> AppResult<(CollectionHandle, IngestStats)> {
        let start = Instant::now();
        let chars_processed = document.raw_text.chars().count() as u64;

        let chunks = chunker::split(document, &self.config.chunking);
        let name = document.collection_name();

        let handle = self
            .index
            .create_collection(&name, self.embedder.dimensions())?;

        // Same content hashes to the same collection; if a previous run
        // fully committed it, reuse instead of re-embedding.
        if self.index.is_ready(&handle)? {
            let info = self.index.info(&handle)?;
            if info.chunk_count as usize == chunks.len() {
                tracing::info!("Collection '{}' already built, reusing", name);
                return Ok((
                    handle,
                    IngestStats {
                        collection: name,
                        chunk_count: info.chunk_count as u32,
                        chars_processed,
                        duration_secs: start.elapsed().as_secs_f64(),
                    },
                ));
            }
        }

        let permit = self.index.try_begin_build(&handle)?;
        let chunk_count = chunks.len() as u32;
        let result = self.build_locked(&handle, chunks).await;
        drop(permit);

        match result {
            Ok(()) => {
                let duration = start.elapsed();
                tracing::info!(
                    "Built collection '{}': {} chunks in {:.2}s",
                    name,
                    chunk_count,
                    duration.as_secs_f64()
                );

                Ok((
                    handle,
                    IngestStats {
                        collection: name,
                        chunk_count,
                        chars_processed,
                        duration_secs: duration.as_secs_f64(),
                    },
                ))
            }
            Err(e) => {
                self.discard_partial(&name);
                Err(e)
            }
        }
    }

    async fn build_locked(&self, handle: &CollectionHandle, chunks: Vec<Chunk>) -> AppResult<()> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let items: Vec<(Chunk, Vec<f32>)> = chunks.into_iter().zip(embeddings).collect();
        self.index.upsert_batch(handle, &items)?;
        self.index.mark_ready(handle)?;

        Ok(())
    }

    /// Best-effort removal of a failed build.
    fn discard_partial(&self, name: &str) {
        match self.index.delete_collection(name) {
            Ok(()) => tracing::info!("Discarded partial collection '{}'", name),
            Err(AppError::NotFound(_)) => {}
            Err(e) => tracing::error!(
                "Failed to clean up partial collection '{}': {}",
                name,
                e
            ),
        }
    }

    /// Answer a question.
    ///
    /// With a ready collection the turn runs expansion → retrieval →
    /// synthesis. With no document attached the question goes straight to
    /// the language model as plain chat. Either way a failed turn leaves
    /// the chat history unchanged.
    pub async fn ask(&self, session: &Session, question: &str) -> AppResult<String> {
        match session.state() {
            SessionState::Ready => {
                let handle = session.collection().ok_or_else(|| {
                    AppError::NotFound("Session is ready but has no collection".to_string())
                })?;

                let query = self.expander.expand(question).await;
                let retrieved = self
                    .retriever
                    .retrieve(
                        handle,
                        &query,
                        self.config.k_per_variant,
                        self.config.top_k,
                    )
                    .await?;

                let answer = self.synthesizer.synthesize(question, retrieved.hits()).await?;

                session.record_turn(question, &answer);
                Ok(answer)
            }

            SessionState::Empty => {
                tracing::info!("No document attached, answering as plain chat");

                let request = LlmRequest::new(question, &self.config.chat_model);
                let answer = self.llm.complete(&request).await?.into_text()?;

                session.record_turn(question, &answer);
                Ok(answer)
            }

            state @ (SessionState::Indexing | SessionState::Deleting) => {
                Err(AppError::SessionBusy(format!(
                    "Session is {}; try again when it settles",
                    state.as_str()
                )))
            }
        }
    }

    /// Detach and delete the session's collection.
    ///
    /// Safe to invoke with nothing attached: that is an idempotent
    /// no-op. A collection the index no longer knows about counts as
    /// deleted.
    pub async fn delete(&self, session: &mut Session) -> AppResult<()> {
        let Some(handle) = session.collection.take() else {
            session.state = SessionState::Empty;
            session.source_name = None;
            return Ok(());
        };

        session.state = SessionState::Deleting;
        tracing::info!("Deleting collection '{}'", handle.name());

        match self.index.delete_collection(handle.name()) {
            Ok(()) | Err(AppError::NotFound(_)) => {
                session.source_name = None;
                session.state = SessionState::Empty;
                Ok(())
            }
            Err(e) => {
                // Storage refused; the collection still exists, keep it attached
                session.collection = Some(handle);
                session.state = SessionState::Ready;
                Err(e)
            }
        }
    }

    /// Metadata for the session's attached collection, if any.
    pub fn collection_info(&self, session: &Session) -> AppResult<Option<CollectionInfo>> {
        match session.collection() {
            Some(handle) => Ok(Some(self.index.info(handle)?)),
            None => Ok(None),
        }
    }

    /// The index this orchestrator serves.
    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }
}
