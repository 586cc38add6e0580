//! RAG core type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A document handed to the core by the extraction layer.
///
/// Immutable once created; owned by the session orchestrator for the
/// duration of one ingestion.
#[derive(Debug, Clone)]
pub struct Document {
    /// Unique document identifier
    pub id: String,

    /// Original file name
    pub source_name: String,

    /// Extracted plain text
    pub raw_text: String,
}

impl Document {
    /// Create a document with a fresh identifier.
    pub fn new(source_name: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source_name: source_name.into(),
            raw_text: raw_text.into(),
        }
    }

    /// Deterministic collection name derived from content identity.
    ///
    /// Hashing both the source name and the text means re-uploading the
    /// same file maps to the same collection, while a same-named but
    /// different file gets a fresh one instead of colliding with stale
    /// vectors.
    pub fn collection_name(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.source_name.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.raw_text.as_bytes());
        let digest = hasher.finalize();

        let hex: String = digest[..8].iter().map(|b| format!("{:02x}", b)).collect();
        format!("doc-{}", hex)
    }
}

/// A bounded contiguous slice of a document's text, the unit of embedding
/// and retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Owning document identifier
    pub document_id: String,

    /// Position within the document, strictly increasing
    pub sequence_index: u32,

    /// Chunk text
    pub text: String,

    /// Offset of the chunk start within the document, in characters
    pub start_offset: usize,
}

/// A question together with its paraphrase variants.
///
/// The original question is always the first variant.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// The user's literal question
    pub original_text: String,

    /// Retrieval variants, original first
    pub variants: Vec<String>,

    /// Paraphrase count that was requested
    pub k: usize,
}

impl Query {
    /// A query carrying only the original question.
    pub fn single(original_text: impl Into<String>) -> Self {
        let original_text = original_text.into();
        Self {
            variants: vec![original_text.clone()],
            original_text,
            k: 0,
        }
    }
}

/// A retrieved chunk with its similarity score.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Ordered, deduplicated retrieval output.
#[derive(Debug, Clone, Default)]
pub struct RetrievalResult {
    hits: Vec<ScoredChunk>,
}

impl RetrievalResult {
    /// Wrap already sorted and deduplicated hits.
    pub fn new(hits: Vec<ScoredChunk>) -> Self {
        Self { hits }
    }

    /// The retrieved chunks, most similar first.
    pub fn hits(&self) -> &[ScoredChunk] {
        &self.hits
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }
}

/// Lifecycle state of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionState {
    /// Created but not fully committed; never servable
    Building,

    /// All chunks committed; open for queries
    Ready,
}

impl CollectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Building => "building",
            Self::Ready => "ready",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "building" => Some(Self::Building),
            "ready" => Some(Self::Ready),
            _ => None,
        }
    }
}

/// Metadata describing one collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    pub dimension: usize,
    pub state: CollectionState,
    pub chunk_count: u64,
}

/// Statistics from one ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestStats {
    /// Collection the document landed in
    pub collection: String,

    /// Number of chunks committed
    pub chunk_count: u32,

    /// Characters of source text processed
    pub chars_processed: u64,

    /// Duration in seconds
    pub duration_secs: f64,
}

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One turn of the session's chat history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            at: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            at: Utc::now(),
        }
    }
}
