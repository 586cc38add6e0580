//! Text chunking with fixed windows, overlap, and breakpoint snapping.
//!
//! The chunker walks the document in windows of `chunk_size` characters,
//! advancing by `chunk_size - chunk_overlap` each step. Window *starts*
//! are fixed on that grid; window *ends* may retreat to a nearby natural
//! breakpoint (newline, then sentence end) so chunks avoid cutting
//! mid-sentence. The look-back never exceeds the overlap, which keeps two
//! guarantees intact:
//!
//! - `start_offset` of chunk `i+1` minus `start_offset` of chunk `i` is
//!   exactly the step, except that the final chunk may be shorter.
//! - Concatenating each chunk's first `step` characters (all of the final
//!   chunk) reconstructs the original text.

use crate::types::{Chunk, Document};
use docchat_core::{AppError, AppResult};

/// Upper bound on how far the end of a chunk may retreat to reach a
/// breakpoint, in characters.
const BREAKPOINT_LOOKBACK: usize = 128;

/// Validated chunking parameters.
#[derive(Debug, Clone, Copy)]
pub struct ChunkConfig {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for ChunkConfig {
    /// The original console defaults: 7500-character windows with a
    /// 100-character overlap.
    fn default() -> Self {
        Self {
            chunk_size: 7500,
            chunk_overlap: 100,
        }
    }
}

impl ChunkConfig {
    /// Create a config, rejecting invalid parameters.
    ///
    /// `chunk_size` must be positive and `chunk_overlap` strictly smaller;
    /// anything else is a configuration error, not a runtime condition.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> AppResult<Self> {
        if chunk_size == 0 {
            return Err(AppError::Config("chunk_size must be positive".to_string()));
        }

        if chunk_overlap >= chunk_size {
            return Err(AppError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }

        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Window advance per chunk.
    pub fn step(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }

    /// How far a chunk end may retreat for a breakpoint.
    fn lookback(&self) -> usize {
        self.chunk_overlap.min(BREAKPOINT_LOOKBACK)
    }
}

/// Split a document into overlapping chunks.
///
/// An empty document yields an empty sequence.
pub fn split(document: &Document, config: &ChunkConfig) -> Vec<Chunk> {
    let text = document.raw_text.as_str();

    // Offsets are measured in characters; index byte positions once so
    // slicing stays O(1) per chunk.
    let byte_of: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();

    if total == 0 {
        return Vec::new();
    }

    let byte_at = |char_idx: usize| -> usize {
        byte_of.get(char_idx).copied().unwrap_or(text.len())
    };

    let size = config.chunk_size();
    let step = config.step();
    let lookback = config.lookback();

    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut sequence_index = 0u32;

    loop {
        let hard_end = (start + size).min(total);

        let end = if hard_end < total {
            find_breakpoint(&chars, hard_end, lookback).unwrap_or(hard_end)
        } else {
            hard_end
        };

        chunks.push(Chunk {
            document_id: document.id.clone(),
            sequence_index,
            text: text[byte_at(start)..byte_at(end)].to_string(),
            start_offset: start,
        });

        if hard_end >= total {
            break;
        }

        start += step;
        sequence_index += 1;
    }

    tracing::debug!(
        "Chunked '{}' into {} chunks (size: {}, overlap: {})",
        document.source_name,
        chunks.len(),
        size,
        config.chunk_overlap()
    );

    chunks
}

/// Find the best cut position in `(hard_end - lookback, hard_end]`.
///
/// Newlines win over sentence ends; within each class the latest position
/// wins, so drift from the target size stays minimal.
fn find_breakpoint(chars: &[char], hard_end: usize, lookback: usize) -> Option<usize> {
    if lookback == 0 {
        return None;
    }

    let floor = hard_end.saturating_sub(lookback).max(1);

    // Pass 1: cut just after a newline
    for end in (floor..=hard_end).rev() {
        if chars[end - 1] == '\n' {
            return Some(end);
        }
    }

    // Pass 2: cut just after sentence punctuation followed by whitespace
    for end in (floor..=hard_end).rev() {
        let is_sentence_end = matches!(chars[end - 1], '.' | '!' | '?');
        let followed_by_space = chars.get(end).map(|c| c.is_whitespace()).unwrap_or(true);
        if is_sentence_end && followed_by_space {
            return Some(end);
        }
    }

    None
}
