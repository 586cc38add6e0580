//! SQLite storage for one collection segment.
//!
//! Each collection owns a single database file with a one-row `collection`
//! meta table and a `chunks` table keyed by `(document_id,
//! sequence_index)`. Embeddings are stored as little-endian f32 BLOBs.

use crate::types::{Chunk, CollectionState, ScoredChunk};
use chrono::Utc;
use docchat_core::{AppError, AppResult};
use rusqlite::{params, Connection};
use std::path::Path;

/// Collection metadata row.
#[derive(Debug, Clone)]
pub(crate) struct CollectionMeta {
    pub name: String,
    pub dimension: usize,
    pub state: CollectionState,
}

/// Open the database file for a collection segment.
pub(crate) fn open(path: &Path) -> AppResult<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::Storage(format!("Failed to create collections directory: {}", e))
        })?;
    }

    Connection::open(path)
        .map_err(|e| AppError::Storage(format!("Failed to open collection {:?}: {}", path, e)))
}

/// Create tables and the meta row if this is a fresh segment.
pub(crate) fn init_schema(conn: &Connection, name: &str, dimension: usize) -> AppResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS collection (
            name TEXT NOT NULL,
            dimension INTEGER NOT NULL,
            state TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS chunks (
            document_id TEXT NOT NULL,
            sequence_index INTEGER NOT NULL,
            text TEXT NOT NULL,
            start_offset INTEGER NOT NULL,
            embedding BLOB NOT NULL,
            PRIMARY KEY (document_id, sequence_index)
        );
        "#,
    )
    .map_err(|e| AppError::Storage(format!("Failed to create tables: {}", e)))?;

    conn.execute(
        "INSERT INTO collection (name, dimension, state, created_at)
         SELECT ?1, ?2, ?3, ?4
         WHERE NOT EXISTS (SELECT 1 FROM collection)",
        params![
            name,
            dimension as i64,
            CollectionState::Building.as_str(),
            Utc::now().to_rfc3339(),
        ],
    )
    .map_err(|e| AppError::Storage(format!("Failed to initialize collection meta: {}", e)))?;

    Ok(())
}

/// Read the meta row, if the segment has one.
pub(crate) fn read_meta(conn: &Connection) -> AppResult<Option<CollectionMeta>> {
    let result = conn.query_row(
        "SELECT name, dimension, state FROM collection LIMIT 1",
        [],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
            ))
        },
    );

    match result {
        Ok((name, dimension, state)) => {
            let state = CollectionState::parse(&state).ok_or_else(|| {
                AppError::Storage(format!("Corrupt collection state: {}", state))
            })?;
            Ok(Some(CollectionMeta {
                name,
                dimension: dimension as usize,
                state,
            }))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(AppError::Storage(format!(
            "Failed to read collection meta: {}",
            e
        ))),
    }
}

/// Update the collection lifecycle state.
pub(crate) fn set_state(conn: &Connection, state: CollectionState) -> AppResult<()> {
    conn.execute(
        "UPDATE collection SET state = ?1",
        params![state.as_str()],
    )
    .map_err(|e| AppError::Storage(format!("Failed to update collection state: {}", e)))?;

    Ok(())
}

/// Number of stored chunks.
pub(crate) fn chunk_count(conn: &Connection) -> AppResult<u64> {
    conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| {
        row.get::<_, i64>(0).map(|v| v as u64)
    })
    .map_err(|e| AppError::Storage(format!("Failed to count chunks: {}", e)))
}

/// Insert or replace a batch of chunk vectors atomically.
///
/// The whole batch runs in one transaction; a failed insert rolls every
/// prior insert back, leaving the segment in its pre-call state.
pub(crate) fn upsert_batch(
    conn: &mut Connection,
    items: &[(Chunk, Vec<f32>)],
) -> AppResult<()> {
    let tx = conn
        .transaction()
        .map_err(|e| AppError::Storage(format!("Failed to begin transaction: {}", e)))?;

    for (chunk, embedding) in items {
        tx.execute(
            "INSERT OR REPLACE INTO chunks
             (document_id, sequence_index, text, start_offset, embedding)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                chunk.document_id,
                chunk.sequence_index as i64,
                chunk.text,
                chunk.start_offset as i64,
                embedding_to_bytes(embedding),
            ],
        )
        .map_err(|e| AppError::Storage(format!("Failed to insert chunk: {}", e)))?;
    }

    tx.commit()
        .map_err(|e| AppError::Storage(format!("Failed to commit batch: {}", e)))?;

    Ok(())
}

/// Score every stored chunk against the query embedding.
///
/// Ordering and truncation happen in the caller; this returns the raw
/// scored set.
pub(crate) fn query_chunks(
    conn: &Connection,
    query_embedding: &[f32],
) -> AppResult<Vec<ScoredChunk>> {
    let mut stmt = conn
        .prepare(
            "SELECT document_id, sequence_index, text, start_offset, embedding FROM chunks",
        )
        .map_err(|e| AppError::Storage(format!("Failed to prepare query: {}", e)))?;

    let rows = stmt
        .query_map([], |row| {
            let embedding_bytes: Vec<u8> = row.get(4)?;
            Ok((
                Chunk {
                    document_id: row.get(0)?,
                    sequence_index: row.get::<_, i64>(1)? as u32,
                    text: row.get(2)?,
                    start_offset: row.get::<_, i64>(3)? as usize,
                },
                embedding_bytes,
            ))
        })
        .map_err(|e| AppError::Storage(format!("Failed to query chunks: {}", e)))?;

    let mut scored = Vec::new();
    for row in rows {
        let (chunk, embedding_bytes) =
            row.map_err(|e| AppError::Storage(format!("Failed to read chunk row: {}", e)))?;
        let embedding = bytes_to_embedding(&embedding_bytes)?;
        let score = cosine_similarity(query_embedding, &embedding);
        scored.push(ScoredChunk { chunk, score });
    }

    Ok(scored)
}

/// Convert embedding vector to bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert bytes back to embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Storage(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    let mut embedding = Vec::with_capacity(bytes.len() / 4);
    for chunk in bytes.chunks_exact(4) {
        let value = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        embedding.push(value);
    }

    Ok(embedding)
}

/// Calculate cosine similarity between two vectors.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn chunk(seq: u32, text: &str) -> Chunk {
        Chunk {
            document_id: "doc-1".to_string(),
            sequence_index: seq,
            text: text.to_string(),
            start_offset: seq as usize * 10,
        }
    }

    #[test]
    fn test_schema_and_meta_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("doc-abc.sqlite3");
        let conn = open(&path).unwrap();
        init_schema(&conn, "doc-abc", 3).unwrap();

        let meta = read_meta(&conn).unwrap().unwrap();
        assert_eq!(meta.name, "doc-abc");
        assert_eq!(meta.dimension, 3);
        assert_eq!(meta.state, CollectionState::Building);

        set_state(&conn, CollectionState::Ready).unwrap();
        let meta = read_meta(&conn).unwrap().unwrap();
        assert_eq!(meta.state, CollectionState::Ready);
    }

    #[test]
    fn test_init_schema_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("doc-abc.sqlite3");

        let conn = open(&path).unwrap();
        init_schema(&conn, "doc-abc", 3).unwrap();
        set_state(&conn, CollectionState::Ready).unwrap();

        // A second init must not reset the meta row
        init_schema(&conn, "doc-abc", 3).unwrap();
        let meta = read_meta(&conn).unwrap().unwrap();
        assert_eq!(meta.state, CollectionState::Ready);
    }

    #[test]
    fn test_upsert_batch_and_count() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("doc-abc.sqlite3");
        let mut conn = open(&path).unwrap();
        init_schema(&conn, "doc-abc", 3).unwrap();

        let items = vec![
            (chunk(0, "first"), vec![1.0, 0.0, 0.0]),
            (chunk(1, "second"), vec![0.0, 1.0, 0.0]),
        ];
        upsert_batch(&mut conn, &items).unwrap();
        assert_eq!(chunk_count(&conn).unwrap(), 2);

        // Replacing the same keys does not grow the table
        upsert_batch(&mut conn, &items).unwrap();
        assert_eq!(chunk_count(&conn).unwrap(), 2);
    }

    #[test]
    fn test_query_scores_all_chunks() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("doc-abc.sqlite3");
        let mut conn = open(&path).unwrap();
        init_schema(&conn, "doc-abc", 3).unwrap();

        upsert_batch(
            &mut conn,
            &[
                (chunk(0, "aligned"), vec![1.0, 0.0, 0.0]),
                (chunk(1, "orthogonal"), vec![0.0, 1.0, 0.0]),
            ],
        )
        .unwrap();

        let scored = query_chunks(&conn, &[1.0, 0.0, 0.0]).unwrap();
        assert_eq!(scored.len(), 2);

        let aligned = scored.iter().find(|s| s.chunk.sequence_index == 0).unwrap();
        let orthogonal = scored.iter().find(|s| s.chunk.sequence_index == 1).unwrap();
        assert!((aligned.score - 1.0).abs() < 1e-5);
        assert!(orthogonal.score.abs() < 1e-5);
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &[1.0, 0.0, 0.0]) - 1.0).abs() < 0.001);
        assert!((cosine_similarity(&a, &[0.0, 1.0, 0.0])).abs() < 0.001);
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_embedding_byte_round_trip() {
        let embedding = vec![0.25f32, -1.5, 3.75];
        let bytes = embedding_to_bytes(&embedding);
        assert_eq!(bytes.len(), 12);
        assert_eq!(bytes_to_embedding(&bytes).unwrap(), embedding);

        assert!(bytes_to_embedding(&bytes[..5]).is_err());
    }
}
