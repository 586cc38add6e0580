//! Vector index with explicit collection lifecycle.
//!
//! The index hosts any number of collections, one SQLite segment per
//! collection under a root directory. Lifecycle and concurrency rules:
//!
//! - `create_collection` is idempotent for a matching dimension and fails
//!   with a dimension conflict otherwise.
//! - Builds are a single-writer critical section per collection; a
//!   contending builder is rejected with `SessionBusy` instead of
//!   interleaving upserts into a half-committed segment.
//! - Queries require the collection to be `Ready`; a `Building` collection
//!   answers `NotReady`, a deleted or unknown one `NotFound`. Reads take
//!   no locks and may run arbitrarily in parallel.
//! - `delete_collection` removes the backing segment; deleting an absent
//!   collection reports a recoverable `NotFound`.

pub(crate) mod sqlite;

use crate::types::{Chunk, CollectionInfo, CollectionState, ScoredChunk};
use docchat_core::{AppError, AppResult};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Per-collection coordination state, shared across handles.
#[derive(Debug, Default)]
struct CollectionGuards {
    /// Single-writer build lock
    build: Arc<tokio::sync::Mutex<()>>,

    /// Set while a delete is in flight so queries fail fast
    deleting: AtomicBool,
}

/// Cheap, cloneable reference to one collection.
#[derive(Debug, Clone)]
pub struct CollectionHandle {
    name: String,
    dimension: usize,
    path: PathBuf,
    guards: Arc<CollectionGuards>,
}

impl CollectionHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Exclusive permission to build a collection.
///
/// Held for the duration of embed + upsert + mark-ready; dropping it (on
/// success, failure, or cancellation) releases the collection for the
/// next builder.
pub struct BuildPermit {
    _guard: tokio::sync::OwnedMutexGuard<()>,
}

/// SQLite-backed vector index rooted at a storage directory.
pub struct VectorIndex {
    root: PathBuf,
    guards: Mutex<HashMap<String, Arc<CollectionGuards>>>,
}

impl VectorIndex {
    /// Open (creating if needed) an index rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> AppResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| {
            AppError::Storage(format!("Failed to create index root {:?}: {}", root, e))
        })?;

        Ok(Self {
            root,
            guards: Mutex::new(HashMap::new()),
        })
    }

    fn segment_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.sqlite3", name))
    }

    fn guards_for(&self, name: &str) -> Arc<CollectionGuards> {
        let mut guards = self.guards.lock().expect("index guard map poisoned");
        Arc::clone(guards.entry(name.to_string()).or_default())
    }

    /// Create a collection, or return the existing one.
    ///
    /// Idempotent when the existing collection has the same dimension;
    /// a different dimension is a conflict, fatal for that collection.
    pub fn create_collection(&self, name: &str, dimension: usize) -> AppResult<CollectionHandle> {
        let path = self.segment_path(name);
        let guards = self.guards_for(name);
        guards.deleting.store(false, Ordering::SeqCst);

        let conn = sqlite::open(&path)?;
        sqlite::init_schema(&conn, name, dimension)?;

        let meta = sqlite::read_meta(&conn)?.ok_or_else(|| {
            AppError::Storage(format!("Collection '{}' has no meta row", name))
        })?;

        if meta.dimension != dimension {
            return Err(AppError::DimensionConflict {
                collection: name.to_string(),
                expected: meta.dimension,
                actual: dimension,
            });
        }

        tracing::debug!(
            "Collection '{}' available (dimension {}, state {})",
            name,
            dimension,
            meta.state.as_str()
        );

        Ok(CollectionHandle {
            name: name.to_string(),
            dimension,
            path,
            guards,
        })
    }

    /// Open an existing collection without creating it.
    pub fn open_collection(&self, name: &str) -> AppResult<CollectionHandle> {
        let path = self.segment_path(name);
        if !path.exists() {
            return Err(AppError::NotFound(format!("Collection '{}'", name)));
        }

        let conn = sqlite::open(&path)?;
        let meta = sqlite::read_meta(&conn)?
            .ok_or_else(|| AppError::NotFound(format!("Collection '{}'", name)))?;

        Ok(CollectionHandle {
            name: name.to_string(),
            dimension: meta.dimension,
            path,
            guards: self.guards_for(name),
        })
    }

    /// Acquire the exclusive build permit for a collection.
    ///
    /// A second concurrent builder gets `SessionBusy` rather than waiting:
    /// interleaved batches into a not-yet-ready collection could commit a
    /// partial index.
    pub fn try_begin_build(&self, handle: &CollectionHandle) -> AppResult<BuildPermit> {
        match Arc::clone(&handle.guards.build).try_lock_owned() {
            Ok(guard) => Ok(BuildPermit { _guard: guard }),
            Err(_) => Err(AppError::SessionBusy(format!(
                "Collection '{}' is already being built",
                handle.name
            ))),
        }
    }

    /// Insert or replace a batch of chunk vectors.
    ///
    /// The batch is atomic: every embedding is validated against the
    /// collection dimension before anything is written, and the writes run
    /// in one transaction.
    pub fn upsert_batch(
        &self,
        handle: &CollectionHandle,
        items: &[(Chunk, Vec<f32>)],
    ) -> AppResult<()> {
        for (_chunk, embedding) in items {
            if embedding.len() != handle.dimension {
                return Err(AppError::DimensionConflict {
                    collection: handle.name.clone(),
                    expected: handle.dimension,
                    actual: embedding.len(),
                });
            }
        }

        if !handle.path.exists() {
            return Err(AppError::NotFound(format!("Collection '{}'", handle.name)));
        }

        let mut conn = sqlite::open(&handle.path)?;
        sqlite::upsert_batch(&mut conn, items)?;

        tracing::debug!(
            "Upserted {} vectors into collection '{}'",
            items.len(),
            handle.name
        );

        Ok(())
    }

    /// Mark a fully committed collection as servable.
    pub fn mark_ready(&self, handle: &CollectionHandle) -> AppResult<()> {
        let conn = sqlite::open(&handle.path)?;
        sqlite::set_state(&conn, CollectionState::Ready)?;
        tracing::info!("Collection '{}' marked ready", handle.name);
        Ok(())
    }

    /// Whether the collection is servable.
    pub fn is_ready(&self, handle: &CollectionHandle) -> AppResult<bool> {
        if !handle.path.exists() {
            return Err(AppError::NotFound(format!("Collection '{}'", handle.name)));
        }

        let conn = sqlite::open(&handle.path)?;
        let meta = sqlite::read_meta(&conn)?
            .ok_or_else(|| AppError::NotFound(format!("Collection '{}'", handle.name)))?;

        Ok(meta.state == CollectionState::Ready)
    }

    /// Metadata snapshot for a collection.
    pub fn info(&self, handle: &CollectionHandle) -> AppResult<CollectionInfo> {
        if !handle.path.exists() {
            return Err(AppError::NotFound(format!("Collection '{}'", handle.name)));
        }

        let conn = sqlite::open(&handle.path)?;
        let meta = sqlite::read_meta(&conn)?
            .ok_or_else(|| AppError::NotFound(format!("Collection '{}'", handle.name)))?;
        let chunk_count = sqlite::chunk_count(&conn)?;

        Ok(CollectionInfo {
            name: meta.name,
            dimension: meta.dimension,
            state: meta.state,
            chunk_count,
        })
    }

    /// Similarity search over a ready collection.
    ///
    /// Results are sorted by descending score; equal scores are broken by
    /// ascending `sequence_index` so repeated queries return the same
    /// order. Querying a non-ready collection is an error, not an empty
    /// result, since silence would be indistinguishable from "no relevant
    /// content".
    pub fn query(
        &self,
        handle: &CollectionHandle,
        embedding: &[f32],
        limit: usize,
    ) -> AppResult<Vec<ScoredChunk>> {
        if handle.guards.deleting.load(Ordering::SeqCst) {
            return Err(AppError::NotFound(format!(
                "Collection '{}' is being deleted",
                handle.name
            )));
        }

        if !handle.path.exists() {
            return Err(AppError::NotFound(format!("Collection '{}'", handle.name)));
        }

        if embedding.len() != handle.dimension {
            return Err(AppError::DimensionConflict {
                collection: handle.name.clone(),
                expected: handle.dimension,
                actual: embedding.len(),
            });
        }

        let conn = sqlite::open(&handle.path)?;
        let meta = sqlite::read_meta(&conn)?
            .ok_or_else(|| AppError::NotFound(format!("Collection '{}'", handle.name)))?;

        if meta.state != CollectionState::Ready {
            return Err(AppError::NotReady(format!(
                "Collection '{}' is still building",
                handle.name
            )));
        }

        let mut results = sqlite::query_chunks(&conn, embedding)?;

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.chunk.sequence_index.cmp(&b.chunk.sequence_index))
        });
        results.truncate(limit);

        tracing::debug!(
            "Query on '{}' returned {} chunks (limit {})",
            handle.name,
            results.len(),
            limit
        );

        Ok(results)
    }

    /// Delete a collection and its backing segment.
    ///
    /// Idempotent at the caller's level: a second delete, or a delete of a
    /// name that never existed, reports `NotFound` and nothing else.
    pub fn delete_collection(&self, name: &str) -> AppResult<()> {
        let guards = self.guards_for(name);
        guards.deleting.store(true, Ordering::SeqCst);

        let path = self.segment_path(name);
        if !path.exists() {
            return Err(AppError::NotFound(format!("Collection '{}'", name)));
        }

        std::fs::remove_file(&path).map_err(|e| {
            guards.deleting.store(false, Ordering::SeqCst);
            AppError::Storage(format!("Failed to delete collection '{}': {}", name, e))
        })?;

        let mut map = self.guards.lock().expect("index guard map poisoned");
        map.remove(name);

        tracing::info!("Collection '{}' deleted", name);
        Ok(())
    }

    /// Names of all collections currently on disk.
    pub fn list_collections(&self) -> AppResult<Vec<String>> {
        let mut names = Vec::new();

        for entry in std::fs::read_dir(&self.root)
            .map_err(|e| AppError::Storage(format!("Failed to read index root: {}", e)))?
        {
            let entry =
                entry.map_err(|e| AppError::Storage(format!("Failed to read entry: {}", e)))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("sqlite3") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }
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

    fn ready_collection(index: &VectorIndex, name: &str) -> CollectionHandle {
        let handle = index.create_collection(name, 3).unwrap();
        index
            .upsert_batch(
                &handle,
                &[
                    (chunk(0, "alpha"), vec![1.0, 0.0, 0.0]),
                    (chunk(1, "beta"), vec![0.0, 1.0, 0.0]),
                    (chunk(2, "gamma"), vec![0.0, 0.0, 1.0]),
                ],
            )
            .unwrap();
        index.mark_ready(&handle).unwrap();
        handle
    }

    #[test]
    fn test_create_collection_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let index = VectorIndex::new(temp.path()).unwrap();

        let first = index.create_collection("doc-abc", 3).unwrap();
        index
            .upsert_batch(&first, &[(chunk(0, "alpha"), vec![1.0, 0.0, 0.0])])
            .unwrap();

        let second = index.create_collection("doc-abc", 3).unwrap();
        assert_eq!(second.name(), "doc-abc");
        assert_eq!(index.info(&second).unwrap().chunk_count, 1);
    }

    #[test]
    fn test_create_collection_dimension_conflict() {
        let temp = TempDir::new().unwrap();
        let index = VectorIndex::new(temp.path()).unwrap();

        index.create_collection("doc-abc", 3).unwrap();
        let result = index.create_collection("doc-abc", 768);

        match result {
            Err(AppError::DimensionConflict {
                expected, actual, ..
            }) => {
                assert_eq!(expected, 3);
                assert_eq!(actual, 768);
            }
            other => panic!("Expected dimension conflict, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_upsert_rejects_wrong_dimension_without_side_effects() {
        let temp = TempDir::new().unwrap();
        let index = VectorIndex::new(temp.path()).unwrap();
        let handle = index.create_collection("doc-abc", 3).unwrap();

        index
            .upsert_batch(&handle, &[(chunk(0, "alpha"), vec![1.0, 0.0, 0.0])])
            .unwrap();

        // One bad vector poisons the whole batch
        let result = index.upsert_batch(
            &handle,
            &[
                (chunk(1, "beta"), vec![0.0, 1.0, 0.0]),
                (chunk(2, "gamma"), vec![0.0, 1.0]),
            ],
        );
        assert!(matches!(result, Err(AppError::DimensionConflict { .. })));

        // Pre-call state preserved: the valid row of the batch is absent too
        assert_eq!(index.info(&handle).unwrap().chunk_count, 1);
    }

    #[test]
    fn test_query_before_ready_is_not_ready() {
        let temp = TempDir::new().unwrap();
        let index = VectorIndex::new(temp.path()).unwrap();
        let handle = index.create_collection("doc-abc", 3).unwrap();

        index
            .upsert_batch(&handle, &[(chunk(0, "alpha"), vec![1.0, 0.0, 0.0])])
            .unwrap();

        let result = index.query(&handle, &[1.0, 0.0, 0.0], 5);
        assert!(matches!(result, Err(AppError::NotReady(_))));

        index.mark_ready(&handle).unwrap();
        assert!(index.is_ready(&handle).unwrap());
        assert_eq!(index.query(&handle, &[1.0, 0.0, 0.0], 5).unwrap().len(), 1);
    }

    #[test]
    fn test_query_orders_by_score_then_sequence() {
        let temp = TempDir::new().unwrap();
        let index = VectorIndex::new(temp.path()).unwrap();
        let handle = index.create_collection("doc-abc", 3).unwrap();

        // Two identical vectors tie on score; the earlier chunk must win
        index
            .upsert_batch(
                &handle,
                &[
                    (chunk(2, "late twin"), vec![1.0, 0.0, 0.0]),
                    (chunk(0, "early twin"), vec![1.0, 0.0, 0.0]),
                    (chunk(1, "other"), vec![0.0, 1.0, 0.0]),
                ],
            )
            .unwrap();
        index.mark_ready(&handle).unwrap();

        for _ in 0..5 {
            let results = index.query(&handle, &[1.0, 0.0, 0.0], 10).unwrap();
            let order: Vec<u32> = results.iter().map(|s| s.chunk.sequence_index).collect();
            assert_eq!(order, vec![0, 2, 1]);
        }
    }

    #[test]
    fn test_query_respects_limit() {
        let temp = TempDir::new().unwrap();
        let index = VectorIndex::new(temp.path()).unwrap();
        let handle = ready_collection(&index, "doc-abc");

        let results = index.query(&handle, &[1.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_query_wrong_dimension_is_a_conflict() {
        let temp = TempDir::new().unwrap();
        let index = VectorIndex::new(temp.path()).unwrap();
        let handle = ready_collection(&index, "doc-abc");

        let result = index.query(&handle, &[1.0, 0.0], 5);
        assert!(matches!(result, Err(AppError::DimensionConflict { .. })));
    }

    #[test]
    fn test_delete_is_idempotent_with_not_found() {
        let temp = TempDir::new().unwrap();
        let index = VectorIndex::new(temp.path()).unwrap();
        let handle = ready_collection(&index, "doc-abc");

        index.delete_collection("doc-abc").unwrap();

        // Second delete and unknown names report NotFound, never a panic
        assert!(matches!(
            index.delete_collection("doc-abc"),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            index.delete_collection("doc-never-existed"),
            Err(AppError::NotFound(_))
        ));

        // The handle is dead too
        assert!(matches!(
            index.query(&handle, &[1.0, 0.0, 0.0], 5),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_build_permit_excludes_concurrent_builders() {
        let temp = TempDir::new().unwrap();
        let index = VectorIndex::new(temp.path()).unwrap();
        let handle = index.create_collection("doc-abc", 3).unwrap();

        let permit = index.try_begin_build(&handle).unwrap();
        assert!(matches!(
            index.try_begin_build(&handle),
            Err(AppError::SessionBusy(_))
        ));

        drop(permit);
        assert!(index.try_begin_build(&handle).is_ok());
    }

    #[test]
    fn test_open_collection_recovers_dimension() {
        let temp = TempDir::new().unwrap();
        let index = VectorIndex::new(temp.path()).unwrap();
        ready_collection(&index, "doc-abc");

        let reopened = index.open_collection("doc-abc").unwrap();
        assert_eq!(reopened.dimension(), 3);

        assert!(matches!(
            index.open_collection("doc-missing"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_collections() {
        let temp = TempDir::new().unwrap();
        let index = VectorIndex::new(temp.path()).unwrap();
        ready_collection(&index, "doc-b");
        ready_collection(&index, "doc-a");

        assert_eq!(
            index.list_collections().unwrap(),
            vec!["doc-a".to_string(), "doc-b".to_string()]
        );
    }
}
