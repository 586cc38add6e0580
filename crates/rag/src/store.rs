//! Session snapshot persistence.
//!
//! The CLI is a per-invocation process, so the active session (attached
//! collection, source name, chat history) is saved as JSON after every
//! mutating operation and reloaded on start. Restoring validates the
//! snapshot against the index: a vanished collection demotes the session
//! to empty, and a snapshot caught mid-build discards the leftover
//! segment rather than ever serving it.

use crate::index::VectorIndex;
use crate::session::{Session, SessionState};
use crate::types::ChatMessage;
use docchat_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Serialized session state.
#[derive(Debug, Serialize, Deserialize)]
struct SessionSnapshot {
    state: SessionState,
    collection: Option<String>,
    source_name: Option<String>,
    #[serde(default)]
    history: Vec<ChatMessage>,
}

/// Loads and saves session snapshots at a fixed path.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the persisted session, validating it against the index.
    ///
    /// A missing snapshot is simply an empty session.
    pub fn load(&self, index: &VectorIndex) -> AppResult<Session> {
        if !self.path.exists() {
            return Ok(Session::empty());
        }

        let contents = std::fs::read_to_string(&self.path).map_err(|e| {
            AppError::Storage(format!("Failed to read session snapshot: {}", e))
        })?;

        let snapshot: SessionSnapshot = serde_json::from_str(&contents)?;

        match snapshot.state {
            SessionState::Ready => {
                let Some(name) = snapshot.collection else {
                    tracing::warn!("Snapshot says ready but names no collection; starting empty");
                    return Ok(Session::from_parts(
                        SessionState::Empty,
                        None,
                        None,
                        snapshot.history,
                    ));
                };

                match index.open_collection(&name) {
                    Ok(handle) => Ok(Session::from_parts(
                        SessionState::Ready,
                        Some(handle),
                        snapshot.source_name,
                        snapshot.history,
                    )),
                    Err(AppError::NotFound(_)) => {
                        tracing::warn!(
                            "Collection '{}' from snapshot no longer exists; starting empty",
                            name
                        );
                        Ok(Session::from_parts(
                            SessionState::Empty,
                            None,
                            None,
                            snapshot.history,
                        ))
                    }
                    Err(e) => Err(e),
                }
            }

            SessionState::Indexing | SessionState::Deleting => {
                // The process died mid-operation; whatever segment is left
                // is unfinished and must not be served.
                if let Some(name) = snapshot.collection {
                    match index.delete_collection(&name) {
                        Ok(()) => {
                            tracing::info!("Discarded interrupted collection '{}'", name)
                        }
                        Err(AppError::NotFound(_)) => {}
                        Err(e) => tracing::warn!(
                            "Failed to discard interrupted collection '{}': {}",
                            name,
                            e
                        ),
                    }
                }

                Ok(Session::from_parts(
                    SessionState::Empty,
                    None,
                    None,
                    snapshot.history,
                ))
            }

            SessionState::Empty => Ok(Session::from_parts(
                SessionState::Empty,
                None,
                None,
                snapshot.history,
            )),
        }
    }

    /// Persist the session snapshot.
    pub fn save(&self, session: &Session) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Storage(format!("Failed to create session directory: {}", e))
            })?;
        }

        let snapshot = SessionSnapshot {
            state: session.state(),
            collection: session.collection().map(|h| h.name().to_string()),
            source_name: session.source_name().map(|s| s.to_string()),
            history: session.history(),
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(&self.path, json).map_err(|e| {
            AppError::Storage(format!("Failed to write session snapshot: {}", e))
        })?;

        tracing::debug!("Session snapshot saved to {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Chunk, Document};
    use tempfile::TempDir;

    fn build_ready_collection(index: &VectorIndex, document: &Document) -> String {
        let name = document.collection_name();
        let handle = index.create_collection(&name, 3).unwrap();
        index
            .upsert_batch(
                &handle,
                &[(
                    Chunk {
                        document_id: document.id.clone(),
                        sequence_index: 0,
                        text: "content".to_string(),
                        start_offset: 0,
                    },
                    vec![1.0, 0.0, 0.0],
                )],
            )
            .unwrap();
        index.mark_ready(&handle).unwrap();
        name
    }

    #[test]
    fn test_load_missing_snapshot_is_empty_session() {
        let temp = TempDir::new().unwrap();
        let index = VectorIndex::new(temp.path().join("collections")).unwrap();
        let store = SessionStore::new(temp.path().join("session.json"));

        let session = store.load(&index).unwrap();
        assert_eq!(session.state(), SessionState::Empty);
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_save_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let index = VectorIndex::new(temp.path().join("collections")).unwrap();
        let store = SessionStore::new(temp.path().join("session.json"));

        let document = Document::new("manual.txt", "content");
        let name = build_ready_collection(&index, &document);
        let handle = index.open_collection(&name).unwrap();

        let session = Session::from_parts(
            SessionState::Ready,
            Some(handle),
            Some("manual.txt".to_string()),
            vec![ChatMessage::user("q"), ChatMessage::assistant("a")],
        );
        store.save(&session).unwrap();

        let restored = store.load(&index).unwrap();
        assert_eq!(restored.state(), SessionState::Ready);
        assert_eq!(restored.collection().unwrap().name(), name);
        assert_eq!(restored.source_name(), Some("manual.txt"));
        assert_eq!(restored.history().len(), 2);
    }

    #[test]
    fn test_load_with_vanished_collection_goes_empty() {
        let temp = TempDir::new().unwrap();
        let index = VectorIndex::new(temp.path().join("collections")).unwrap();
        let store = SessionStore::new(temp.path().join("session.json"));

        let document = Document::new("manual.txt", "content");
        let name = build_ready_collection(&index, &document);
        let handle = index.open_collection(&name).unwrap();

        let session = Session::from_parts(
            SessionState::Ready,
            Some(handle),
            Some("manual.txt".to_string()),
            vec![ChatMessage::user("kept")],
        );
        store.save(&session).unwrap();

        index.delete_collection(&name).unwrap();

        let restored = store.load(&index).unwrap();
        assert_eq!(restored.state(), SessionState::Empty);
        assert!(restored.collection().is_none());
        // History survives the demotion
        assert_eq!(restored.history().len(), 1);
    }

    #[test]
    fn test_load_interrupted_build_discards_segment() {
        let temp = TempDir::new().unwrap();
        let index = VectorIndex::new(temp.path().join("collections")).unwrap();
        let store = SessionStore::new(temp.path().join("session.json"));

        // A building (never marked ready) segment left behind by a crash
        let document = Document::new("manual.txt", "content");
        let name = document.collection_name();
        index.create_collection(&name, 3).unwrap();

        let snapshot = SessionSnapshot {
            state: SessionState::Indexing,
            collection: Some(name.clone()),
            source_name: Some("manual.txt".to_string()),
            history: Vec::new(),
        };
        std::fs::write(
            temp.path().join("session.json"),
            serde_json::to_string(&snapshot).unwrap(),
        )
        .unwrap();

        let restored = store.load(&index).unwrap();
        assert_eq!(restored.state(), SessionState::Empty);
        assert!(index.list_collections().unwrap().is_empty());
    }
}
