//! refile-store — the document tree store seam.
//!
//! [`DocumentStore`] is the only way the pipeline touches data: list the root
//! collections, read one collection snapshot, list a document's
//! sub-collections, and merge-write a field map. Credentials and connection
//! setup for a real backend live outside this crate; [`MemoryStore`] is the
//! in-process backend used by the binary (via JSON snapshots) and the tests.

pub mod memory;
pub mod snapshot;

use async_trait::async_trait;
use refile_core::{DocPath, Document, Fields};

pub use memory::MemoryStore;

/// Errors raised by a [`DocumentStore`] backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} is not a collection path")]
    NotACollection(DocPath),
    #[error("{0} is not a document path")]
    NotADocument(DocPath),
    #[error("read failed at {path}: {reason}")]
    Read { path: DocPath, reason: String },
    #[error("write failed at {path}: {reason}")]
    Write { path: DocPath, reason: String },
    #[error("malformed snapshot at {path:?}: {reason}")]
    Snapshot { path: String, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// A merge write: `fields` overwrite matching destination keys, `defaults`
/// only fill keys the destination does not have yet, and every other
/// destination key is left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeWrite {
    pub fields: Fields,
    pub defaults: Fields,
}

impl MergeWrite {
    /// Apply this write on top of `existing` (empty if the document is new).
    pub fn merge_into(&self, existing: &mut Fields) {
        for (key, value) in &self.fields {
            existing.insert(key.clone(), value.clone());
        }
        for (key, value) in &self.defaults {
            if !existing.contains_key(key) {
                existing.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Hierarchical document store: collections hold documents, documents may
/// hold further collections to any depth.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Top-level collections, in store order.
    async fn list_root_collections(&self) -> Result<Vec<DocPath>, StoreError>;

    /// Every document of `collection` with its fields, in one snapshot.
    async fn get_documents(&self, collection: &DocPath) -> Result<Vec<Document>, StoreError>;

    /// Direct sub-collections of `document`, in store order.
    async fn list_collections(&self, document: &DocPath) -> Result<Vec<DocPath>, StoreError>;

    /// Merge `write` into `collection/id`, creating the document if needed.
    async fn merge_write(
        &self,
        collection: &DocPath,
        id: &str,
        write: &MergeWrite,
    ) -> Result<(), StoreError>;
}
