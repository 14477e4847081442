//! In-memory document tree.
//!
//! Documents and collections are kept in `BTreeMap`s, so snapshot order is
//! ascending by id and repeated reads are stable. Writing below a document
//! that does not exist creates it with no fields.
//!
//! Reads and writes can be made to fail at chosen paths, which is how the
//! harnesses exercise branch isolation and per-document write failures.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use tokio::sync::Mutex;

use refile_core::{DocPath, Document, Fields};

use crate::{DocumentStore, MergeWrite, StoreError};

#[derive(Debug, Clone, Default)]
pub(crate) struct DocNode {
    pub(crate) fields: Fields,
    pub(crate) collections: BTreeMap<String, CollectionNode>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct CollectionNode {
    pub(crate) docs: BTreeMap<String, DocNode>,
}

#[derive(Debug, Default)]
pub(crate) struct Tree {
    pub(crate) roots: BTreeMap<String, CollectionNode>,
    failing_reads: HashSet<DocPath>,
    failing_writes: HashSet<DocPath>,
    fail_root_listing: bool,
    writes: usize,
}

impl Tree {
    fn collection(&self, path: &DocPath) -> Option<&CollectionNode> {
        let (first, rest) = path.segments().split_first()?;
        let mut coll = self.roots.get(first)?;
        for pair in rest.chunks(2) {
            let [doc, sub] = pair else { return None };
            coll = coll.docs.get(doc)?.collections.get(sub)?;
        }
        Some(coll)
    }

    fn collection_mut(&mut self, path: &DocPath) -> Option<&mut CollectionNode> {
        let (first, rest) = path.segments().split_first()?;
        let mut coll = self.roots.entry(first.clone()).or_default();
        for pair in rest.chunks(2) {
            let [doc, sub] = pair else { return None };
            coll = coll
                .docs
                .entry(doc.clone())
                .or_default()
                .collections
                .entry(sub.clone())
                .or_default();
        }
        Some(coll)
    }

    fn document(&self, path: &DocPath) -> Option<&DocNode> {
        self.collection(&path.parent()?)?.docs.get(path.id())
    }

    fn document_mut(&mut self, path: &DocPath) -> Option<&mut DocNode> {
        let parent = path.parent()?;
        let id = path.id().to_string();
        Some(self.collection_mut(&parent)?.docs.entry(id).or_default())
    }
}

/// Shared in-memory [`DocumentStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    tree: Mutex<Tree>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_roots(roots: BTreeMap<String, CollectionNode>) -> Self {
        Self {
            tree: Mutex::new(Tree {
                roots,
                ..Tree::default()
            }),
        }
    }

    /// Create or replace the document at `path`, keeping its sub-collections.
    pub fn insert(&mut self, path: &DocPath, fields: Fields) -> Result<(), StoreError> {
        if !path.is_document() {
            return Err(StoreError::NotADocument(path.clone()));
        }
        let node = self
            .tree
            .get_mut()
            .document_mut(path)
            .ok_or_else(|| StoreError::NotADocument(path.clone()))?;
        node.fields = fields;
        Ok(())
    }

    /// Make reads at `path` fail: a collection path fails its snapshot read,
    /// a document path fails its sub-collection listing.
    pub fn fail_reads_at(&mut self, path: DocPath) {
        self.tree.get_mut().failing_reads.insert(path);
    }

    /// Make merge writes to the document at `path` fail.
    pub fn fail_writes_to(&mut self, path: DocPath) {
        self.tree.get_mut().failing_writes.insert(path);
    }

    /// Make [`DocumentStore::list_root_collections`] fail.
    pub fn fail_root_listing(&mut self) {
        self.tree.get_mut().fail_root_listing = true;
    }

    /// Fields of the document at `path`, if it exists.
    pub async fn get(&self, path: &DocPath) -> Option<Fields> {
        self.tree.lock().await.document(path).map(|d| d.fields.clone())
    }

    /// Ids of the documents in `collection`, in snapshot order.
    pub async fn document_ids(&self, collection: &DocPath) -> Vec<String> {
        self.tree
            .lock()
            .await
            .collection(collection)
            .map(|c| c.docs.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of successful merge writes so far.
    pub async fn write_count(&self) -> usize {
        self.tree.lock().await.writes
    }

    pub(crate) async fn with_tree<R>(&self, f: impl FnOnce(&Tree) -> R) -> R {
        f(&*self.tree.lock().await)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_root_collections(&self) -> Result<Vec<DocPath>, StoreError> {
        let tree = self.tree.lock().await;
        if tree.fail_root_listing {
            return Err(StoreError::Read {
                path: DocPath::default(),
                reason: "root listing unavailable".to_string(),
            });
        }
        Ok(tree.roots.keys().map(DocPath::collection).collect())
    }

    async fn get_documents(&self, collection: &DocPath) -> Result<Vec<Document>, StoreError> {
        if !collection.is_collection() {
            return Err(StoreError::NotACollection(collection.clone()));
        }
        let tree = self.tree.lock().await;
        if tree.failing_reads.contains(collection) {
            return Err(StoreError::Read {
                path: collection.clone(),
                reason: "injected read failure".to_string(),
            });
        }
        let Some(node) = tree.collection(collection) else {
            return Ok(Vec::new());
        };
        Ok(node
            .docs
            .iter()
            .map(|(id, doc)| Document::new(collection.child(id.clone()), doc.fields.clone()))
            .collect())
    }

    async fn list_collections(&self, document: &DocPath) -> Result<Vec<DocPath>, StoreError> {
        if !document.is_document() {
            return Err(StoreError::NotADocument(document.clone()));
        }
        let tree = self.tree.lock().await;
        if tree.failing_reads.contains(document) {
            return Err(StoreError::Read {
                path: document.clone(),
                reason: "injected listing failure".to_string(),
            });
        }
        Ok(tree
            .document(document)
            .map(|d| {
                d.collections
                    .keys()
                    .map(|name| document.child(name.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn merge_write(
        &self,
        collection: &DocPath,
        id: &str,
        write: &MergeWrite,
    ) -> Result<(), StoreError> {
        if !collection.is_collection() {
            return Err(StoreError::NotACollection(collection.clone()));
        }
        let path = collection.child(id);
        let mut tree = self.tree.lock().await;
        if tree.failing_writes.contains(&path) {
            return Err(StoreError::Write {
                path,
                reason: "injected write failure".to_string(),
            });
        }
        let node = tree
            .document_mut(&path)
            .ok_or_else(|| StoreError::NotADocument(path.clone()))?;
        write.merge_into(&mut node.fields);
        tree.writes += 1;
        tracing::trace!(%path, "merge write");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
