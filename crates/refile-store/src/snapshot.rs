//! JSON snapshots of a [`MemoryStore`].
//!
//! A snapshot maps root collection names to collections; a collection maps
//! document ids to documents; a document is an object with an optional
//! `fields` map and an optional `collections` map of the same shape:
//!
//! ```json
//! {
//!   "units": {
//!     "u1": {
//!       "fields": { "name": "north" },
//!       "collections": {
//!         "feedback": { "f1": { "fields": { "scores": [4, 5] } } }
//!       }
//!     }
//!   }
//! }
//! ```

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

use crate::memory::{CollectionNode, DocNode, Tree};
use crate::{MemoryStore, StoreError};

impl MemoryStore {
    /// Build a store from a snapshot value.
    pub fn from_json(value: &Value) -> Result<Self, StoreError> {
        let roots = parse_collections(value, "")?;
        Ok(Self::from_roots(roots))
    }

    /// Serialize the whole tree back into the snapshot shape.
    pub async fn to_json(&self) -> Value {
        self.with_tree(|tree: &Tree| collections_to_json(&tree.roots)).await
    }

    /// Read a snapshot file.
    pub async fn load(path: &Path) -> Result<Self, StoreError> {
        let raw = tokio::fs::read_to_string(path).await?;
        let value: Value = serde_json::from_str(&raw)?;
        let store = Self::from_json(&value)?;
        tracing::debug!(path = %path.display(), "snapshot loaded");
        Ok(store)
    }

    /// Write the current tree to a snapshot file.
    pub async fn save(&self, path: &Path) -> Result<(), StoreError> {
        let value = self.to_json().await;
        tokio::fs::write(path, serde_json::to_string_pretty(&value)?).await?;
        tracing::debug!(path = %path.display(), "snapshot saved");
        Ok(())
    }
}

fn malformed(path: &str, reason: impl Into<String>) -> StoreError {
    StoreError::Snapshot {
        path: path.to_string(),
        reason: reason.into(),
    }
}

fn join(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}/{segment}")
    }
}

fn parse_collections(
    value: &Value,
    prefix: &str,
) -> Result<BTreeMap<String, CollectionNode>, StoreError> {
    let Value::Object(map) = value else {
        return Err(malformed(prefix, "expected an object of collections"));
    };
    let mut out = BTreeMap::new();
    for (name, coll) in map {
        let coll_path = join(prefix, name);
        let Value::Object(docs) = coll else {
            return Err(malformed(&coll_path, "expected an object of documents"));
        };
        let mut node = CollectionNode::default();
        for (id, doc) in docs {
            let doc_path = join(&coll_path, id);
            node.docs.insert(id.clone(), parse_document(doc, &doc_path)?);
        }
        out.insert(name.clone(), node);
    }
    Ok(out)
}

fn parse_document(value: &Value, path: &str) -> Result<DocNode, StoreError> {
    let Value::Object(doc) = value else {
        return Err(malformed(path, "expected a document object"));
    };
    if let Some(key) = doc.keys().find(|k| *k != "fields" && *k != "collections") {
        return Err(malformed(path, format!("unexpected key {key:?}")));
    }
    let fields = match doc.get("fields") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(fields)) => fields.clone(),
        Some(_) => return Err(malformed(path, "`fields` must be an object")),
    };
    let collections = match doc.get("collections") {
        None | Some(Value::Null) => BTreeMap::new(),
        Some(value) => parse_collections(value, path)?,
    };
    Ok(DocNode {
        fields,
        collections,
    })
}

fn collections_to_json(collections: &BTreeMap<String, CollectionNode>) -> Value {
    let mut out = Map::new();
    for (name, coll) in collections {
        let mut docs = Map::new();
        for (id, doc) in &coll.docs {
            let mut entry = Map::new();
            entry.insert("fields".to_string(), Value::Object(doc.fields.clone()));
            if !doc.collections.is_empty() {
                entry.insert("collections".to_string(), collections_to_json(&doc.collections));
            }
            docs.insert(id.clone(), Value::Object(entry));
        }
        out.insert(name.clone(), Value::Object(docs));
    }
    Value::Object(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
