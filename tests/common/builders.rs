//! Test builders — ergonomic constructors for field maps, trees and clocks.
//!
//! These builders are designed for readability in test assertions, not for
//! production use. They panic on invalid input rather than returning `Result`.

use chrono::{DateTime, Duration, TimeZone, Utc};
use refile::{Clock, DocPath, Fields, MemoryStore};
use serde_json::Value;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Field maps
// ---------------------------------------------------------------------------

/// Turn a `json!({...})` object into a field map.
pub fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        other => panic!("fields() needs a JSON object, got {other}"),
    }
}

// ---------------------------------------------------------------------------
// TreeBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for a [`MemoryStore`] test tree.
///
/// # Example
///
/// ```rust
/// let store = TreeBuilder::new()
///     .doc("units/u1", json!({"name": "north"}))
///     .doc("units/u1/feedback/f1", json!({"scores": [4, 5], "folder": "x"}))
///     .fail_reads_at("units/u2")
///     .build();
/// ```
pub struct TreeBuilder {
    store: MemoryStore,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            store: MemoryStore::new(),
        }
    }

    /// Start from a JSON snapshot.
    pub fn from_json(snapshot: Value) -> Self {
        Self {
            store: MemoryStore::from_json(&snapshot).expect("fixture snapshot must parse"),
        }
    }

    pub fn doc(mut self, path: &str, value: Value) -> Self {
        self.store
            .insert(&DocPath::parse(path), fields(value))
            .expect("builder paths must name documents");
        self
    }

    /// Fail the snapshot read of a collection, or the sub-collection listing
    /// of a document.
    pub fn fail_reads_at(mut self, path: &str) -> Self {
        self.store.fail_reads_at(DocPath::parse(path));
        self
    }

    pub fn fail_writes_to(mut self, path: &str) -> Self {
        self.store.fail_writes_to(DocPath::parse(path));
        self
    }

    pub fn fail_root_listing(mut self) -> Self {
        self.store.fail_root_listing();
        self
    }

    pub fn build(self) -> MemoryStore {
        self.store
    }
}

// ---------------------------------------------------------------------------
// Clocks
// ---------------------------------------------------------------------------

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
}

/// A clock that always returns `at`.
pub fn fixed_clock(at: DateTime<Utc>) -> Clock {
    Arc::new(move || at)
}

/// A clock starting at [`t0`] that advances one minute per call.
pub fn ticking_clock() -> Clock {
    let ticks = Arc::new(AtomicI64::new(0));
    Arc::new(move || t0() + Duration::minutes(ticks.fetch_add(1, Ordering::SeqCst)))
}
