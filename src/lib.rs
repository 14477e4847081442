//! refile — find stray feedback records anywhere in a document tree and copy
//! them, normalized, into one bucket per category.
//!
//! This crate wires the store-facing stages together and re-exports the pure
//! building blocks from `refile-core` so integration tests and the binary can
//! import everything from one place.
//!
//! # Architecture
//!
//! ```text
//! TreeWalker ──► Classifier ──► Normalizer ──► Planner ──► RunReport
//!      │                                          │
//!      └──────────── DocumentStore ◄──────────────┘
//! ```
//!
//! Everything runs on one task: each store call is awaited before the next,
//! and writes happen one at a time in discovery order. Sources are only ever
//! read; destinations are only ever merge-written.

pub mod pipeline;
pub mod planner;
pub mod walker;

pub use pipeline::{MigrateError, Migration};
pub use planner::{target_for, Clock, Outcome, Plan, Planner};
pub use walker::TreeWalker;

pub use refile_core::{
    classifier, config, normalizer, report, types, Classification, Classifier, Config, DocPath,
    Document, ExecutionMode, Fields, NormalizationRecord, NormalizedField, Normalizer, RunReport,
};
pub use refile_store::{DocumentStore, MemoryStore, MergeWrite, StoreError};
