//! refile-core — pure building blocks of a refile run.
//!
//! Nothing in this crate touches a store. It holds the shared types, the
//! versioned rule configuration, the classifier, the field normalizer and the
//! run report the pipeline fills in.
//!
//! # Architecture
//!
//! ```text
//! TreeWalker ──► Classifier ──► Normalizer ──► Planner ──► RunReport
//!      │                                          │
//!      └──────────── DocumentStore ◄──────────────┘
//! ```

pub mod classifier;
pub mod config;
pub mod normalizer;
pub mod report;
pub mod types;

pub use classifier::Classifier;
pub use config::Config;
pub use normalizer::{Normalized, Normalizer};
pub use report::RunReport;
pub use types::{
    Classification, DocPath, Document, ExecutionMode, Fields, NormalizationRecord, NormalizedField,
};
