//! Run report — everything a run observed, returned to the caller at the end.
//!
//! The report is a plain value: the pipeline threads one through a run and
//! hands it back. Rendering it is the caller's business.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::classifier::{COURSE_TYPE, DEPARTMENT};
use crate::types::{field_text, Classification, Document, ExecutionMode, NormalizationRecord};

/// A normalization rewrite tied to the document it happened on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcedRecord {
    pub source_path: String,
    #[serde(flatten)]
    pub record: NormalizationRecord,
}

/// One merge write, performed or (in report-only mode) intended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedWrite {
    pub source_path: String,
    /// Destination document path.
    pub target_path: String,
    pub classification: Classification,
    pub written: bool,
}

/// A merge write that the store rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteFailure {
    pub source_path: String,
    pub target_path: String,
    pub error: String,
}

/// A `_meta` write that sets up one destination bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketWrite {
    pub target_path: String,
    pub classification: Classification,
    pub written: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A collection read or sub-collection listing that failed during the scan.
/// Documents below `path` were not seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchFailure {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub mode: ExecutionMode,
    pub documents_scanned: usize,
    pub counts_by_classification: BTreeMap<Classification, usize>,
    pub distinct_source_parent_paths: BTreeSet<String>,
    pub normalization_records: Vec<SourcedRecord>,
    pub writes: Vec<PlannedWrite>,
    pub write_failures: Vec<WriteFailure>,
    pub read_failures: Vec<BranchFailure>,
    pub scanned_collections: Vec<String>,
    /// Bucket metadata writes, when structure setup was requested.
    pub bucket_writes: Vec<BucketWrite>,
    /// Distinct raw `courseType` values seen on candidates.
    pub observed_course_types: BTreeSet<String>,
    /// Distinct raw `department` values seen on candidates.
    pub observed_departments: BTreeSet<String>,
    /// The walk was stopped before the tree was exhausted.
    pub cancelled: bool,
}

impl RunReport {
    pub fn new(mode: ExecutionMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn record_scanned(&mut self) {
        self.documents_scanned += 1;
    }

    /// Count a labelled feedback document and remember where it was found.
    pub fn record_candidate(&mut self, doc: &Document, classification: Classification) {
        *self.counts_by_classification.entry(classification).or_insert(0) += 1;
        self.distinct_source_parent_paths
            .insert(doc.parent_collection().to_string());
        if let Some(course_type) = field_text(&doc.fields, COURSE_TYPE) {
            self.observed_course_types.insert(course_type);
        }
        if let Some(department) = field_text(&doc.fields, DEPARTMENT) {
            self.observed_departments.insert(department);
        }
    }

    pub fn record_normalization(&mut self, source_path: &str, record: NormalizationRecord) {
        self.normalization_records.push(SourcedRecord {
            source_path: source_path.to_string(),
            record,
        });
    }

    pub fn record_write(&mut self, write: PlannedWrite) {
        self.writes.push(write);
    }

    pub fn record_write_failure(&mut self, failure: WriteFailure) {
        self.write_failures.push(failure);
    }

    pub fn record_bucket_write(&mut self, write: BucketWrite) {
        self.bucket_writes.push(write);
    }

    pub fn record_read_failure(&mut self, failure: BranchFailure) {
        self.read_failures.push(failure);
    }

    pub fn count(&self, classification: Classification) -> usize {
        self.counts_by_classification
            .get(&classification)
            .copied()
            .unwrap_or(0)
    }

    /// Feedback documents found, across all buckets.
    pub fn candidates(&self) -> usize {
        Classification::FEEDBACK.iter().map(|c| self.count(*c)).sum()
    }

    /// Writes that actually reached the store.
    pub fn written(&self) -> usize {
        self.writes.iter().filter(|w| w.written).count()
    }

    /// No branch was skipped, no write failed and the run was not cancelled.
    pub fn is_clean(&self) -> bool {
        self.read_failures.is_empty()
            && self.write_failures.is_empty()
            && self.bucket_writes.iter().all(|w| w.error.is_none())
            && !self.cancelled
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
