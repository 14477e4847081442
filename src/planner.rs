//! Migration planner — where a classified document goes and what gets written.
//!
//! A plan copies the source fields, overlays the normalized `courseType` and
//! `department`, stamps `sourcePath` and a fresh `migratedAt`, and asks the
//! store to fill `createdAt` only if neither the source nor the destination has
//! one. The write uses merge semantics, so replaying a plan leaves the
//! destination unchanged apart from `migratedAt`. Sources are never written.
//! A `courseType` or `department` holding a list or map is copied as-is.
//!
//! The planner also sets up each destination bucket with a `_meta` document
//! (description, category, version) under the same merge rules.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::sync::Arc;

use refile_core::classifier::{COURSE_TYPE, DEPARTMENT};
use refile_core::config::{Config, TargetLayout};
use refile_core::report::{BucketWrite, PlannedWrite, WriteFailure};
use refile_core::{
    Classification, DocPath, Document, ExecutionMode, NormalizationRecord, Normalizer, RunReport,
};
use refile_store::{DocumentStore, MergeWrite, StoreError};

pub const SOURCE_PATH: &str = "sourcePath";
pub const CREATED_AT: &str = "createdAt";
pub const MIGRATED_AT: &str = "migratedAt";
pub const UPDATED_AT: &str = "updatedAt";

/// Id of the metadata document kept in every destination bucket.
pub const BUCKET_META_ID: &str = "_meta";
const BUCKET_META_VERSION: &str = "1.0";

/// Source of write timestamps.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// Destination collection for `classification` under `layout`.
/// [`Classification::NotFeedback`] has none.
pub fn target_for(layout: TargetLayout, classification: Classification) -> Option<DocPath> {
    let bucket = match classification {
        Classification::NotFeedback => return None,
        Classification::Madrichim => "madrichim",
        Classification::Defense474 => "defense474",
        Classification::General => "general",
    };
    Some(match layout {
        TargetLayout::Nested => DocPath::from_segments(["feedbacks", bucket, "items"]),
        TargetLayout::Flat => DocPath::collection(match classification {
            Classification::Defense474 => "feedback_defense_474".to_string(),
            _ => format!("feedback_{bucket}"),
        }),
    })
}

/// A computed, not yet executed, merge write.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub classification: Classification,
    pub collection: DocPath,
    pub id: String,
    pub write: MergeWrite,
    pub records: Vec<NormalizationRecord>,
}

impl Plan {
    /// Destination document path.
    pub fn target(&self) -> DocPath {
        self.collection.child(self.id.clone())
    }
}

/// What [`Planner::apply`] did with one document.
#[derive(Debug)]
pub enum Outcome {
    /// Not a feedback document; nothing planned.
    Skipped,
    /// Report-only: the write was planned and recorded, not performed.
    Planned { target: DocPath },
    Written { target: DocPath },
    Failed { target: DocPath, error: StoreError },
}

pub struct Planner<'a> {
    store: &'a dyn DocumentStore,
    normalizer: Normalizer,
    layout: TargetLayout,
    clock: Clock,
}

impl<'a> Planner<'a> {
    pub fn new(store: &'a dyn DocumentStore, config: &Config) -> Self {
        Self {
            store,
            normalizer: Normalizer::new(config),
            layout: config.targets.layout,
            clock: system_clock(),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn target_for(&self, classification: Classification) -> Option<DocPath> {
        target_for(self.layout, classification)
    }

    /// Every destination collection this planner can write to.
    pub fn target_collections(&self) -> Vec<DocPath> {
        Classification::FEEDBACK
            .iter()
            .filter_map(|c| self.target_for(*c))
            .collect()
    }

    /// Build the write for `doc` without touching the store.
    pub fn plan(&self, doc: &Document, classification: Classification) -> Option<Plan> {
        let collection = self.target_for(classification)?;
        let now = (self.clock)().to_rfc3339_opts(SecondsFormat::Millis, true);

        let course_type = self.normalizer.course_type_of(&doc.fields, classification);
        let department = self.normalizer.department_of(&doc.fields);

        let mut fields = doc.fields.clone();
        let mut records = Vec::new();
        // Lists and maps stay as copied from the source.
        for (key, normalized) in [(COURSE_TYPE, course_type), (DEPARTMENT, department)] {
            if let Some(normalized) = normalized {
                fields.insert(key.to_string(), text_value(normalized.value));
                records.extend(normalized.record);
            }
        }
        fields.insert(SOURCE_PATH.to_string(), Value::String(doc.path.to_string()));
        fields.insert(MIGRATED_AT.to_string(), Value::String(now.clone()));

        let mut defaults = refile_core::Fields::new();
        if !has_value(fields.get(CREATED_AT)) {
            fields.remove(CREATED_AT);
            defaults.insert(CREATED_AT.to_string(), Value::String(now));
        }

        Some(Plan {
            classification,
            collection,
            id: doc.id.clone(),
            write: MergeWrite { fields, defaults },
            records,
        })
    }

    /// Plan `doc` and, in [`ExecutionMode::Apply`], write it. Normalization
    /// changes, the write and any failure are recorded in `report`.
    pub async fn apply(
        &self,
        doc: &Document,
        classification: Classification,
        mode: ExecutionMode,
        report: &mut RunReport,
    ) -> Outcome {
        let Some(plan) = self.plan(doc, classification) else {
            return Outcome::Skipped;
        };
        let source_path = doc.path.to_string();

        for record in &plan.records {
            report.record_normalization(&source_path, record.clone());
        }

        let outcome = self.execute(&plan, mode).await;
        match &outcome {
            Outcome::Planned { target } => {
                tracing::info!(source = %source_path, %target, "would copy");
            }
            Outcome::Written { target } => {
                tracing::info!(source = %source_path, %target, "copied");
            }
            Outcome::Failed { target, error } => {
                tracing::warn!(source = %source_path, %target, %error, "copy failed");
                report.record_write_failure(WriteFailure {
                    source_path,
                    target_path: target.to_string(),
                    error: error.to_string(),
                });
                return outcome;
            }
            Outcome::Skipped => return outcome,
        }

        report.record_write(PlannedWrite {
            source_path,
            target_path: plan.target().to_string(),
            classification,
            written: matches!(outcome, Outcome::Written { .. }),
        });
        outcome
    }

    /// Build the `_meta` write describing the bucket for `classification`.
    /// Descriptive keys are overwritten on every write; `createdAt` is only
    /// set once.
    pub fn plan_bucket(&self, classification: Classification) -> Option<Plan> {
        let collection = self.target_for(classification)?;
        let (description, category) = bucket_meta(classification)?;
        let now = (self.clock)().to_rfc3339_opts(SecondsFormat::Millis, true);

        let mut fields = refile_core::Fields::new();
        fields.insert("description".to_string(), description.into());
        fields.insert("category".to_string(), category.into());
        fields.insert("version".to_string(), BUCKET_META_VERSION.into());
        fields.insert(UPDATED_AT.to_string(), Value::String(now.clone()));

        let mut defaults = refile_core::Fields::new();
        defaults.insert(CREATED_AT.to_string(), Value::String(now));

        Some(Plan {
            classification,
            collection,
            id: BUCKET_META_ID.to_string(),
            write: MergeWrite { fields, defaults },
            records: Vec::new(),
        })
    }

    /// Plan and, in [`ExecutionMode::Apply`], write the `_meta` document of
    /// one bucket. The outcome is recorded in `report`.
    pub async fn init_bucket(
        &self,
        classification: Classification,
        mode: ExecutionMode,
        report: &mut RunReport,
    ) -> Outcome {
        let Some(plan) = self.plan_bucket(classification) else {
            return Outcome::Skipped;
        };
        let outcome = self.execute(&plan, mode).await;
        let error = match &outcome {
            Outcome::Failed { target, error } => {
                tracing::warn!(%target, %error, "bucket setup failed");
                Some(error.to_string())
            }
            Outcome::Skipped => return outcome,
            Outcome::Planned { target } | Outcome::Written { target } => {
                tracing::info!(%target, %mode, "bucket metadata");
                None
            }
        };
        report.record_bucket_write(BucketWrite {
            target_path: plan.target().to_string(),
            classification,
            written: matches!(outcome, Outcome::Written { .. }),
            error,
        });
        outcome
    }

    async fn execute(&self, plan: &Plan, mode: ExecutionMode) -> Outcome {
        let target = plan.target();
        if !mode.writes() {
            return Outcome::Planned { target };
        }
        match self.store.merge_write(&plan.collection, &plan.id, &plan.write).await {
            Ok(()) => Outcome::Written { target },
            Err(error) => Outcome::Failed { target, error },
        }
    }
}

fn bucket_meta(classification: Classification) -> Option<(&'static str, &'static str)> {
    match classification {
        Classification::NotFeedback => None,
        Classification::Madrichim => Some(("משוב מיונים וקורס מדריכים", "madrichim")),
        Classification::Defense474 => Some(("משוב מחלקות הגנה 474", "defense")),
        Classification::General => Some(("משוב כללי", "general")),
    }
}

fn text_value(value: Option<String>) -> Value {
    value.map(Value::String).unwrap_or(Value::Null)
}

fn has_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
