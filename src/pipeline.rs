//! Migration run — walk, classify, normalize, copy, report.
//!
//! A run has two phases. The scan phase walks the whole tree read-only,
//! labels every document and queues the feedback ones in discovery order. The
//! apply phase hands each queued document to the [`Planner`] one at a time.
//! Branch read failures and per-document write failures are recorded in the
//! returned [`RunReport`]; only failing to reach the store at all aborts.
//!
//! With structure setup enabled, a final phase writes the `_meta` document of
//! every destination bucket.

use tokio_util::sync::CancellationToken;

use refile_core::config::ConfigError;
use refile_core::{Classification, Classifier, Config, DocPath, Document, ExecutionMode, RunReport};
use refile_store::{DocumentStore, StoreError};

use crate::planner::{Clock, Planner};
use crate::walker::TreeWalker;

/// Errors that abort a whole run.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    #[error("invalid rule configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("cannot list root collections: {0}")]
    Setup(#[source] StoreError),
}

pub struct Migration<'a> {
    store: &'a dyn DocumentStore,
    classifier: Classifier,
    planner: Planner<'a>,
    roots: Vec<DocPath>,
    cancel: Option<CancellationToken>,
    setup_buckets: bool,
}

impl<'a> Migration<'a> {
    pub fn new(store: &'a dyn DocumentStore, config: &Config) -> Result<Self, MigrateError> {
        config.validate()?;
        Ok(Self {
            store,
            classifier: Classifier::new(config),
            planner: Planner::new(store, config),
            roots: Vec::new(),
            cancel: None,
            setup_buckets: false,
        })
    }

    /// Walk only these collections instead of every root collection.
    pub fn with_roots(mut self, roots: impl IntoIterator<Item = DocPath>) -> Self {
        self.roots = roots.into_iter().collect();
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.planner = self.planner.with_clock(clock);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Also write bucket metadata after the copy phase.
    pub fn with_structure_init(mut self, enabled: bool) -> Self {
        self.setup_buckets = enabled;
        self
    }

    pub fn planner(&self) -> &Planner<'a> {
        &self.planner
    }

    pub async fn run(&self, mode: ExecutionMode) -> Result<RunReport, MigrateError> {
        let mut report = RunReport::new(mode);
        tracing::info!(%mode, "run started");

        let roots = if self.roots.is_empty() {
            self.store
                .list_root_collections()
                .await
                .map_err(MigrateError::Setup)?
        } else {
            self.roots.clone()
        };

        let queue = self.scan(roots, &mut report).await;
        tracing::info!(
            scanned = report.documents_scanned,
            feedback = queue.len(),
            skipped_branches = report.read_failures.len(),
            "scan finished"
        );

        for (doc, classification) in &queue {
            if self.is_cancelled() {
                report.cancelled = true;
                break;
            }
            self.planner.apply(doc, *classification, mode, &mut report).await;
        }

        if self.setup_buckets && !report.cancelled {
            self.init_structure(mode, &mut report).await;
        }

        tracing::info!(
            planned = report.writes.len(),
            written = report.written(),
            failed = report.write_failures.len(),
            "run finished"
        );
        Ok(report)
    }

    /// Write the `_meta` document of every destination bucket, in bucket
    /// order. Replaying it only refreshes `updatedAt`.
    pub async fn init_structure(&self, mode: ExecutionMode, report: &mut RunReport) {
        for classification in Classification::FEEDBACK {
            self.planner.init_bucket(classification, mode, report).await;
        }
    }

    async fn scan(
        &self,
        roots: Vec<DocPath>,
        report: &mut RunReport,
    ) -> Vec<(Document, Classification)> {
        let targets = self.planner.target_collections();
        let mut walker = TreeWalker::new(self.store, roots);
        if let Some(token) = &self.cancel {
            walker = walker.with_cancellation(token.clone());
        }

        let mut queue = Vec::new();
        while let Some(doc) = walker.next().await {
            report.record_scanned();
            // Copies made by an earlier run are not sources.
            if targets.contains(&doc.parent_collection()) {
                tracing::debug!(path = %doc.path, "already in a destination, skipped");
                continue;
            }
            let classification = self.classifier.label(&doc.fields);
            if !classification.is_feedback() {
                continue;
            }
            tracing::debug!(path = %doc.path, %classification, "feedback document");
            report.record_candidate(&doc, classification);
            queue.push((doc, classification));
        }

        report.read_failures.extend(walker.failures().iter().cloned());
        report.scanned_collections = walker
            .scanned_collections()
            .iter()
            .map(ToString::to_string)
            .collect();
        report.cancelled = walker.was_cancelled();
        queue
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }
}
