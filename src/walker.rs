//! Tree walker — lazy depth-first enumeration of every document in the store.
//!
//! The walk is driven by an explicit stack instead of recursion, so depth is
//! bounded only by memory. Order is pre-order: a document is yielded, then
//! everything below it, then its next sibling. Documents within a collection
//! come in store snapshot order; sub-collections in store listing order.
//!
//! A failed collection read or sub-collection listing is logged and recorded
//! as a [`BranchFailure`]; the walk carries on with the sibling branches.

use futures::Stream;
use tokio_util::sync::CancellationToken;

use refile_core::report::BranchFailure;
use refile_core::{DocPath, Document};
use refile_store::{DocumentStore, StoreError};

enum Frame {
    /// Collection still to be read.
    Collection(DocPath),
    /// Document read but not yet yielded; its sub-collections are unlisted.
    Document(Document),
}

/// Single-pass walker over one or more root collections.
pub struct TreeWalker<'a> {
    store: &'a dyn DocumentStore,
    stack: Vec<Frame>,
    failures: Vec<BranchFailure>,
    scanned: Vec<DocPath>,
    cancel: Option<CancellationToken>,
    cancelled: bool,
}

impl<'a> TreeWalker<'a> {
    pub fn new(store: &'a dyn DocumentStore, roots: impl IntoIterator<Item = DocPath>) -> Self {
        let mut stack: Vec<Frame> = roots.into_iter().map(Frame::Collection).collect();
        stack.reverse();
        Self {
            store,
            stack,
            failures: Vec::new(),
            scanned: Vec::new(),
            cancel: None,
            cancelled: false,
        }
    }

    /// Stop before the next store call once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Next document, or `None` when the tree is exhausted or the walk was
    /// cancelled.
    pub async fn next(&mut self) -> Option<Document> {
        loop {
            if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
                if !self.stack.is_empty() {
                    tracing::info!(pending = self.stack.len(), "walk cancelled");
                    self.cancelled = true;
                    self.stack.clear();
                }
                return None;
            }

            match self.stack.pop()? {
                Frame::Collection(path) => match self.store.get_documents(&path).await {
                    Ok(docs) => {
                        tracing::debug!(%path, documents = docs.len(), "collection read");
                        self.scanned.push(path);
                        self.stack.extend(docs.into_iter().rev().map(Frame::Document));
                    }
                    Err(err) => self.branch_failed(path, err),
                },
                Frame::Document(doc) => {
                    match self.store.list_collections(&doc.path).await {
                        Ok(subs) => self.stack.extend(subs.into_iter().rev().map(Frame::Collection)),
                        Err(err) => self.branch_failed(doc.path.clone(), err),
                    }
                    return Some(doc);
                }
            }
        }
    }

    /// Branches that could not be read so far.
    pub fn failures(&self) -> &[BranchFailure] {
        &self.failures
    }

    /// Collections successfully read so far, in read order.
    pub fn scanned_collections(&self) -> &[DocPath] {
        &self.scanned
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Consume the walker into a `Stream` of documents. Branch failures are
    /// still logged but can no longer be inspected.
    pub fn into_stream(self) -> impl Stream<Item = Document> + 'a {
        futures::stream::unfold(self, |mut walker| async move {
            let doc = walker.next().await?;
            Some((doc, walker))
        })
    }

    fn branch_failed(&mut self, path: DocPath, err: StoreError) {
        tracing::warn!(%path, error = %err, "branch skipped");
        self.failures.push(BranchFailure {
            path: path.to_string(),
            error: err.to_string(),
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
