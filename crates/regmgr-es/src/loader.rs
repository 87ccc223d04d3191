//! Batched bulk indexing.
//!
//! Documents are grouped into batches of `batch_size` and each batch is sent
//! as one `_bulk` request. Per-document failures are collected rather than
//! aborting the load, so one bad record never stops the remaining batches.

use std::sync::Arc;

use futures::StreamExt;
use regmgr_core::config::LoaderConfig;
use regmgr_core::{Error, Result};
use serde_json::{Value, json};

use crate::client::{Request, SearchEngine};

/// Number of failures quoted in a [`Error::PartialBatchFailure`].
const MAX_REPORTED_FAILURES: usize = 10;

/// Bulk loader settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderOptions {
    /// Documents per `_bulk` request.
    pub batch_size: usize,
    /// Batches in flight at once.
    pub concurrency: usize,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            batch_size: 100,
            concurrency: 1,
        }
    }
}

impl From<&LoaderConfig> for LoaderOptions {
    fn from(config: &LoaderConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            concurrency: config.concurrency,
        }
    }
}

/// A document to index.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Document `_id`.
    pub id: String,
    /// Document body; must be a JSON object.
    pub source: Value,
}

impl Document {
    /// Create a document.
    pub fn new(id: impl Into<String>, source: Value) -> Self {
        Self {
            id: id.into(),
            source,
        }
    }
}

/// Outcome of one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Documents the engine accepted.
    pub succeeded: usize,
    /// Rejected documents with the reason.
    pub failed: Vec<(String, String)>,
    /// Set when the whole batch could not be delivered.
    pub error: Option<String>,
}

impl BatchReport {
    /// Documents in the batch.
    pub fn total(&self) -> usize {
        self.succeeded + self.failed.len()
    }
}

/// Outcome of a whole load, one [`BatchReport`] per batch in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Target index.
    pub index: String,
    /// Per-batch outcomes.
    pub batches: Vec<BatchReport>,
}

impl LoadReport {
    /// Documents submitted.
    pub fn total(&self) -> usize {
        self.batches.iter().map(BatchReport::total).sum()
    }

    /// Documents accepted.
    pub fn succeeded(&self) -> usize {
        self.batches.iter().map(|b| b.succeeded).sum()
    }

    /// Every rejected document, batch by batch.
    pub fn failures(&self) -> impl Iterator<Item = &(String, String)> {
        self.batches.iter().flat_map(|b| b.failed.iter())
    }

    /// Number of rejected documents.
    pub fn failed(&self) -> usize {
        self.batches.iter().map(|b| b.failed.len()).sum()
    }

    /// The last batch-level delivery error, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.batches.iter().rev().find_map(|b| b.error.as_deref())
    }

    /// Turn any document failure into [`Error::PartialBatchFailure`].
    pub fn into_result(self) -> Result<Self> {
        let failed = self.failed();
        if failed == 0 {
            return Ok(self);
        }
        Err(Error::PartialBatchFailure {
            total: self.total(),
            failed,
            first_failures: self
                .failures()
                .take(MAX_REPORTED_FAILURES)
                .cloned()
                .collect(),
            index: self.index,
        })
    }
}

/// Sends documents to an index in `_bulk` batches.
#[derive(Clone)]
pub struct BulkLoader {
    engine: Arc<dyn SearchEngine>,
    options: LoaderOptions,
}

impl BulkLoader {
    /// Create a loader.
    pub fn new(engine: Arc<dyn SearchEngine>, options: LoaderOptions) -> Self {
        Self { engine, options }
    }

    /// Loader settings.
    pub fn options(&self) -> LoaderOptions {
        self.options
    }

    /// Index `documents` into `index`.
    ///
    /// Only configuration problems fail the call; per-document and per-batch
    /// failures are reported in the returned [`LoadReport`].
    pub async fn load(&self, index: &str, documents: Vec<Document>) -> Result<LoadReport> {
        if index.is_empty() {
            return Err(Error::validation_field("index", "Index name is empty"));
        }
        if self.options.batch_size == 0 {
            return Err(Error::validation_field("batch_size", "Batch size must be > 0"));
        }
        let concurrency = self.options.concurrency.max(1);

        let mut batches = Vec::new();
        let mut iter = documents.into_iter().peekable();
        while iter.peek().is_some() {
            batches.push(iter.by_ref().take(self.options.batch_size).collect::<Vec<_>>());
        }

        tracing::info!(
            index,
            batches = batches.len(),
            batch_size = self.options.batch_size,
            concurrency,
            "Starting bulk load"
        );

        let reports: Vec<BatchReport> = futures::stream::iter(batches)
            .map(|batch| self.send_batch(index, batch))
            .buffered(concurrency)
            .collect()
            .await;

        let report = LoadReport {
            index: index.to_string(),
            batches: reports,
        };
        tracing::info!(
            index,
            total = report.total(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Bulk load finished"
        );
        Ok(report)
    }

    async fn send_batch(&self, index: &str, batch: Vec<Document>) -> BatchReport {
        let mut report = BatchReport::default();
        let mut body = String::new();
        let mut sent = Vec::with_capacity(batch.len());

        for doc in batch {
            if !doc.source.is_object() {
                tracing::warn!(index, id = %doc.id, "Document source is not a JSON object");
                report
                    .failed
                    .push((doc.id, "Document source is not a JSON object".to_string()));
                continue;
            }
            body.push_str(&json!({"index": {"_id": &doc.id}}).to_string());
            body.push('\n');
            body.push_str(&doc.source.to_string());
            body.push('\n');
            sent.push(doc.id);
        }

        if sent.is_empty() {
            return report;
        }

        let request = Request::post(format!("/{index}/_bulk")).with_ndjson(body);
        match self.engine.request(request).await {
            Ok(response) => {
                collect_items(&response.body, sent, &mut report);
            }
            Err(err) => {
                tracing::error!(index, documents = sent.len(), error = %err, "Bulk request failed");
                let reason = err.to_string();
                report
                    .failed
                    .extend(sent.into_iter().map(|id| (id, reason.clone())));
                report.error = Some(reason);
            }
        }

        tracing::debug!(
            index,
            succeeded = report.succeeded,
            failed = report.failed.len(),
            "Batch complete"
        );
        report
    }
}

/// Match `_bulk` response items to the submitted ids.
fn collect_items(body: &Value, sent: Vec<String>, report: &mut BatchReport) {
    let items = body
        .get("items")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    for (pos, id) in sent.into_iter().enumerate() {
        // Each item is `{"<action>": {"_id", "status", "error"?}}`.
        let outcome = items
            .get(pos)
            .and_then(Value::as_object)
            .and_then(|item| item.values().next());

        match outcome {
            Some(result) => match item_error(result) {
                Some(reason) => report.failed.push((id, reason)),
                None => report.succeeded += 1,
            },
            None if body.get("errors").and_then(Value::as_bool) == Some(true) => report
                .failed
                .push((id, "Missing item in bulk response".to_string())),
            None => report.succeeded += 1,
        }
    }
}

fn item_error(result: &Value) -> Option<String> {
    let status = result.get("status").and_then(Value::as_u64).unwrap_or(200);
    match result.get("error") {
        Some(error) => Some(
            error
                .get("reason")
                .and_then(Value::as_str)
                .or_else(|| error.as_str())
                .map(String::from)
                .unwrap_or_else(|| error.to_string()),
        ),
        None if status >= 300 => Some(format!("Rejected with status {status}")),
        None => None,
    }
}

// ============================================================================
// Tests
// ============================================================================
