//! The Field Registry: persisted identifier → engine data type records.
//!
//! The registry lives in its own index (the primary index name plus the
//! dictionary suffix). Writes are idempotent upserts keyed by the field
//! identifier, so re-ingesting a dictionary converges to the same state.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use regmgr_core::{Error, FieldRegistryEntry, RegistryNames, Result};
use serde_json::{Value, json};

use crate::client::{Request, SearchEngine, doc_path};
use crate::loader::{BulkLoader, Document, LoadReport, LoaderOptions};

/// Hits per `_search` page when listing identifiers.
const PAGE_SIZE: usize = 1_000;

/// Result of looking up one identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Registered with this engine data type.
    Found(String),
    /// Not in the registry.
    NotFound,
}

impl Lookup {
    /// The data type, when found.
    pub fn data_type(&self) -> Option<&str> {
        match self {
            Lookup::Found(data_type) => Some(data_type),
            Lookup::NotFound => None,
        }
    }
}

/// Handle on the Field Registry index.
#[derive(Clone)]
pub struct FieldRegistry {
    engine: Arc<dyn SearchEngine>,
    index: String,
}

impl FieldRegistry {
    /// Registry for the given primary/dictionary index pair.
    pub fn new(engine: Arc<dyn SearchEngine>, names: &RegistryNames) -> Self {
        Self {
            engine,
            index: names.dictionary(),
        }
    }

    /// Registry index name.
    pub fn index(&self) -> &str {
        &self.index
    }

    /// Upsert one entry, replacing any previous record for the identifier.
    pub async fn put(&self, entry: &FieldRegistryEntry) -> Result<()> {
        let body = serde_json::to_value(entry)?;
        self.engine
            .request(Request::put(doc_path(&self.index, &entry.field_id)).with_json(body))
            .await?;
        tracing::debug!(index = %self.index, field = %entry.field_id, "Registered field");
        Ok(())
    }

    /// Upsert many entries through the bulk loader.
    pub async fn put_all(
        &self,
        entries: Vec<FieldRegistryEntry>,
        options: LoaderOptions,
    ) -> Result<LoadReport> {
        let documents = entries
            .into_iter()
            .map(|entry| {
                let source = serde_json::to_value(&entry)?;
                Ok(Document::new(entry.field_id, source))
            })
            .collect::<Result<Vec<_>>>()?;

        BulkLoader::new(Arc::clone(&self.engine), options)
            .load(&self.index, documents)
            .await
    }

    /// Look up many identifiers in one `_mget` round trip.
    ///
    /// Every requested identifier appears in the result. An empty input
    /// issues no request.
    pub async fn get_many<I, S>(&self, ids: I) -> Result<BTreeMap<String, Lookup>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: BTreeSet<String> = ids.into_iter().map(Into::into).collect();
        if ids.is_empty() {
            return Ok(BTreeMap::new());
        }

        let request = Request::get(format!("/{}/_mget?_source=es_data_type", self.index))
            .with_json(json!({ "ids": &ids }));
        let response = self.engine.request(request).await?;

        let docs = response
            .body
            .get("docs")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                Error::engine(200, format!("/{}/_mget", self.index), "Response has no 'docs' array")
            })?;

        let mut result: BTreeMap<String, Lookup> =
            ids.into_iter().map(|id| (id, Lookup::NotFound)).collect();
        for doc in docs {
            let Some(id) = doc.get("_id").and_then(Value::as_str) else {
                continue;
            };
            let found = doc.get("found").and_then(Value::as_bool).unwrap_or(false);
            let data_type = doc.pointer("/_source/es_data_type").and_then(Value::as_str);
            match (found, data_type) {
                (true, Some(data_type)) => {
                    result.insert(id.to_string(), Lookup::Found(data_type.to_string()));
                }
                (true, None) => {
                    tracing::warn!(index = %self.index, field = id, "Registry entry has no es_data_type");
                }
                (false, _) => {}
            }
        }

        tracing::debug!(
            index = %self.index,
            requested = result.len(),
            found = result.values().filter(|l| matches!(l, Lookup::Found(_))).count(),
            "Registry lookup"
        );
        Ok(result)
    }

    /// Every registered identifier.
    pub async fn get_all_field_names(&self) -> Result<BTreeSet<String>> {
        let mut names = BTreeSet::new();
        let mut search_after: Option<Value> = None;

        loop {
            let mut body = json!({
                "size": PAGE_SIZE,
                "_source": false,
                "sort": [{"es_field_name": "asc"}],
            });
            if let Some(after) = &search_after {
                body["search_after"] = after.clone();
            }

            let response = self
                .engine
                .request(Request::post(format!("/{}/_search", self.index)).with_json(body))
                .await?;
            let hits = response
                .body
                .pointer("/hits/hits")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();

            for hit in &hits {
                if let Some(id) = hit.get("_id").and_then(Value::as_str) {
                    names.insert(id.to_string());
                }
            }

            search_after = hits.last().and_then(|hit| hit.get("sort")).cloned();
            if hits.len() < PAGE_SIZE || search_after.is_none() {
                break;
            }
        }

        Ok(names)
    }
}

// ============================================================================
// Tests
// ============================================================================
