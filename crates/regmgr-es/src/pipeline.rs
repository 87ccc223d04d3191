//! End-to-end registry operations: dictionary ingestion and data loading.

use std::collections::BTreeSet;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use regmgr_core::{Error, FieldRegistryEntry, RegistryNames, Result};
use regmgr_dd::{DataTypeMap, DictionaryInfo, DictionaryParser};
use tokio::sync::Mutex;

use crate::client::SearchEngine;
use crate::data::field_names;
use crate::loader::{BulkLoader, Document, LoadReport, LoaderOptions};
use crate::reconciler::MappingReconciler;
use crate::registry::FieldRegistry;
use crate::resolver::{Resolution, TypeResolver};

/// Outcome of loading a data dictionary into the Field Registry.
#[derive(Debug, Clone)]
pub struct IngestReport {
    /// Dictionary version, date, and attribute count.
    pub info: DictionaryInfo,
    /// Registry upsert results.
    pub load: LoadReport,
}

/// Outcome of loading documents into the primary index.
#[derive(Debug, Clone)]
pub struct DataLoadReport {
    /// Fields newly added to the mapping.
    pub resolution: Resolution,
    /// Fallback types written back to the Field Registry.
    pub persisted: usize,
    /// Document indexing results.
    pub load: LoadReport,
}

/// Registry operations over one primary/dictionary index pair.
///
/// The identifiers held by the Field Registry are read once, on the first
/// data load, and kept for the life of the manager (clones share them).
/// Fields outside that set skip the registry lookup. Dictionary ingestion
/// through this manager drops the snapshot so the next load reads it again.
#[derive(Clone)]
pub struct RegistryManager {
    names: RegistryNames,
    registry: FieldRegistry,
    resolver: TypeResolver,
    reconciler: MappingReconciler,
    loader: BulkLoader,
    known_fields: Arc<Mutex<Option<Arc<BTreeSet<String>>>>>,
}

impl RegistryManager {
    /// Create a manager.
    pub fn new(engine: Arc<dyn SearchEngine>, names: RegistryNames, options: LoaderOptions) -> Self {
        let registry = FieldRegistry::new(Arc::clone(&engine), &names);
        Self {
            resolver: TypeResolver::new(registry.clone()),
            reconciler: MappingReconciler::new(Arc::clone(&engine)),
            loader: BulkLoader::new(engine, options),
            known_fields: Arc::new(Mutex::new(None)),
            registry,
            names,
        }
    }

    /// Override the documentation link quoted in unresolved-field errors.
    pub fn with_help_url(mut self, help_url: impl Into<String>) -> Self {
        self.resolver = self.resolver.with_help_url(help_url);
        self
    }

    /// Index names.
    pub fn names(&self) -> &RegistryNames {
        &self.names
    }

    /// The Field Registry.
    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    /// Parse a dictionary file, translate its logical types, and upsert every
    /// attribute into the Field Registry.
    ///
    /// Translated entries are spooled to a temporary file while parsing, so a
    /// malformed dictionary sends nothing, and then sent in chunks of
    /// `batch_size * concurrency` entries. Re-ingesting the same dictionary
    /// overwrites the same records.
    pub async fn ingest_dictionary(&self, path: &Path, types: &DataTypeMap) -> Result<IngestReport> {
        tracing::info!(path = %path.display(), index = %self.registry.index(), "Loading data dictionary");

        let spool = tempfile::NamedTempFile::new()
            .map_err(|e| Error::io_with_path(e, std::env::temp_dir()))?;
        let info = {
            let mut writer = BufWriter::new(spool.as_file());
            let info = DictionaryParser::open(path)?.parse(|def| {
                let mut def = types.translate(def);
                let data_type = def.es_data_type.take().unwrap_or_default();
                serde_json::to_writer(&mut writer, &def.into_registry_entry(data_type))?;
                writer
                    .write_all(b"\n")
                    .map_err(|e| Error::io_with_path(e, spool.path()))
            })?;
            writer
                .flush()
                .map_err(|e| Error::io_with_path(e, spool.path()))?;
            info
        };

        tracing::info!(
            version = info.version.as_deref().unwrap_or("unknown"),
            date = info.date.as_deref().unwrap_or("unknown"),
            attributes = info.attribute_count,
            "Parsed data dictionary"
        );

        let options = self.loader.options();
        let chunk = options.batch_size.max(1) * options.concurrency.max(1);
        let reader = BufReader::new(
            spool
                .reopen()
                .map_err(|e| Error::io_with_path(e, spool.path()))?,
        );

        let mut load = LoadReport {
            index: self.registry.index().to_string(),
            batches: Vec::new(),
        };
        let mut pending = Vec::with_capacity(chunk);
        for line in reader.lines() {
            let line = line.map_err(|e| Error::io_with_path(e, spool.path()))?;
            pending.push(serde_json::from_str::<FieldRegistryEntry>(&line)?);
            if pending.len() == chunk {
                let report = self.registry.put_all(std::mem::take(&mut pending), options).await?;
                load.batches.extend(report.batches);
            }
        }
        if !pending.is_empty() {
            let report = self.registry.put_all(pending, options).await?;
            load.batches.extend(report.batches);
        }

        *self.known_fields.lock().await = None;
        Ok(IngestReport { info, load })
    }

    /// The registry's identifiers, read on first use.
    async fn known_fields(&self) -> Result<Arc<BTreeSet<String>>> {
        let mut cached = self.known_fields.lock().await;
        if let Some(known) = cached.as_ref() {
            return Ok(Arc::clone(known));
        }
        let known = Arc::new(self.registry.get_all_field_names().await?);
        tracing::debug!(index = %self.registry.index(), fields = known.len(), "Read registry field names");
        *cached = Some(Arc::clone(&known));
        Ok(known)
    }

    /// Make sure every field of `documents` is mapped, then index them.
    ///
    /// Types for unmapped fields come from the Field Registry, then
    /// `fallback`. With `persist_fallback`, fallback-derived types are written
    /// to the Field Registry before loading.
    pub async fn load_documents<F>(
        &self,
        documents: Vec<Document>,
        fallback: F,
        persist_fallback: bool,
    ) -> Result<DataLoadReport>
    where
        F: Fn(&str) -> Option<String>,
    {
        let index = self.names.primary();
        let ids = field_names(&documents);
        tracing::info!(index, documents = documents.len(), fields = ids.len(), "Loading documents");

        let resolver = self
            .resolver
            .clone()
            .with_known_fields(self.known_fields().await?);
        let resolution = self
            .reconciler
            .update_mappings(index, ids, &resolver, fallback)
            .await?;

        let mut persisted = 0;
        let fallback_entries = resolution.fallback_entries();
        if persist_fallback && !fallback_entries.is_empty() {
            persisted = fallback_entries.len();
            self.registry
                .put_all(fallback_entries, self.loader.options())
                .await?
                .into_result()?;
            tracing::info!(fields = persisted, "Saved fallback types to the Field Registry");

            if let Some(known) = self.known_fields.lock().await.as_mut() {
                Arc::make_mut(known).extend(resolution.from_fallback().map(|f| f.field_id.clone()));
            }
        }

        let load = self.loader.load(index, documents).await?;
        Ok(DataLoadReport {
            resolution,
            persisted,
            load,
        })
    }
}
