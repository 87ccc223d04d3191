//! Additive reconciliation of an index's live mapping.
//!
//! Fields are only ever added. A field that is already mapped keeps its
//! type; asking for a different one is an error, and nothing is sent.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use regmgr_core::{Error, ResolvedField, Result};
use serde_json::{Map, Value, json};

use crate::client::{Request, SearchEngine};
use crate::resolver::{Resolution, TypeResolver};

/// Reads and extends index mappings.
#[derive(Clone)]
pub struct MappingReconciler {
    engine: Arc<dyn SearchEngine>,
}

impl MappingReconciler {
    /// Create a reconciler.
    pub fn new(engine: Arc<dyn SearchEngine>) -> Self {
        Self { engine }
    }

    /// Live mapping of `index` as field → type, nested properties flattened
    /// with `.`.
    pub async fn current_mapping(&self, index: &str) -> Result<BTreeMap<String, String>> {
        let response = self
            .engine
            .request(Request::get(format!("/{index}/_mapping")))
            .await?;

        let mut fields = BTreeMap::new();
        // `{"<concrete index>": {"mappings": {...}}}`; an alias may resolve to several.
        if let Some(indices) = response.body.as_object() {
            for entry in indices.values() {
                if let Some(properties) = find_properties(entry.get("mappings")) {
                    flatten(properties, "", &mut fields);
                }
            }
        }

        tracing::debug!(index, fields = fields.len(), "Read live mapping");
        Ok(fields)
    }

    /// Names of every mapped field of `index`.
    pub async fn get_field_names(&self, index: &str) -> Result<BTreeSet<String>> {
        Ok(self.current_mapping(index).await?.into_keys().collect())
    }

    /// Add the fields of `fields` not yet in the mapping.
    ///
    /// Returns the number of fields added. An empty input issues no request;
    /// if every field is already mapped only the mapping query is made.
    ///
    /// # Errors
    ///
    /// [`Error::IncompatibleType`] if a field is mapped with a different
    /// type; no update is sent in that case.
    pub async fn reconcile(&self, index: &str, fields: &[ResolvedField]) -> Result<usize> {
        if fields.is_empty() {
            return Ok(0);
        }

        let mapping = self.current_mapping(index).await?;
        let mut new_fields: BTreeMap<&str, &ResolvedField> = BTreeMap::new();

        for field in fields {
            if let Some(mapped) = mapping.get(&field.field_id) {
                if *mapped != field.es_data_type {
                    return Err(Error::IncompatibleType {
                        index: index.to_string(),
                        field: field.field_id.clone(),
                        mapped: mapped.clone(),
                        requested: field.es_data_type.clone(),
                    });
                }
                continue;
            }
            if let Some(previous) = new_fields.insert(&field.field_id, field)
                && previous.es_data_type != field.es_data_type
            {
                return Err(Error::validation_field(
                    field.field_id.as_str(),
                    format!(
                        "Conflicting types requested for field {}: '{}' and '{}'",
                        field.field_id, previous.es_data_type, field.es_data_type
                    ),
                ));
            }
        }

        let new_fields: Vec<ResolvedField> = new_fields.into_values().cloned().collect();
        self.reconcile_new(index, &new_fields).await
    }

    /// Add fields already known to be absent from the mapping, in one
    /// request. An empty input issues no request.
    pub async fn reconcile_new(&self, index: &str, fields: &[ResolvedField]) -> Result<usize> {
        if fields.is_empty() {
            return Ok(0);
        }

        let properties: Map<String, Value> = fields
            .iter()
            .map(|f| (f.field_id.clone(), json!({"type": f.es_data_type})))
            .collect();
        let count = properties.len();

        self.engine
            .request(
                Request::put(format!("/{index}/_mapping"))
                    .with_json(json!({"properties": properties})),
            )
            .await?;

        tracing::info!(index, added = count, "Updated mapping");
        Ok(count)
    }

    /// Map every identifier of `ids` that the index does not have yet,
    /// resolving types through `resolver`.
    ///
    /// The returned [`Resolution`] covers only the newly mapped fields, so
    /// the caller can decide whether to persist fallback-derived types.
    pub async fn update_mappings<I, S, F>(
        &self,
        index: &str,
        ids: I,
        resolver: &TypeResolver,
        fallback: F,
    ) -> Result<Resolution>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&str) -> Option<String>,
    {
        let ids: BTreeSet<String> = ids.into_iter().map(Into::into).collect();
        if ids.is_empty() {
            return Ok(Resolution::default());
        }

        let existing = self.get_field_names(index).await?;
        let missing: Vec<String> = ids.difference(&existing).cloned().collect();
        if missing.is_empty() {
            tracing::debug!(index, "All fields already mapped");
            return Ok(Resolution::default());
        }

        let resolution = resolver.resolve(missing, fallback).await?;
        self.reconcile_new(index, &resolution.fields).await?;
        Ok(resolution)
    }
}

/// Locate the `properties` object of a mappings body, tolerating the older
/// single-type layout (`{"mappings": {"_doc": {"properties": ...}}}`).
fn find_properties(mappings: Option<&Value>) -> Option<&Map<String, Value>> {
    let mappings = mappings?.as_object()?;
    if let Some(properties) = mappings.get("properties") {
        return properties.as_object();
    }
    mappings
        .values()
        .find_map(|v| v.get("properties"))
        .and_then(Value::as_object)
}

fn flatten(properties: &Map<String, Value>, prefix: &str, out: &mut BTreeMap<String, String>) {
    for (name, def) in properties {
        let path = format!("{prefix}{name}");
        if let Some(data_type) = def.get("type").and_then(Value::as_str) {
            out.insert(path.clone(), data_type.to_string());
        }
        if let Some(nested) = def.get("properties").and_then(Value::as_object) {
            flatten(nested, &format!("{path}."), out);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
