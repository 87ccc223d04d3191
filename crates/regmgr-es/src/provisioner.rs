//! Index creation with an explicit shard/replica topology.

use std::sync::Arc;

use regmgr_core::{Error, IndexSchema, RegistryNames, Result};
use serde_json::Value;

use crate::client::{Request, SearchEngine};

/// Characters the engine rejects in index names.
const FORBIDDEN_INDEX_CHARS: &[char] = &['\\', '/', '*', '?', '"', '<', '>', '|', ' ', ',', '#', ':'];

/// Maximum index name length in bytes.
const MAX_INDEX_NAME_BYTES: usize = 255;

/// What a provisioning call created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    /// Indices created, in creation order.
    pub indices: Vec<String>,
    /// Advisories returned by the engine.
    pub warnings: Vec<String>,
}

impl ProvisionReport {
    fn merge(&mut self, other: ProvisionReport) {
        self.indices.extend(other.indices);
        self.warnings.extend(other.warnings);
    }
}

/// Check an index name against the engine's naming rules.
pub fn validate_index_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| -> Result<()> {
        Err(Error::validation_field(
            "index",
            format!("Invalid index name '{name}': {reason}"),
        ))
    };

    if name.is_empty() {
        return invalid("must not be empty");
    }
    if name.len() > MAX_INDEX_NAME_BYTES {
        return invalid("longer than 255 bytes");
    }
    if name == "." || name == ".." {
        return invalid("reserved name");
    }
    if name.starts_with(['-', '_', '+']) {
        return invalid("must not start with '-', '_' or '+'");
    }
    if name.chars().any(|c| c.is_uppercase()) {
        return invalid("must be lowercase");
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_INDEX_CHARS.contains(c)) {
        return invalid(&format!("must not contain '{c}'"));
    }
    Ok(())
}

/// Creates indices.
#[derive(Clone)]
pub struct IndexProvisioner {
    engine: Arc<dyn SearchEngine>,
}

impl IndexProvisioner {
    /// Create a provisioner.
    pub fn new(engine: Arc<dyn SearchEngine>) -> Self {
        Self { engine }
    }

    /// Create `name` with the topology and template of `schema`.
    ///
    /// # Errors
    ///
    /// A validation error for a bad name (before any request), or the
    /// engine's rejection, e.g. when the index already exists.
    pub async fn create_index(&self, name: &str, schema: &IndexSchema) -> Result<ProvisionReport> {
        validate_index_name(name)?;

        tracing::info!(
            index = name,
            shards = schema.shards(),
            replicas = schema.replicas(),
            "Creating index"
        );

        let response = self
            .engine
            .request(Request::put(format!("/{name}")).with_json(schema.create_index_body()))
            .await?;

        for warning in &response.warnings {
            tracing::warn!(index = name, warning = %warning, "Engine warning");
        }

        Ok(ProvisionReport {
            indices: vec![name.to_string()],
            warnings: response.warnings,
        })
    }

    /// Create the primary index and its Field Registry index.
    ///
    /// The primary index uses `primary`'s topology. The registry index is
    /// built from `registry_template` with one shard and the same replica
    /// count. All inputs are validated before the first request.
    pub async fn create_registry(
        &self,
        names: &RegistryNames,
        primary: &IndexSchema,
        registry_template: Value,
    ) -> Result<ProvisionReport> {
        let dictionary = names.dictionary();
        validate_index_name(names.primary())?;
        validate_index_name(&dictionary)?;
        let registry_schema = IndexSchema::new(registry_template, 1, i64::from(primary.replicas()))?;

        let mut report = self.create_index(names.primary(), primary).await?;
        let registry = self
            .create_index(&dictionary, &registry_schema)
            .await
            .inspect_err(|e| {
                tracing::error!(
                    primary = names.primary(),
                    index = %dictionary,
                    error = %e,
                    "Primary index created but Field Registry index failed"
                );
            })?;
        report.merge(registry);
        Ok(report)
    }
}

// ============================================================================
// Tests
// ============================================================================
