//! `create-registry`: create the registry index and its Field Registry.

use anyhow::{Context, Result};
use regmgr_core::{IndexSchema, RegmgrConfig};
use regmgr_es::provisioner::validate_index_name;
use regmgr_es::{IndexProvisioner, ProvisionReport, schemas};
use serde_json::Value;

use super::{connect, registry_names};
use crate::cli::CreateRegistryArgs;

/// Validate every input, then create both indices.
pub async fn run(config: &RegmgrConfig, args: &CreateRegistryArgs) -> Result<()> {
    let report = create(config, args).await?;
    for index in &report.indices {
        println!("Created index {index}");
    }
    Ok(())
}

pub(crate) async fn create(
    config: &RegmgrConfig,
    args: &CreateRegistryArgs,
) -> Result<ProvisionReport> {
    let names = registry_names(config);
    validate_index_name(names.primary())?;
    validate_index_name(&names.dictionary())?;

    let registry_template = template(args.schema.as_deref(), schemas::registry_template)
        .context("Invalid registry schema")?;
    let dd_template = template(args.dd_schema.as_deref(), schemas::dictionary_template)
        .context("Invalid Field Registry schema")?;
    let schema = IndexSchema::new(registry_template, args.shards, args.replicas)?;

    let provisioner = IndexProvisioner::new(connect(config)?);
    Ok(provisioner.create_registry(&names, &schema, dd_template).await?)
}

fn template(
    path: Option<&std::path::Path>,
    builtin: fn() -> regmgr_core::Result<Value>,
) -> regmgr_core::Result<Value> {
    match path {
        Some(path) => schemas::load_template(path),
        None => builtin(),
    }
}
