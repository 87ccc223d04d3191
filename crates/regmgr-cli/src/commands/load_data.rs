//! `load-data`: map unseen fields, then bulk load documents.

use anyhow::{Result, bail};
use regmgr_core::RegmgrConfig;
use regmgr_dd::DataTypeMap;
use regmgr_es::DataLoadReport;
use regmgr_es::data::read_bulk_file;

use super::manager;
use crate::cli::LoadDataArgs;

/// Read the bulk file, then reconcile mappings and load.
pub async fn run(config: &RegmgrConfig, args: &LoadDataArgs) -> Result<()> {
    let report = load(config, args).await?;
    println!(
        "Mapped {} new field(s), loaded {} of {} document(s) into {}",
        report.resolution.len(),
        report.load.succeeded(),
        report.load.total(),
        report.load.index,
    );
    if report.persisted > 0 {
        println!("Saved {} fallback type(s) to the Field Registry", report.persisted);
    }
    report.load.into_result()?;
    Ok(())
}

pub(crate) async fn load(config: &RegmgrConfig, args: &LoadDataArgs) -> Result<DataLoadReport> {
    let fallback_type = match args.fallback_type.as_deref().map(str::trim) {
        Some("") => bail!("--fallback-type must not be empty"),
        Some(logical) => {
            let types = DataTypeMap::with_overrides(&config.datatypes);
            Some(types.get(logical).unwrap_or(logical).to_string())
        }
        None => None,
    };

    let documents = read_bulk_file(&args.file)?;
    let manager = manager(config)?;
    Ok(manager
        .load_documents(documents, |_| fallback_type.clone(), args.persist_fallback)
        .await?)
}
