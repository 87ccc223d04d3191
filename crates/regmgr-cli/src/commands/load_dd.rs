//! `load-dd`: load a data dictionary into the Field Registry.

use anyhow::Result;
use regmgr_core::RegmgrConfig;
use regmgr_dd::DataTypeMap;
use regmgr_es::IngestReport;

use super::manager;
use crate::cli::LoadDdArgs;

/// Parse the dictionary, then upsert its attributes.
pub async fn run(config: &RegmgrConfig, args: &LoadDdArgs) -> Result<()> {
    let report = ingest(config, args).await?;
    println!(
        "Loaded {} of {} field definitions (dictionary version {}, {})",
        report.load.succeeded(),
        report.info.attribute_count,
        report.info.version.as_deref().unwrap_or("unknown"),
        report.info.date.as_deref().unwrap_or("undated"),
    );
    report.load.into_result()?;
    Ok(())
}

pub(crate) async fn ingest(config: &RegmgrConfig, args: &LoadDdArgs) -> Result<IngestReport> {
    let types = DataTypeMap::with_overrides(&config.datatypes);
    let manager = manager(config)?;
    Ok(manager.ingest_dictionary(&args.dictionary, &types).await?)
}
