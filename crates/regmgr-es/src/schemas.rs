//! Built-in index templates, used when no schema file is given.

use std::path::Path;

use regmgr_core::{Error, Result};
use serde_json::Value;

/// Template for the primary registry index.
pub const REGISTRY_TEMPLATE: &str = include_str!("../schemas/registry.json");

/// Template for the Field Registry index.
pub const DICTIONARY_TEMPLATE: &str = include_str!("../schemas/data-dic.json");

/// Parsed primary index template.
pub fn registry_template() -> Result<Value> {
    Ok(serde_json::from_str(REGISTRY_TEMPLATE)?)
}

/// Parsed Field Registry template.
pub fn dictionary_template() -> Result<Value> {
    Ok(serde_json::from_str(DICTIONARY_TEMPLATE)?)
}

/// Read a template from a JSON file.
pub fn load_template(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
    serde_json::from_str(&content).map_err(|e| {
        Error::validation_field(
            "schema",
            format!("Invalid schema file {}: {e}", path.display()),
        )
    })
}
