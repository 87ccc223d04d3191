//! Reading documents from bulk-format NDJSON files.
//!
//! The file alternates action lines and source lines, as written by harvest
//! tools:
//!
//! ```text
//! {"index": {"_id": "urn:nasa:pds:context::1.0"}}
//! {"lid": "urn:nasa:pds:context", "pds:Product/pds:title": "..."}
//! ```

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use regmgr_core::{Error, Result};
use serde_json::Value;

use crate::loader::Document;

/// Read every document of a bulk-format file.
pub fn read_bulk_file(path: &Path) -> Result<Vec<Document>> {
    let file = File::open(path).map_err(|e| Error::io_with_path(e, path))?;
    parse_bulk(BufReader::new(file), &path.display().to_string())
}

/// Parse bulk-format NDJSON. `origin` names the input in error messages.
pub fn parse_bulk<R: BufRead>(reader: R, origin: &str) -> Result<Vec<Document>> {
    let mut documents = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|e| Error::io_with_path(e, origin))?;
        if line.trim().is_empty() {
            continue;
        }

        let value: Value = serde_json::from_str(&line).map_err(|e| {
            Error::validation_field(origin, format!("Invalid JSON at line {line_no}: {e}"))
        })?;

        match pending.take() {
            None => pending = Some((line_no, action_id(&value, origin, line_no)?)),
            Some((_, id)) => documents.push(Document::new(id, value)),
        }
    }

    if let Some((line_no, id)) = pending {
        return Err(Error::validation_field(
            origin,
            format!("Action at line {line_no} for document {id} has no source line"),
        ));
    }

    tracing::debug!(origin, documents = documents.len(), "Read bulk file");
    Ok(documents)
}

fn action_id(value: &Value, origin: &str, line_no: usize) -> Result<String> {
    let meta = value
        .get("index")
        .or_else(|| value.get("create"))
        .ok_or_else(|| {
            Error::validation_field(
                origin,
                format!("Line {line_no} is not an 'index' or 'create' action"),
            )
        })?;
    meta.get("_id")
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| Error::validation_field(origin, format!("Missing _id at line {line_no}")))
}

/// Top-level field names across all documents.
pub fn field_names(documents: &[Document]) -> BTreeSet<String> {
    documents
        .iter()
        .filter_map(|d| d.source.as_object())
        .flat_map(|obj| obj.keys().cloned())
        .collect()
}
