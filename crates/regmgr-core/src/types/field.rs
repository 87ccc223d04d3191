//! Field definitions, registry entries, and resolved field types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A field definition produced by parsing a data dictionary.
///
/// Created while streaming a dictionary file and never mutated in place:
/// re-ingesting a dictionary overwrites the registry entry for the same
/// identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Canonical field identifier (`class_ns:class_name/attr_ns:attr_name`).
    pub field_id: String,
    /// Class namespace.
    pub class_ns: String,
    /// Class name.
    pub class_name: String,
    /// Attribute namespace.
    pub attr_ns: String,
    /// Attribute name.
    pub attr_name: String,
    /// Declared logical data type, as the dictionary names it (e.g. `ASCII_Real`).
    pub data_type: String,
    /// Human-readable description.
    pub description: Option<String>,
    /// Engine data type, once translated.
    pub es_data_type: Option<String>,
    /// Dictionary version.
    pub version: Option<String>,
    /// Dictionary date.
    pub date: Option<String>,
}

impl FieldDefinition {
    /// Convert into a registry entry with the given engine data type.
    pub fn into_registry_entry(self, es_data_type: impl Into<String>) -> FieldRegistryEntry {
        FieldRegistryEntry {
            field_id: self.field_id,
            es_data_type: es_data_type.into(),
            class_ns: Some(self.class_ns),
            class_name: Some(self.class_name),
            attr_ns: Some(self.attr_ns),
            attr_name: Some(self.attr_name),
            data_type: Some(self.data_type),
            description: self.description,
            version: self.version,
            date: self.date,
        }
    }
}

/// Persisted Field Registry record: identifier → engine data type.
///
/// Stored as the `_source` of a document in the registry index whose `_id`
/// is the identifier. Entries created from fallback resolution carry only
/// the identifier and type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRegistryEntry {
    /// Canonical field identifier.
    #[serde(rename = "es_field_name")]
    pub field_id: String,
    /// Engine data type.
    pub es_data_type: String,

    /// Class namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_ns: Option<String>,
    /// Class name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    /// Attribute namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attr_ns: Option<String>,
    /// Attribute name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attr_name: Option<String>,

    /// Declared logical data type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Dictionary version.
    #[serde(rename = "ldd_version", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Dictionary date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl FieldRegistryEntry {
    /// Create a bare entry with only an identifier and type.
    pub fn new(field_id: impl Into<String>, es_data_type: impl Into<String>) -> Self {
        Self {
            field_id: field_id.into(),
            es_data_type: es_data_type.into(),
            class_ns: None,
            class_name: None,
            attr_ns: None,
            attr_name: None,
            data_type: None,
            description: None,
            version: None,
            date: None,
        }
    }
}

/// Where a resolved type came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeSource {
    /// Found in the Field Registry.
    Registry,
    /// Supplied by the caller's fallback strategy.
    Fallback,
}

impl fmt::Display for TypeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSource::Registry => write!(f, "registry"),
            TypeSource::Fallback => write!(f, "fallback"),
        }
    }
}

/// A field identifier paired with its resolved engine data type.
///
/// Produced for a single reconciliation request and consumed immediately.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedField {
    /// Canonical field identifier.
    pub field_id: String,
    /// Engine data type.
    pub es_data_type: String,
    /// Where the type came from.
    pub source: TypeSource,
}

impl ResolvedField {
    /// Create a resolved field.
    pub fn new(
        field_id: impl Into<String>,
        es_data_type: impl Into<String>,
        source: TypeSource,
    ) -> Self {
        Self {
            field_id: field_id.into(),
            es_data_type: es_data_type.into(),
            source,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
