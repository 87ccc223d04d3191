//! Translation table from dictionary logical types to engine data types.
//!
//! The parser only surfaces the declared logical type (e.g. `ASCII_Real`);
//! callers translate it with a [`DataTypeMap`] before registering the field.

use std::collections::{BTreeMap, HashMap};

use regmgr_core::FieldDefinition;

/// Engine type used for logical types the table does not know.
pub const DEFAULT_ENGINE_TYPE: &str = "keyword";

const DEFAULT_TYPES: &[(&str, &str)] = &[
    ("ASCII_AnyURI", "keyword"),
    ("ASCII_Boolean", "boolean"),
    ("ASCII_DOI", "keyword"),
    ("ASCII_Date", "date"),
    ("ASCII_Date_DOY", "date"),
    ("ASCII_Date_Time", "date"),
    ("ASCII_Date_Time_DOY", "date"),
    ("ASCII_Date_Time_DOY_UTC", "date"),
    ("ASCII_Date_Time_UTC", "date"),
    ("ASCII_Date_Time_YMD", "date"),
    ("ASCII_Date_Time_YMD_UTC", "date"),
    ("ASCII_Date_YMD", "date"),
    ("ASCII_Directory_Path_Name", "keyword"),
    ("ASCII_File_Name", "keyword"),
    ("ASCII_File_Specification_Name", "keyword"),
    ("ASCII_Integer", "integer"),
    ("ASCII_LID", "keyword"),
    ("ASCII_LIDVID", "keyword"),
    ("ASCII_LIDVID_LID", "keyword"),
    ("ASCII_MD5_Checksum", "keyword"),
    ("ASCII_NonNegative_Integer", "long"),
    ("ASCII_Numeric_Base16", "keyword"),
    ("ASCII_Numeric_Base2", "keyword"),
    ("ASCII_Numeric_Base8", "keyword"),
    ("ASCII_Real", "double"),
    ("ASCII_Short_String_Collapsed", "keyword"),
    ("ASCII_Short_String_Preserved", "keyword"),
    ("ASCII_Text_Collapsed", "text"),
    ("ASCII_Text_Preserved", "text"),
    ("ASCII_Time", "keyword"),
    ("ASCII_VID", "keyword"),
    ("UTF8_Short_String_Collapsed", "keyword"),
    ("UTF8_Short_String_Preserved", "keyword"),
    ("UTF8_Text_Collapsed", "text"),
    ("UTF8_Text_Preserved", "text"),
];

/// Logical type → engine type table.
#[derive(Debug, Clone)]
pub struct DataTypeMap {
    types: HashMap<String, String>,
    fallback: String,
}

impl Default for DataTypeMap {
    fn default() -> Self {
        Self {
            types: DEFAULT_TYPES
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            fallback: DEFAULT_ENGINE_TYPE.to_string(),
        }
    }
}

impl DataTypeMap {
    /// Default table with user overrides applied on top.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut map = Self::default();
        for (logical, engine) in overrides {
            map.types.insert(logical.clone(), engine.clone());
        }
        map
    }

    /// Engine type for a logical type, if the table knows it.
    pub fn get(&self, logical: &str) -> Option<&str> {
        self.types.get(logical).map(String::as_str)
    }

    /// Engine type for a logical type, falling back to `keyword`.
    pub fn resolve(&self, logical: &str) -> &str {
        match self.get(logical) {
            Some(engine) => engine,
            None => {
                tracing::warn!(
                    data_type = logical,
                    fallback = %self.fallback,
                    "Unknown dictionary data type"
                );
                &self.fallback
            }
        }
    }

    /// Fill in the engine type of a parsed definition.
    pub fn translate(&self, mut def: FieldDefinition) -> FieldDefinition {
        def.es_data_type = Some(self.resolve(&def.data_type).to_string());
        def
    }

    /// Number of known logical types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
