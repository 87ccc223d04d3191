//! Streaming parser for data dictionary (LDD) JSON files.
//!
//! Only the `dataDictionary` → `attributeDictionary` subtree is interpreted.
//! The document is consumed token by token; any value under a key the parser
//! does not recognize is skipped with [`IgnoredAny`] without being
//! materialized, so very large dictionaries parse in constant memory apart
//! from the record being built.
//!
//! # Document shape
//!
//! ```text
//! [
//!   { "dataDictionary": {
//!       "Version": "1.15.0.0",
//!       "Date": "2020-09-01",
//!       "classDictionary": [ ...skipped... ],
//!       "attributeDictionary": [
//!         { "attribute": {
//!             "identifier": "0001_NASA_PDS_1.pds.Target_Identification.pds.name",
//!             "dataType": "ASCII_Short_String_Collapsed",
//!             "description": "..."
//!         } }
//!       ]
//!   } }
//! ]
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use regmgr_dd::DictionaryParser;
//!
//! let info = DictionaryParser::open(&path)?.parse(|def| {
//!     println!("{} -> {}", def.field_id, def.data_type);
//!     Ok(())
//! })?;
//! println!("Parsed {} attributes (version {:?})", info.attribute_count, info.version);
//! ```

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use regmgr_core::{Error, FieldDefinition, Result, field_id};
use serde::de::{self, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};

/// Number of dot-separated parts in a dictionary attribute identifier:
/// `dictionaryName.classNamespace.className.attrNamespace.attrName`.
const IDENTIFIER_PARTS: usize = 5;

/// Document-level metadata gathered while parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DictionaryInfo {
    /// `dataDictionary.Version`.
    pub version: Option<String>,
    /// `dataDictionary.Date`.
    pub date: Option<String>,
    /// Number of attribute definitions emitted.
    pub attribute_count: usize,
}

/// Streaming data dictionary parser.
///
/// Each call to [`parse`](Self::parse) consumes the reader; to parse the
/// same file again, open it again.
pub struct DictionaryParser<R> {
    reader: R,
}

impl DictionaryParser<BufReader<File>> {
    /// Open a dictionary file for parsing.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io_with_path(e, path))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: Read> DictionaryParser<R> {
    /// Create a parser over any reader. Buffer the reader yourself;
    /// `serde_json` reads byte by byte.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Parse the dictionary, handing each attribute definition to `sink` as
    /// soon as its object closes.
    ///
    /// An error returned by `sink` aborts parsing and is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns a validation error if:
    /// - The JSON is malformed or not shaped like a dictionary
    /// - An identifier does not have exactly five dot-separated parts
    /// - An attribute has no `identifier` (names its 1-based position)
    /// - An attribute has no `dataType` (names its identifier)
    pub fn parse<F>(self, mut sink: F) -> Result<DictionaryInfo>
    where
        F: FnMut(FieldDefinition) -> Result<()>,
    {
        let mut state = ParseState {
            sink: &mut sink,
            version: None,
            date: None,
            count: 0,
            failure: None,
        };

        let mut de = serde_json::Deserializer::from_reader(self.reader);
        let outcome = Root(&mut state)
            .deserialize(&mut de)
            .and_then(|()| de.end());

        if let Some(err) = state.failure.take() {
            return Err(err);
        }
        outcome.map_err(|e| {
            Error::validation(format!(
                "Malformed data dictionary at line {}, column {}: {e}",
                e.line(),
                e.column()
            ))
        })?;

        Ok(DictionaryInfo {
            version: state.version,
            date: state.date,
            attribute_count: state.count,
        })
    }
}

/// Parse a dictionary file into a vector.
///
/// Convenience for small dictionaries and tests; prefer
/// [`DictionaryParser::parse`] for large files.
pub fn parse_file(path: &Path) -> Result<(DictionaryInfo, Vec<FieldDefinition>)> {
    let mut definitions = Vec::new();
    let info = DictionaryParser::open(path)?.parse(|def| {
        definitions.push(def);
        Ok(())
    })?;
    Ok((info, definitions))
}

// ============================================================================
// Deserialization seeds
// ============================================================================

struct ParseState<'a> {
    sink: &'a mut dyn FnMut(FieldDefinition) -> Result<()>,
    version: Option<String>,
    date: Option<String>,
    count: usize,
    failure: Option<Error>,
}

impl ParseState<'_> {
    /// Record a domain error and produce the serde error that unwinds the
    /// deserializer. The recorded error takes precedence once parsing stops.
    fn fail<E: de::Error>(&mut self, err: Error) -> E {
        let msg = err.to_string();
        self.failure = Some(err);
        E::custom(msg)
    }

    fn emit<E: de::Error>(&mut self, attr: RawAttribute, ordinal: usize) -> std::result::Result<(), E> {
        match attr.into_definition(ordinal, &self.version, &self.date) {
            Ok(def) => (self.sink)(def).map_err(|err| self.fail(err)),
            Err(err) => Err(self.fail(err)),
        }
    }
}

#[derive(Default)]
struct RawAttribute {
    identifier: Option<String>,
    data_type: Option<String>,
    description: Option<String>,
}

impl RawAttribute {
    fn into_definition(
        self,
        ordinal: usize,
        version: &Option<String>,
        date: &Option<String>,
    ) -> Result<FieldDefinition> {
        let Some(id) = self.identifier else {
            return Err(Error::validation_field(
                format!("attribute #{ordinal}"),
                format!("Missing identifier in attribute definition. Index = {ordinal}"),
            ));
        };

        let tokens: Vec<&str> = id.split('.').collect();
        if tokens.len() != IDENTIFIER_PARTS || tokens.iter().any(|t| t.is_empty()) {
            return Err(Error::validation_field(
                id.as_str(),
                format!("Could not parse attribute id {id}"),
            ));
        }

        let Some(data_type) = self.data_type else {
            return Err(Error::validation_field(
                id.as_str(),
                format!("Missing dataType in attribute definition {id}"),
            ));
        };

        let (class_ns, class_name, attr_ns, attr_name) = (tokens[1], tokens[2], tokens[3], tokens[4]);
        let field_id = field_id(class_ns, class_name, attr_ns, attr_name).map_err(|e| {
            Error::validation_field(id.as_str(), format!("Could not parse attribute id {id}: {e}"))
        })?;

        Ok(FieldDefinition {
            field_id,
            class_ns: class_ns.to_string(),
            class_name: class_name.to_string(),
            attr_ns: attr_ns.to_string(),
            attr_name: attr_name.to_string(),
            data_type,
            description: self.description,
            es_data_type: None,
            version: version.clone(),
            date: date.clone(),
        })
    }
}

/// Top level: array of objects.
struct Root<'s, 'a>(&'s mut ParseState<'a>);

impl<'de> DeserializeSeed<'de> for Root<'_, '_> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<(), D::Error> {
        deserializer.deserialize_seq(self)
    }
}

impl<'de> Visitor<'de> for Root<'_, '_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an array of data dictionary objects")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<(), A::Error> {
        let state = self.0;
        while seq.next_element_seed(RootItem(&mut *state))?.is_some() {}
        Ok(())
    }
}

/// Element of the top-level array; only `dataDictionary` is read.
struct RootItem<'s, 'a>(&'s mut ParseState<'a>);

impl<'de> DeserializeSeed<'de> for RootItem<'_, '_> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<(), D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for RootItem<'_, '_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a data dictionary object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<(), A::Error> {
        let state = self.0;
        while let Some(key) = map.next_key::<String>()? {
            if key == "dataDictionary" {
                map.next_value_seed(DataDictionary(&mut *state))?;
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(())
    }
}

/// The `dataDictionary` object.
struct DataDictionary<'s, 'a>(&'s mut ParseState<'a>);

impl<'de> DeserializeSeed<'de> for DataDictionary<'_, '_> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<(), D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for DataDictionary<'_, '_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a dataDictionary object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<(), A::Error> {
        let state = self.0;
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "Version" => state.version = map.next_value()?,
                "Date" => state.date = map.next_value()?,
                "attributeDictionary" => map.next_value_seed(AttributeDictionary(&mut *state))?,
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(())
    }
}

/// The `attributeDictionary` array.
struct AttributeDictionary<'s, 'a>(&'s mut ParseState<'a>);

impl<'de> DeserializeSeed<'de> for AttributeDictionary<'_, '_> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<(), D::Error> {
        deserializer.deserialize_seq(self)
    }
}

impl<'de> Visitor<'de> for AttributeDictionary<'_, '_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an attributeDictionary array")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<(), A::Error> {
        tracing::debug!("Parsing attribute dictionary");
        let state = self.0;
        while seq.next_element_seed(AttributeItem(&mut *state))?.is_some() {}
        Ok(())
    }
}

/// Element of `attributeDictionary`; only `attribute` is read.
struct AttributeItem<'s, 'a>(&'s mut ParseState<'a>);

impl<'de> DeserializeSeed<'de> for AttributeItem<'_, '_> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<(), D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for AttributeItem<'_, '_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an attributeDictionary entry")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<(), A::Error> {
        let state = self.0;
        while let Some(key) = map.next_key::<String>()? {
            if key == "attribute" {
                map.next_value_seed(Attribute(&mut *state))?;
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(())
    }
}

/// A single `attribute` object.
struct Attribute<'s, 'a>(&'s mut ParseState<'a>);

impl<'de> DeserializeSeed<'de> for Attribute<'_, '_> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<(), D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for Attribute<'_, '_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an attribute object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<(), A::Error> {
        let state = self.0;
        state.count += 1;
        let ordinal = state.count;

        let mut attr = RawAttribute::default();
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "identifier" => attr.identifier = Some(map.next_value()?),
                "dataType" => attr.data_type = Some(map.next_value()?),
                "description" => attr.description = map.next_value()?,
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }

        state.emit(attr, ordinal)
    }
}

// ============================================================================
// Tests
// ============================================================================
