#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Data dictionary support for the registry manager.
//!
//! - [`parser`]: streaming parser for LDD JSON files, emitting one
//!   [`FieldDefinition`](regmgr_core::FieldDefinition) at a time
//! - [`datatypes`]: logical type → engine type translation table

pub mod datatypes;
pub mod parser;

pub use datatypes::DataTypeMap;
pub use parser::{DictionaryInfo, DictionaryParser, parse_file};
