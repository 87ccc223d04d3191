//! Core types for the registry manager.

mod field;
mod proptests;
mod schema;

pub use field::{FieldDefinition, FieldRegistryEntry, ResolvedField, TypeSource};
pub use schema::{DEFAULT_DICTIONARY_SUFFIX, IndexSchema, RegistryNames};
