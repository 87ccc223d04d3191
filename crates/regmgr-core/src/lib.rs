#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Registry manager core: shared types, errors, configuration and the
//! field identifier codec.
//!
//! This crate has no internal dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`config`]: TOML configuration and authentication file
//! - [`types`]: Field definitions, registry entries, index topology
//! - [`util`]: Field identifier codec

pub mod config;
pub mod error;
pub mod types;
pub mod util;

// Re-exports for convenience
pub use config::{AuthConfig, RegmgrConfig};
pub use error::{Error, Result};
pub use types::{
    FieldDefinition, FieldRegistryEntry, IndexSchema, RegistryNames, ResolvedField, TypeSource,
};
pub use util::ids::field_id;
