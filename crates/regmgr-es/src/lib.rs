#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Search engine side of the registry manager.
//!
//! # Modules
//!
//! - [`client`]: The [`SearchEngine`] trait and its HTTP implementation
//! - [`registry`]: The Field Registry (identifier → engine data type)
//! - [`resolver`]: Type resolution with a caller-supplied fallback
//! - [`reconciler`]: Additive mapping updates
//! - [`provisioner`]: Index creation
//! - [`loader`]: Batched `_bulk` indexing
//! - [`data`]: Bulk-format NDJSON input
//! - [`pipeline`]: Dictionary ingestion and data loading
//! - [`schemas`]: Built-in index templates

pub mod client;
pub mod data;
pub mod loader;
pub mod pipeline;
pub mod provisioner;
pub mod reconciler;
pub mod registry;
pub mod resolver;
pub mod schemas;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use client::{
    Body, EngineOptions, HttpSearchEngine, Method, Request, Response, RetryOptions, SearchEngine,
};
pub use loader::{BatchReport, BulkLoader, Document, LoadReport, LoaderOptions};
pub use pipeline::{DataLoadReport, IngestReport, RegistryManager};
pub use provisioner::{IndexProvisioner, ProvisionReport};
pub use reconciler::MappingReconciler;
pub use registry::{FieldRegistry, Lookup};
pub use resolver::{Resolution, TypeResolver};
