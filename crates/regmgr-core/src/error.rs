//! Error types for the registry manager.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Errors that can occur while provisioning, ingesting, or reconciling a
/// registry.
///
/// All error variants are marked with `#[non_exhaustive]` to allow
/// adding new error types without breaking changes.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Malformed input: bad shard/replica counts, malformed dictionary
    /// identifiers, missing required fields.
    #[error("Validation error: {message}")]
    Validation {
        /// Field or aspect that failed validation
        field: Option<String>,
        /// What went wrong
        message: String,
    },

    /// One or more document fields have no known type after dictionary
    /// lookup and fallback.
    #[error(
        "Could not find datatype for field(s): {}.\nSee '{help_url}' for more information.",
        .fields.join(", ")
    )]
    UnresolvedFields {
        /// Every identifier that could not be resolved, sorted
        fields: Vec<String>,
        /// Where documentation on registering new fields lives
        help_url: String,
    },

    /// Reconciliation attempted to change the type of an already-mapped field.
    #[error(
        "Field '{field}' in index '{index}' is mapped as '{mapped}' and cannot be changed to '{requested}'"
    )]
    IncompatibleType {
        /// Target index
        index: String,
        /// Field identifier
        field: String,
        /// Type currently in the live mapping
        mapped: String,
        /// Type the caller tried to apply
        requested: String,
    },

    /// Network failure talking to the search engine.
    #[error("Transport error: {message}")]
    Transport {
        /// Human-readable error message
        message: String,
        /// Source error if available
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Engine call exceeded the per-call timeout.
    #[error("Request timed out after {after:?}")]
    Timeout {
        /// The configured per-call timeout
        after: Duration,
    },

    /// The engine rejected a request with a structured error.
    #[error("Engine error ({status}) on {path}: {message}")]
    Engine {
        /// HTTP status code
        status: u16,
        /// Request path, which names the index
        path: String,
        /// Reason extracted from the engine's error body
        message: String,
    },

    /// Some documents of a bulk load failed while others succeeded.
    #[error("{failed} of {total} documents failed to load into '{index}'")]
    PartialBatchFailure {
        /// Target index
        index: String,
        /// Number of failed documents
        failed: usize,
        /// Number of documents submitted
        total: usize,
        /// Leading (document id, reason) pairs, for the error report
        first_failures: Vec<(String, String)>,
    },

    /// I/O error with the path it happened on.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File the error relates to
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },
}

/// Convenience `Result` type alias for registry manager operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns whether this error is retryable.
    ///
    /// Transport failures and timeouts are transient. Engine rejections are
    /// retryable only for throttling (429) and server-side (5xx) statuses;
    /// a 4xx semantic rejection is permanent.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport { .. } => true,
            Error::Timeout { .. } => true,
            Error::Engine { status, .. } => *status == 429 || *status >= 500,
            Error::Validation { .. } => false,
            Error::UnresolvedFields { .. } => false,
            Error::IncompatibleType { .. } => false,
            Error::PartialBatchFailure { .. } => false,
            Error::Io { .. } => false,
            Error::Serialization(_) => false,
            Error::Config { .. } => false,
        }
    }

    /// Creates a new validation error.
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Error::Validation {
            field: None,
            message: message.into(),
        }
    }

    /// Creates a new validation error with a field name.
    pub fn validation_field<F, M>(field: F, message: M) -> Self
    where
        F: Into<String>,
        M: Into<String>,
    {
        Error::Validation {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Creates a new transport error with a message.
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Error::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new transport error with a message and source error.
    pub fn transport_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new engine error.
    pub fn engine<P, M>(status: u16, path: P, message: M) -> Self
    where
        P: Into<String>,
        M: Into<String>,
    {
        Error::Engine {
            status,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Wraps an I/O error with the path it happened on.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}
