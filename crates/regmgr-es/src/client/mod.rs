//! Search engine client abstraction.
//!
//! Every component talks to the engine through a [`SearchEngine`] handle that
//! is passed in explicitly; there is no global connection. The production
//! implementation is [`HttpSearchEngine`]; tests substitute in-memory engines.

mod http;
mod options;

pub use http::HttpSearchEngine;
pub use options::{EngineOptions, RetryOptions};

use async_trait::async_trait;
use regmgr_core::Result;
use serde_json::Value;

/// HTTP verb of an engine request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `GET`
    Get,
    /// `PUT`
    Put,
    /// `POST`
    Post,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Put => write!(f, "PUT"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// A JSON document (`application/json`).
    Json(Value),
    /// Newline-delimited JSON (`application/x-ndjson`), used by `_bulk`.
    NdJson(String),
}

/// A single engine request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// HTTP verb.
    pub method: Method,
    /// Path and query relative to the engine base URL, with a leading `/`.
    pub path: String,
    /// Optional payload.
    pub body: Option<Body>,
}

impl Request {
    /// Create a request without a body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    /// `GET` request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    /// `PUT` request.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    /// `POST` request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    /// Attach a JSON body.
    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(Body::Json(body));
        self
    }

    /// Attach an NDJSON body.
    pub fn with_ndjson(mut self, body: impl Into<String>) -> Self {
        self.body = Some(Body::NdJson(body.into()));
        self
    }

    /// The JSON body, if any.
    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            Some(Body::Json(value)) => Some(value),
            _ => None,
        }
    }
}

/// A successful engine response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    /// Parsed JSON body (`Null` when the engine sent none).
    pub body: Value,
    /// Deprecation and other advisories from `Warning` headers.
    pub warnings: Vec<String>,
}

impl Response {
    /// Response with a JSON body and no warnings.
    pub fn json(body: Value) -> Self {
        Self {
            body,
            warnings: Vec::new(),
        }
    }
}

/// Abstract search engine connection.
///
/// Implementations return [`Error::Transport`](regmgr_core::Error::Transport)
/// or [`Error::Timeout`](regmgr_core::Error::Timeout) for connection-level
/// failures and [`Error::Engine`](regmgr_core::Error::Engine) for non-2xx
/// replies, with the reason extracted from the engine's error body.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Execute one request.
    async fn request(&self, request: Request) -> Result<Response>;
}

/// Percent-encode a document id for use as a path segment.
pub(crate) fn doc_path(index: &str, id: &str) -> String {
    format!("/{index}/_doc/{}", urlencoding::encode(id))
}

// ============================================================================
// Tests
// ============================================================================
