//! HTTP implementation of [`SearchEngine`] on top of `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use regmgr_core::{Error, Result};
use reqwest::header::{CONTENT_TYPE, WARNING};
use serde_json::Value;

use super::{Body, EngineOptions, Method, Request, Response, SearchEngine};

/// Search engine reached over HTTP(S).
///
/// Each call is bounded by the configured timeout. Connection failures,
/// timeouts, throttling (429), and server errors (5xx) are retried with
/// exponential backoff; any other non-2xx reply fails immediately.
#[derive(Clone)]
pub struct HttpSearchEngine {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    credentials: Option<(String, String)>,
    retry_policy: ExponentialBuilder,
}

impl std::fmt::Debug for HttpSearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSearchEngine")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("authenticated", &self.credentials.is_some())
            .finish()
    }
}

impl HttpSearchEngine {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the URL is not an `http`/`https` URL.
    pub fn new(options: EngineOptions) -> Result<Self> {
        let url = reqwest::Url::parse(&options.url).map_err(|e| {
            Error::validation_field("url", format!("Invalid engine URL '{}': {e}", options.url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::validation_field(
                "url",
                format!("Unsupported URL scheme '{}'", url.scheme()),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .danger_accept_invalid_certs(options.auth.trust_self_signed)
            .build()
            .map_err(|e| Error::transport_with_source("Failed to build HTTP client", e))?;

        let credentials = options
            .auth
            .basic_credentials()
            .map(|(user, password)| (user.to_string(), password.to_string()));

        Ok(Self {
            client,
            base_url: options.url.trim_end_matches('/').to_string(),
            timeout: options.timeout,
            credentials,
            retry_policy: options.retry.into(),
        })
    }

    /// Engine base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send_once(&self, request: &Request) -> Result<Response> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.client.request(request.method.into(), &url);
        if let Some((user, password)) = &self.credentials {
            builder = builder.basic_auth(user, Some(password));
        }
        builder = match &request.body {
            Some(Body::Json(value)) => builder.json(value),
            Some(Body::NdJson(text)) => builder
                .header(CONTENT_TYPE, "application/x-ndjson")
                .body(text.clone()),
            None => builder,
        };

        tracing::trace!(url = %url, method = %request.method, "Sending request");

        let response = builder.send().await.map_err(|e| self.map_send_error(e))?;
        let status = response.status();
        let warnings: Vec<String> = response
            .headers()
            .get_all(WARNING)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(String::from)
            .collect();
        let text = response.text().await.map_err(|e| self.map_send_error(e))?;

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            status = status.as_u16(),
            "Engine responded"
        );

        if !status.is_success() {
            return Err(Error::engine(
                status.as_u16(),
                &request.path,
                extract_error_message(&text),
            ));
        }

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)?
        };
        Ok(Response { body, warnings })
    }

    fn map_send_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                after: self.timeout,
            }
        } else {
            Error::transport_with_source(format!("Request to {} failed", self.base_url), err)
        }
    }
}

#[async_trait]
impl SearchEngine for HttpSearchEngine {
    async fn request(&self, request: Request) -> Result<Response> {
        let attempt = || self.send_once(&request);

        attempt
            .retry(&self.retry_policy)
            .when(Error::is_retryable)
            .notify(|err, delay| {
                tracing::warn!(
                    method = %request.method,
                    path = %request.path,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Request failed with retryable error. Retrying...",
                );
            })
            .await
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Put => reqwest::Method::PUT,
            Method::Post => reqwest::Method::POST,
        }
    }
}

/// Pull a human-readable reason out of an engine error body.
///
/// Prefers `error.root_cause[0].reason`, then `error.reason`, then a plain
/// string `error`; falls back to the raw body.
pub(crate) fn extract_error_message(text: &str) -> String {
    let Ok(json) = serde_json::from_str::<Value>(text) else {
        let trimmed = text.trim();
        return if trimmed.is_empty() {
            "No response body".to_string()
        } else {
            trimmed.to_string()
        };
    };

    let error = &json["error"];
    error
        .pointer("/root_cause/0/reason")
        .and_then(Value::as_str)
        .or_else(|| error.get("reason").and_then(Value::as_str))
        .or_else(|| error.as_str())
        .map(String::from)
        .unwrap_or_else(|| text.trim().to_string())
}

// ============================================================================
// Tests
// ============================================================================
