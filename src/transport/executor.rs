//! Single HTTP round-trip against the authority or an action endpoint
//!
//! Transport failures, HTTP error statuses and malformed bodies all come
//! back as one [`Exchange`] value; nothing here returns `Err`.
//!
//! Bodies are never logged. Only method, path and status are.

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::core::{GateError, GateResult, Identity};

/// How non-2xx responses are classified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpErrorMode {
    /// Non-2xx responses become [`Exchange::HttpError`]
    Report,
    /// Any response that arrived is [`Exchange::Ok`]; the caller inspects the status
    Tolerate,
}

/// Coarse outcome of an exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeOutcome {
    Ok,
    HttpError,
    TransportError,
}

/// Result of one HTTP round-trip
#[derive(Debug, Clone, PartialEq)]
pub enum Exchange {
    /// A response arrived (and was a success, unless errors are tolerated)
    Ok { http_status: u16, body: Value },
    /// A non-2xx response arrived
    HttpError { http_status: u16, body: Value },
    /// The round-trip itself failed (timeout, DNS, refused connection, ...)
    TransportError { detail: String },
}

impl Exchange {
    pub fn outcome(&self) -> ExchangeOutcome {
        match self {
            Exchange::Ok { .. } => ExchangeOutcome::Ok,
            Exchange::HttpError { .. } => ExchangeOutcome::HttpError,
            Exchange::TransportError { .. } => ExchangeOutcome::TransportError,
        }
    }

    pub fn http_status(&self) -> Option<u16> {
        match self {
            Exchange::Ok { http_status, .. } | Exchange::HttpError { http_status, .. } => {
                Some(*http_status)
            }
            Exchange::TransportError { .. } => None,
        }
    }

    pub fn body(&self) -> Option<&Value> {
        match self {
            Exchange::Ok { body, .. } | Exchange::HttpError { body, .. } => Some(body),
            Exchange::TransportError { .. } => None,
        }
    }

    /// True when a 2xx response arrived, whatever the error mode
    pub fn is_success(&self) -> bool {
        self.http_status()
            .map(|s| (200..300).contains(&s))
            .unwrap_or(false)
    }
}

/// Performs requests relative to a base URL with identity attached
pub struct RequestExecutor {
    client: Client,
    base_url: String,
    timeout: Duration,
    identity: Arc<Identity>,
    identity_header: String,
    error_mode: HttpErrorMode,
}

impl RequestExecutor {
    /// Create an executor.
    ///
    /// `timeout` bounds each individual round-trip.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        identity: Arc<Identity>,
        identity_header: impl Into<String>,
        error_mode: HttpErrorMode,
    ) -> GateResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GateError::InvalidConfig(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            identity,
            identity_header: identity_header.into(),
            error_mode,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn identity(&self) -> &Arc<Identity> {
        &self.identity
    }

    /// Execute a request bounded by the executor's per-call timeout
    pub async fn execute(&self, method: Method, path: &str, body: Option<&Value>) -> Exchange {
        self.execute_within(method, path, body, self.timeout).await
    }

    /// Execute a request bounded by `limit` (never longer than the per-call timeout)
    pub async fn execute_within(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        limit: Duration,
    ) -> Exchange {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("{} {}", method, path);

        let mut request = self
            .client
            .request(method.clone(), &url)
            .timeout(limit.min(self.timeout))
            .header(ACCEPT, "application/json");

        if let Some(body) = body {
            let encoded = match serde_json::to_vec(body) {
                Ok(bytes) => bytes,
                Err(e) => {
                    return Exchange::TransportError {
                        detail: format!("failed to encode request body: {}", e),
                    }
                }
            };
            request = request.header(CONTENT_TYPE, "application/json").body(encoded);
        }

        let identity = self.identity.get();
        if !identity.is_empty() {
            request = request.header(self.identity_header.as_str(), identity);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("{} {} failed: {}", method, path, e);
                return Exchange::TransportError {
                    detail: e.to_string(),
                };
            }
        };

        let status = response.status();
        let raw = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("{} {} body could not be read: {}", method, path, e);
                return Exchange::TransportError {
                    detail: e.to_string(),
                };
            }
        };

        tracing::debug!("{} {} -> {}", method, path, status);

        let body = parse_body(&raw);
        let http_status = status.as_u16();
        if status.is_success() || self.error_mode == HttpErrorMode::Tolerate {
            Exchange::Ok { http_status, body }
        } else {
            Exchange::HttpError { http_status, body }
        }
    }
}

/// Empty bodies read as `{}`; non-JSON bodies are wrapped as `{"raw": text}`
fn parse_body(raw: &str) -> Value {
    if raw.is_empty() {
        return json!({});
    }
    serde_json::from_str(raw).unwrap_or_else(|_| json!({ "raw": raw }))
}
