//! Permission broker
//!
//! Turns a capability key into a usable grant id, reusing a cached grant
//! when the authority still reports it approved and asking for a new one
//! otherwise. The broker never waits for a human; see
//! [`PermissionPoller`](super::PermissionPoller) for that.

use reqwest::Method;
use serde_json::json;
use std::sync::Arc;

use super::authority::{fetch_grant, GRANT_REQUEST_PATH};
use super::cache::GrantCache;
use super::types::{CapabilityKey, GrantRecord};
use crate::core::{GateError, GateResult};
use crate::transport::{Exchange, RequestExecutor};

/// What the broker could obtain for a capability
#[derive(Debug, Clone, PartialEq)]
pub enum Obtained {
    /// A grant the authority reports approved, ready to attach
    Approved(GrantRecord),
    /// A freshly requested grant awaiting a human decision.
    ///
    /// The record is the authority's creation response, untouched.
    Pending(GrantRecord),
}

impl Obtained {
    /// The usable grant id, only when approved
    pub fn id(&self) -> Option<&str> {
        match self {
            Obtained::Approved(record) => Some(record.id.as_str()),
            Obtained::Pending(_) => None,
        }
    }

    pub fn record(&self) -> &GrantRecord {
        match self {
            Obtained::Approved(record) | Obtained::Pending(record) => record,
        }
    }
}

/// Obtains grants from the authority on behalf of one client
pub struct PermissionBroker {
    executor: Arc<RequestExecutor>,
    cache: Arc<GrantCache>,
}

impl PermissionBroker {
    /// Create a broker over an executor and a (possibly shared) cache
    pub fn new(executor: Arc<RequestExecutor>, cache: Arc<GrantCache>) -> Self {
        Self { executor, cache }
    }

    pub fn cache(&self) -> &Arc<GrantCache> {
        &self.cache
    }

    /// Return a usable grant for `key`, or the pending creation record.
    ///
    /// 1. A cached id that still reads as approved is reused without a new
    ///    grant request.
    /// 2. Otherwise one grant is requested; a non-empty id is cached.
    /// 3. If the new grant is already approved it is returned as usable.
    ///
    /// Creation failures leave the cache untouched.
    pub async fn obtain(&self, key: &CapabilityKey, detail: &str) -> GateResult<Obtained> {
        if let Some(cached) = self.cache.get(key) {
            if self.is_approved(&cached).await {
                tracing::info!("Reusing approved grant {} for {}", cached, key);
                return Ok(Obtained::Approved(GrantRecord::approved(cached)));
            }
            tracing::info!("Cached grant {} for {} is no longer approved", cached, key);
        }

        let record = self.request_grant(key, detail).await?;
        if !record.has_id() {
            tracing::warn!("Authority returned a grant without an id for {}", key);
            return Ok(Obtained::Pending(record));
        }

        self.cache.put(key.clone(), record.id.clone());
        if self.is_approved(&record.id).await {
            tracing::info!("Grant {} for {} is pre-approved", record.id, key);
            return Ok(Obtained::Approved(record));
        }

        tracing::info!("Grant {} for {} awaits approval", record.id, key);
        Ok(Obtained::Pending(record))
    }

    /// Single status check against the authority
    pub async fn is_approved(&self, id: &str) -> bool {
        if id.trim().is_empty() {
            return false;
        }
        fetch_grant(&self.executor, id, None)
            .await
            .map(|record| record.is_approved())
            .unwrap_or(false)
    }

    async fn request_grant(&self, key: &CapabilityKey, detail: &str) -> GateResult<GrantRecord> {
        let body = json!({
            "tool": key.tool,
            "capability": key.capability,
            "scope": key.scope.as_str(),
            "detail": detail,
            "identity": self.executor.identity().get(),
        });

        tracing::info!("Requesting grant for {}", key);
        match self
            .executor
            .execute(Method::POST, GRANT_REQUEST_PATH, Some(&body))
            .await
        {
            Exchange::Ok { body, .. } => GrantRecord::from_value(&body).ok_or_else(|| {
                GateError::PermissionRequestFailed("malformed grant response".to_string())
            }),
            Exchange::HttpError { http_status, .. } => Err(GateError::PermissionRequestFailed(
                format!("authority returned HTTP {}", http_status),
            )),
            Exchange::TransportError { detail } => {
                Err(GateError::PermissionRequestFailed(detail))
            }
        }
    }
}
