//! Named-action dispatcher
//!
//! Maps an action name onto the static table, validates the payload, and
//! obtains a grant for gated actions before forwarding. The dispatcher never
//! waits for a human: a pending grant comes back as
//! [`ActionOutcome::PermissionRequired`] and the caller drives approval.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

use super::table::{
    capability_for, default_detail, lookup, validate_payload, ActionSpec, PERMISSION_ID_FIELD,
};
use crate::config::GateConfig;
use crate::core::{ActionOutcome, GateError, GateResult, Identity};
use crate::permissions::{GrantCache, Obtained, PermissionBroker};
use crate::tools::GatedTool;
use crate::transport::{HttpErrorMode, RequestExecutor};

/// Client for the device's named actions
pub struct ActionDispatcher {
    executor: Arc<RequestExecutor>,
    broker: PermissionBroker,
    tool_id: String,
}

impl ActionDispatcher {
    /// Create a dispatcher with its own grant cache
    pub fn new(config: &GateConfig) -> GateResult<Self> {
        Self::with_cache(config, Arc::new(GrantCache::new()))
    }

    /// Create a dispatcher sharing `cache` with other clients
    pub fn with_cache(config: &GateConfig, cache: Arc<GrantCache>) -> GateResult<Self> {
        config.validate()?;
        let identity = Arc::new(Identity::from_env(&config.identity_env));
        let executor = Arc::new(RequestExecutor::new(
            config.base_url.as_str(),
            config.action_timeout(),
            identity,
            config.identity_header.as_str(),
            HttpErrorMode::Report,
        )?);

        Ok(Self {
            broker: PermissionBroker::new(executor.clone(), cache),
            executor,
            tool_id: config.dispatcher_tool.clone(),
        })
    }

    pub fn identity(&self) -> String {
        self.executor.identity().get()
    }

    pub fn set_identity(&self, identity: impl AsRef<str>) {
        self.executor.identity().set(identity);
    }

    pub fn cache(&self) -> &Arc<GrantCache> {
        self.broker.cache()
    }

    /// Dispatch `action` with `payload` (`None` or `null` means `{}`).
    ///
    /// `detail` is the justification shown to the approver; when absent a
    /// redacted summary of the payload is used.
    pub async fn dispatch(
        &self,
        action: &str,
        payload: Option<Value>,
        detail: Option<&str>,
    ) -> ActionOutcome {
        match self.try_dispatch(action, payload, detail).await {
            Ok(outcome) => {
                tracing::info!("Action {} finished: {}", action.trim(), outcome.label());
                outcome
            }
            Err(e) => {
                if e.is_local() {
                    tracing::info!("Action {} rejected: {}", action.trim(), e.code());
                } else {
                    tracing::warn!("Action {} failed: {}", action.trim(), e.code());
                }
                ActionOutcome::Rejected(e)
            }
        }
    }

    async fn try_dispatch(
        &self,
        action: &str,
        payload: Option<Value>,
        detail: Option<&str>,
    ) -> GateResult<ActionOutcome> {
        let name = action.trim();
        if name.is_empty() {
            return Err(GateError::MissingAction);
        }
        let spec = lookup(name).ok_or_else(|| GateError::UnknownAction(name.to_string()))?;

        let payload = match payload {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(value) => value,
        };
        let mut body = validate_payload(spec, &payload)?.clone();

        if spec.requires_permission {
            let detail = match detail.map(str::trim).filter(|d| !d.is_empty()) {
                Some(detail) => detail.to_string(),
                None => default_detail(spec.name, &payload),
            };
            let key = capability_for(spec.name, &self.tool_id);

            match self.broker.obtain(&key, &detail).await? {
                Obtained::Approved(grant) => {
                    body.entry(PERMISSION_ID_FIELD)
                        .or_insert_with(|| Value::String(grant.id));
                }
                Obtained::Pending(request) => {
                    return Ok(ActionOutcome::PermissionRequired(request));
                }
            }
        }

        Ok(self.forward(spec, Value::Object(body)).await)
    }

    async fn forward(&self, spec: &ActionSpec, body: Value) -> ActionOutcome {
        let body = spec.method.sends_body().then_some(&body);
        let exchange = self
            .executor
            .execute(spec.method.as_method(), spec.path, body)
            .await;
        ActionOutcome::from_exchange(exchange)
    }
}

#[async_trait]
impl GatedTool for ActionDispatcher {
    fn name(&self) -> &str {
        &self.tool_id
    }

    fn description(&self) -> &str {
        "Run a named device action, requesting a grant when the action is gated"
    }

    /// Arguments: `{action, payload?, detail?}`
    async fn run(&self, args: &Value) -> ActionOutcome {
        let action = args.get("action").and_then(Value::as_str).unwrap_or_default();
        let payload = args.get("payload").cloned();
        let detail = args.get("detail").and_then(Value::as_str);
        self.dispatch(action, payload, detail).await
    }
}
