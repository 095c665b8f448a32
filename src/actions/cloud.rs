//! Cloud request client
//!
//! Forwards an arbitrary request object to the cloud proxy. The proxy owns
//! permission semantics: when it answers `403 {status: "permission_required",
//! request: {id, ...}}` this client waits for the embedded grant and
//! resubmits the original request with the grant id attached.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

use super::table::PERMISSION_ID_FIELD;
use crate::config::GateConfig;
use crate::core::{ActionOutcome, GateError, GateResult, Identity};
use crate::permissions::{GrantRecord, PermissionPoller, WaitOutcome};
use crate::tools::GatedTool;
use crate::transport::{Exchange, HttpErrorMode, RequestExecutor};

/// Proxy endpoint every cloud request goes to
pub const CLOUD_REQUEST_PATH: &str = "/cloud/request";

/// Name the client is registered under
pub const CLOUD_TOOL_NAME: &str = "cloud_request";

const PERMISSION_REQUIRED_STATUS: u16 = 403;
const PERMISSION_REQUIRED_TAG: &str = "permission_required";

/// Client for templated cloud requests
pub struct CloudActionClient {
    executor: Arc<RequestExecutor>,
    poller: PermissionPoller,
    wait_timeout: Duration,
}

impl CloudActionClient {
    pub fn new(config: &GateConfig) -> GateResult<Self> {
        config.validate()?;
        let identity = Arc::new(Identity::from_env(&config.identity_env));
        let executor = Arc::new(RequestExecutor::new(
            config.base_url.as_str(),
            config.cloud_timeout(),
            identity,
            config.identity_header.as_str(),
            HttpErrorMode::Tolerate,
        )?);

        Ok(Self {
            poller: PermissionPoller::new(executor.clone()).with_interval(config.poll_interval()),
            executor,
            wait_timeout: config.wait_timeout(),
        })
    }

    /// Override the approval wait
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    pub fn identity(&self) -> String {
        self.executor.identity().get()
    }

    pub fn set_identity(&self, identity: impl AsRef<str>) {
        self.executor.identity().set(identity);
    }

    /// Submit `request`, waiting for approval if the proxy asks for it
    pub async fn run(&self, request: Value) -> ActionOutcome {
        match self.try_run(request).await {
            Ok(outcome) => {
                tracing::info!("Cloud request finished: {}", outcome.label());
                outcome
            }
            Err(e) => {
                if e.is_local() {
                    tracing::info!("Cloud request rejected: {}", e.code());
                } else {
                    tracing::warn!("Cloud request failed: {}", e.code());
                }
                ActionOutcome::Rejected(e)
            }
        }
    }

    async fn try_run(&self, request: Value) -> GateResult<ActionOutcome> {
        let Value::Object(payload) = request else {
            return Err(GateError::InvalidRequest(
                "request must be an object".to_string(),
            ));
        };

        let supplied = payload
            .get(PERMISSION_ID_FIELD)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        let (status, body) = match self.submit(&payload, supplied.as_deref()).await {
            Ok(response) => response,
            Err(detail) => return Ok(ActionOutcome::TransportError(detail)),
        };

        if !asks_for_permission(status, &body) {
            return finish(status, body);
        }

        let grant = body
            .get("request")
            .and_then(GrantRecord::from_value)
            .filter(GrantRecord::has_id)
            .ok_or(GateError::MissingPermissionId)?;
        let id = grant.id.trim().to_string();
        tracing::info!("Cloud proxy requires grant {}", id);

        let decision = if grant.is_approved() {
            WaitOutcome::Approved
        } else {
            self.poller.wait(&id, self.wait_timeout).await
        };

        match decision {
            WaitOutcome::Approved => match self.submit(&payload, Some(&id)).await {
                Ok((status, body)) => finish(status, body),
                Err(detail) => Ok(ActionOutcome::TransportError(detail)),
            },
            WaitOutcome::Denied => Ok(ActionOutcome::Denied),
            _ => Ok(ActionOutcome::Timeout),
        }
    }

    /// POST the payload with identity and grant id; `Err` carries a transport failure
    async fn submit(
        &self,
        payload: &Map<String, Value>,
        permission_id: Option<&str>,
    ) -> Result<(u16, Value), String> {
        let mut body = payload.clone();
        body.entry("identity")
            .or_insert_with(|| Value::String(self.identity()));
        if let Some(id) = permission_id {
            body.insert(PERMISSION_ID_FIELD.to_string(), Value::String(id.to_string()));
        }

        match self
            .executor
            .execute(Method::POST, CLOUD_REQUEST_PATH, Some(&Value::Object(body)))
            .await
        {
            Exchange::Ok { http_status, body } | Exchange::HttpError { http_status, body } => {
                Ok((http_status, body))
            }
            Exchange::TransportError { detail } => Err(detail),
        }
    }
}

fn asks_for_permission(status: u16, body: &Value) -> bool {
    status == PERMISSION_REQUIRED_STATUS
        && body.get("status").and_then(Value::as_str) == Some(PERMISSION_REQUIRED_TAG)
}

fn finish(status: u16, body: Value) -> GateResult<ActionOutcome> {
    if !body.is_object() {
        return Err(GateError::InvalidResponse(
            "cloud proxy returned a non-object body".to_string(),
        ));
    }
    Ok(ActionOutcome::Ok {
        http_status: Some(status),
        body,
    })
}

#[async_trait]
impl GatedTool for CloudActionClient {
    fn name(&self) -> &str {
        CLOUD_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Send a request through the cloud proxy, waiting for approval when asked"
    }

    /// Arguments: `{identity?|session_id?, request?}`
    async fn run(&self, args: &Value) -> ActionOutcome {
        if !args.is_object() {
            return ActionOutcome::Rejected(GateError::InvalidRequest(
                "arguments must be an object".to_string(),
            ));
        }

        let identity = ["identity", "session_id"]
            .iter()
            .filter_map(|field| args.get(*field).and_then(Value::as_str))
            .find(|value| !value.trim().is_empty());
        if let Some(identity) = identity {
            self.set_identity(identity);
        }

        let request = match args.get("request") {
            Some(request) if request.is_object() => request.clone(),
            _ => args.clone(),
        };
        CloudActionClient::run(self, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base_url: &str) -> CloudActionClient {
        let config = GateConfig::new(base_url)
            .with_identity_env(Vec::new())
            .with_poll_interval(50);
        CloudActionClient::new(&config).unwrap()
    }

    fn permission_required(request: Value) -> ResponseTemplate {
        ResponseTemplate::new(403)
            .set_body_json(json!({"status": "permission_required", "request": request}))
    }

    #[tokio::test]
    async fn test_approved_grant_resubmits_original_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/cloud/request"))
            .and(body_partial_json(json!({
                "url": "https://api.example.com/v1/items",
                "method": "GET",
                "identity": "default",
                "permission_id": "g-5",
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"status": "ok", "items": [1, 2]})),
            )
            .expect(1)
            .with_priority(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/cloud/request"))
            .respond_with(permission_required(json!({"id": "g-5", "status": "requested"})))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/permissions/g-5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "approved"})))
            .mount(&mock_server)
            .await;

        let outcome = client(&mock_server.uri())
            .run(json!({"url": "https://api.example.com/v1/items", "method": "GET"}))
            .await;
        assert_eq!(outcome.to_json(), json!({"status": "ok", "items": [1, 2]}));
    }

    #[tokio::test]
    async fn test_denied_grant_is_not_resubmitted() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/cloud/request"))
            .respond_with(permission_required(json!({"id": "g-6"})))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/permissions/g-6"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "denied"})))
            .mount(&mock_server)
            .await;

        let outcome = client(&mock_server.uri())
            .run(json!({"url": "https://example.com"}))
            .await;
        assert_eq!(
            outcome.to_json(),
            json!({"status": "error", "error": "permission_denied"})
        );
    }

    #[tokio::test]
    async fn test_undecided_grant_times_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/cloud/request"))
            .respond_with(permission_required(json!({"id": "g-7", "status": "requested"})))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/permissions/g-7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "requested"})))
            .mount(&mock_server)
            .await;

        let outcome = client(&mock_server.uri())
            .with_wait_timeout(Duration::from_secs(1))
            .run(json!({"url": "https://example.com"}))
            .await;
        assert_eq!(
            outcome.to_json(),
            json!({"status": "error", "error": "permission_timeout"})
        );
    }

    #[tokio::test]
    async fn test_missing_permission_id() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/cloud/request"))
            .respond_with(permission_required(json!({"status": "requested"})))
            .mount(&mock_server)
            .await;

        let outcome = client(&mock_server.uri()).run(json!({})).await;
        assert_eq!(
            outcome.to_json(),
            json!({"status": "error", "error": "permission_required", "detail": "missing permission id"})
        );
    }

    #[tokio::test]
    async fn test_embedded_approval_skips_polling() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/cloud/request"))
            .and(body_partial_json(json!({"permission_id": "g-8"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"done": true})))
            .with_priority(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/cloud/request"))
            .respond_with(permission_required(json!({"id": "g-8", "status": "approved"})))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/permissions/g-8"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let outcome = client(&mock_server.uri()).run(json!({"q": 1})).await;
        assert_eq!(outcome.to_json(), json!({"done": true}));
    }

    #[tokio::test]
    async fn test_other_statuses_pass_through() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/cloud/request"))
            .and(body_partial_json(json!({"kind": "bad"})))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "bad_request"})))
            .with_priority(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/cloud/request"))
            .and(body_partial_json(json!({"kind": "list"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["not", "an", "object"])))
            .with_priority(1)
            .mount(&mock_server)
            .await;

        let client = client(&mock_server.uri());

        let outcome = client.run(json!({"kind": "bad"})).await;
        assert_eq!(outcome.to_json(), json!({"error": "bad_request"}));
        assert_eq!(
            outcome,
            ActionOutcome::Ok {
                http_status: Some(400),
                body: json!({"error": "bad_request"})
            }
        );

        let outcome = client.run(json!({"kind": "list"})).await;
        assert_eq!(outcome.label(), "invalid_response");
    }

    #[tokio::test]
    async fn test_supplied_permission_id_and_identity_are_sent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/cloud/request"))
            .and(body_partial_json(json!({"permission_id": "pre", "identity": "caller"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let outcome = client(&mock_server.uri())
            .run(json!({"permission_id": " pre ", "identity": "caller"}))
            .await;
        assert!(outcome.is_ok());
    }

    #[tokio::test]
    async fn test_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let outcome = client(&format!("http://{}", addr)).run(json!({})).await;
        assert_eq!(outcome.label(), "transport_error");
    }

    #[test]
    fn test_zero_poll_interval_is_rejected() {
        let config = GateConfig::default().with_poll_interval(0);
        let err = CloudActionClient::new(&config).err().unwrap();
        assert_eq!(
            err,
            GateError::InvalidConfig("poll_interval_ms must be greater than 0".to_string())
        );

        let config = GateConfig::default().with_cloud_timeout(0);
        assert!(CloudActionClient::new(&config).is_err());
    }

    #[tokio::test]
    async fn test_tool_args() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/cloud/request"))
            .and(body_partial_json(json!({"prompt": "hi", "identity": "sess-1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"reply": "hello"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client(&mock_server.uri());
        let outcome = GatedTool::run(
            &client,
            &json!({"session_id": "sess-1", "request": {"prompt": "hi"}}),
        )
        .await;

        assert_eq!(outcome.to_json(), json!({"reply": "hello"}));
        assert_eq!(client.identity(), "sess-1");

        let outcome = GatedTool::run(&client, &json!("nope")).await;
        assert_eq!(outcome.label(), "invalid_request");

        let outcome = client.run(json!([1])).await;
        assert_eq!(outcome.label(), "invalid_request");
    }
}
