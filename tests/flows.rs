//! End-to-end flows through the tool router against a mocked authority

use std::sync::Arc;

use approval_gate::permissions::{GrantCache, PermissionPoller, WaitOutcome};
use approval_gate::transport::{HttpErrorMode, RequestExecutor};
use approval_gate::{ActionDispatcher, GateConfig, Identity, ToolRouter};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(base_url: &str) -> GateConfig {
    GateConfig::new(base_url)
        .with_identity_env(Vec::new())
        .with_poll_interval(50)
        .with_wait_timeout(5)
}

#[tokio::test]
async fn test_device_action_deferred_then_approved() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/permissions/request"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "g-1", "status": "requested"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/permissions/g-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "requested"})))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/permissions/g-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "approved"})))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/shell/exec"))
        .and(body_partial_json(json!({"cmd": "pip", "permission_id": "g-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 0, "stdout": "ok"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let router = ToolRouter::from_config(&config(&mock_server.uri())).unwrap();
    let args = json!({"action": "shell.exec", "payload": {"cmd": "pip", "args": ["list"]}});

    let first = router.invoke("device_api", &args).await;
    assert_eq!(
        first.to_json(),
        json!({"status": "permission_required", "request": {"id": "g-1", "status": "requested"}})
    );

    let second = router.invoke("device_api", &args).await;
    assert_eq!(second.to_json(), json!({"code": 0, "stdout": "ok"}));
}

#[tokio::test]
async fn test_caller_drives_approval_with_poller() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/permissions/g-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "requested"})))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/permissions/g-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "approved"})))
        .mount(&mock_server)
        .await;

    let executor = RequestExecutor::new(
        mock_server.uri(),
        Duration::from_secs(5),
        Arc::new(Identity::default()),
        "X-Kugutz-Identity",
        HttpErrorMode::Tolerate,
    )
    .unwrap();
    let poller = PermissionPoller::new(Arc::new(executor)).with_interval(Duration::from_millis(50));

    let outcome = poller.wait("g-2", Duration::from_secs(5)).await;
    assert_eq!(outcome, WaitOutcome::Approved);
}

#[tokio::test]
async fn test_cloud_request_through_router() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/cloud/request"))
        .and(body_partial_json(json!({"permission_id": "c-1", "identity": "sess-9"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": 42})))
        .expect(1)
        .with_priority(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cloud/request"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "status": "permission_required",
            "request": {"id": "c-1", "status": "requested"},
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/permissions/c-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "approved"})))
        .mount(&mock_server)
        .await;

    let router = ToolRouter::from_config(&config(&mock_server.uri())).unwrap();
    let outcome = router
        .invoke(
            "cloud_request",
            &json!({"session_id": "sess-9", "request": {"question": "meaning"}}),
        )
        .await;

    assert_eq!(outcome.to_json(), json!({"answer": 42}));
}

#[tokio::test]
async fn test_shared_cache_across_dispatchers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/permissions/request"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "g-3", "status": "approved"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/permissions/g-3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "approved"})))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/python/restart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"restarted": true})))
        .expect(2)
        .mount(&mock_server)
        .await;

    let config = config(&mock_server.uri());
    let cache = Arc::new(GrantCache::new());
    let first = ActionDispatcher::with_cache(&config, cache.clone()).unwrap();
    let second = ActionDispatcher::with_cache(&config, cache.clone()).unwrap();

    assert!(first.dispatch("python.restart", None, None).await.is_ok());
    assert!(second.dispatch("python.restart", None, None).await.is_ok());
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn test_unknown_tool() {
    let router = ToolRouter::from_config(&GateConfig::default()).unwrap();
    let outcome = router.invoke("ssh_shell", &json!({})).await;
    assert_eq!(outcome.label(), "unknown_tool");
}
