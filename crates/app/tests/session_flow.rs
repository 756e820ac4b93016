//! End-to-end session flows over a mock backend.
//!
//! These wire the real reqwest transport and file store into an
//! `ApiClient` and drive it against wiremock.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use datacake_application::auth::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use datacake_application::{ApiClient, ApiError, AuthApi, ResolverConfig, TasksApi, TokenStore};
use datacake_domain::{
    BaseUrlSource, Credentials, RuntimePlatform, RuntimeTarget, TaskFilter, TokenPatch,
};
use datacake_infrastructure::{ClientConfig, FileKeyValueStore, ReqwestTransport, build_client};
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, data_dir: &TempDir) -> Arc<ApiClient> {
    let config = ClientConfig {
        api_url: Some(format!("{}/api", server.uri())),
        data_dir: Some(data_dir.path().to_path_buf()),
        ..ClientConfig::default()
    };
    Arc::new(build_client(&config).unwrap())
}

fn stored(data_dir: &TempDir, key: &str) -> Option<String> {
    std::fs::read_to_string(data_dir.path().join(key)).ok()
}

fn task(id: i64) -> serde_json::Value {
    json!({"id": id, "title": "Estudar Rust", "status": "pendente", "importance": "alta", "category": "estudos"})
}

#[tokio::test]
async fn test_login_then_list_tasks() {
    let server = MockServer::start().await;
    let data_dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/api/auth/token/"))
        .and(body_json(json!({"identifier": "ana", "password": "pw"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access": "acc", "refresh": "ref"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/"))
        .and(header("authorization", "Bearer acc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([task(1), task(2)])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, &data_dir);
    AuthApi::new(client.clone())
        .login(&Credentials::new("ana", "pw"))
        .await
        .unwrap();
    let tasks = TasksApi::new(client.clone())
        .list(&TaskFilter::default())
        .await
        .unwrap();

    assert_eq!(tasks.len(), 2);
    assert_eq!(stored(&data_dir, ACCESS_TOKEN_KEY).as_deref(), Some("acc"));
    assert_eq!(stored(&data_dir, REFRESH_TOKEN_KEY).as_deref(), Some("ref"));
}

#[tokio::test]
async fn test_session_survives_restart() {
    let server = MockServer::start().await;
    let data_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/api/auth/me/"))
        .and(header("authorization", "Bearer persisted"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 4, "username": "ana"})),
        )
        .mount(&server)
        .await;

    client_for(&server, &data_dir).set_tokens(&TokenPatch::both("persisted", "r"));

    let restarted = client_for(&server, &data_dir);
    let user = AuthApi::new(restarted).current_user().await.unwrap().unwrap();

    assert_eq!(user.username, "ana");
}

#[tokio::test]
async fn test_concurrent_expiry_refreshes_once() {
    let server = MockServer::start().await;
    let data_dir = TempDir::new().unwrap();

    Mock::given(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "expired"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh/"))
        .and(body_json(json!({"refresh": "r0"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access": "fresh"}))
                .set_delay(Duration::from_millis(300)),
        )
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/tasks/7/toggle/"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(task(7)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([task(1)])))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server, &data_dir);
    client.set_tokens(&TokenPatch::both("stale", "r0"));
    let notifications = Arc::new(AtomicUsize::new(0));
    let counter = notifications.clone();
    let _subscription = client.subscribe_unauthorized(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let tasks = TasksApi::new(client.clone());
    let everything = TaskFilter::default();

    let (first, second, toggled) = tokio::join!(
        tasks.list(&everything),
        tasks.list(&everything),
        tasks.toggle(7),
    );

    assert_eq!(first.unwrap().len(), 1);
    assert_eq!(second.unwrap().len(), 1);
    assert_eq!(toggled.unwrap().id, 7);
    assert_eq!(notifications.load(Ordering::SeqCst), 0);
    assert_eq!(stored(&data_dir, ACCESS_TOKEN_KEY).as_deref(), Some("fresh"));
    assert_eq!(stored(&data_dir, REFRESH_TOKEN_KEY).as_deref(), Some("r0"));
}

#[tokio::test]
async fn test_rejected_refresh_ends_session() {
    let server = MockServer::start().await;
    let data_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Token is blacklisted"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, &data_dir);
    client.set_tokens(&TokenPatch::both("stale", "revoked"));
    let notifications = Arc::new(AtomicUsize::new(0));
    let counter = notifications.clone();
    let _subscription = client.subscribe_unauthorized(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let error = TasksApi::new(client.clone())
        .list(&TaskFilter::default())
        .await
        .unwrap_err();

    assert!(matches!(error, ApiError::RefreshFailed(_)));
    assert_eq!(notifications.load(Ordering::SeqCst), 1);
    assert!(client.get_tokens().is_empty());
    assert_eq!(stored(&data_dir, ACCESS_TOKEN_KEY), None);
    assert_eq!(stored(&data_dir, REFRESH_TOKEN_KEY), None);
}

#[tokio::test]
async fn test_logout_clears_storage_when_backend_rejects() {
    let server = MockServer::start().await;
    let data_dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/api/auth/logout/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, &data_dir);
    client.set_tokens(&TokenPatch::both("a", "r"));

    AuthApi::new(client.clone()).logout().await;

    assert!(client.get_tokens().is_empty());
    assert_eq!(stored(&data_dir, ACCESS_TOKEN_KEY), None);
}

#[tokio::test]
async fn test_probe_discovers_hinted_host() {
    let server = MockServer::start().await;
    let data_dir = TempDir::new().unwrap();
    // Loopback hints are rewritten to `localhost` off Android.
    let address = server.address();

    Mock::given(method("GET"))
        .and(path("/api/health/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let config = ResolverConfig {
        api_port: address.port(),
        runtime: RuntimeTarget::emulator(RuntimePlatform::Web),
        ..ResolverConfig::default()
    };
    let client = ApiClient::new(
        config,
        TokenStore::new(Arc::new(FileKeyValueStore::new(data_dir.path()))),
        Arc::new(vec![format!("http://{}:19000/bundle", address.ip())]),
        Arc::new(ReqwestTransport::new().unwrap()),
    );
    assert_eq!(client.base_url_meta().source, BaseUrlSource::Fallback);

    let resolution = client.ensure_base_url_resolved().await;

    assert!(!resolution.discovery_failed());
    assert_eq!(resolution.meta.source, BaseUrlSource::AutoProbe);
    assert_eq!(
        resolution.meta.resolved_base_url,
        format!("http://localhost:{}/api", address.port())
    );
}
