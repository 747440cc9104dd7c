//! Mock application-server tests for the session layer.
//!
//! These tests use wiremock to play the application server (API, refresh,
//! login and logout endpoints) and exercise the refresh-and-retry protocol
//! end to end.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::json;
use tokenward::{
    AppUrl, AuthClient, ClientConfig, Credentials, Error, MemoryStorage, Navigator,
    RequestOptions, SubjectId,
};
use tokenward::error::RefreshError;
use url::Url;
use wiremock::matchers::{body_json, body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct RecordingNavigator {
    visits: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    fn visits(&self) -> Vec<String> {
        self.visits.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, location: &Url) {
        self.visits.lock().unwrap().push(location.to_string());
    }
}

fn jwt(claims: serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.sig", header, payload)
}

fn client_for(base: &str) -> (AuthClient, Arc<RecordingNavigator>) {
    let config = ClientConfig::new(AppUrl::new(base).unwrap());
    let navigator = Arc::new(RecordingNavigator::default());
    let client = AuthClient::new(config, Arc::new(MemoryStorage::new()), navigator.clone()).unwrap();
    (client, navigator)
}

/// A client whose transport gives up after 300ms.
fn impatient_client_for(base: &str) -> (AuthClient, Arc<RecordingNavigator>) {
    let config = ClientConfig::new(AppUrl::new(base).unwrap())
        .with_timeout(Duration::from_millis(300));
    let navigator = Arc::new(RecordingNavigator::default());
    let client = AuthClient::new(config, Arc::new(MemoryStorage::new()), navigator.clone()).unwrap();
    (client, navigator)
}

fn stored(client: &AuthClient) -> Option<String> {
    client.store().get().map(|t| t.as_str().to_string())
}

async fn mount_logout(server: &MockServer, times: u64) {
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(200))
        .expect(times)
        .mount(server)
        .await;
}

// ============================================================================
// Refresh-and-retry
// ============================================================================

#[tokio::test]
async fn test_expired_credential_is_refreshed_and_retried() {
    let server = MockServer::start().await;
    let old = jwt(json!({"user_id": 1, "exp": 1_000}));
    let new = jwt(json!({"user_id": 1, "exp": 4_102_444_800_i64}));

    Mock::given(method("GET"))
        .and(path("/api/nearby"))
        .and(header("authorization", format!("Bearer {}", old).as_str()))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": new})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/nearby"))
        .and(header("authorization", format!("Bearer {}", new).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": [1, 2]})))
        .expect(1)
        .mount(&server)
        .await;

    mount_logout(&server, 0).await;

    let (client, navigator) = client_for(&server.uri());
    client.store().set(&old).unwrap();
    assert!(client.is_token_expired());

    let response = client
        .authenticated_request("/api/nearby", RequestOptions::get())
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["items"], json!([1, 2]));
    assert_eq!(stored(&client), Some(new));
    assert!(!client.is_token_expired());
    assert!(navigator.visits().is_empty());
}

#[tokio::test]
async fn test_retry_repeats_method_body_and_headers() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/records"))
        .and(header("authorization", "Bearer old"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "new"})))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/records"))
        .and(header("authorization", "Bearer new"))
        .and(header("x-request-id", "abc"))
        .and(body_string(r#"{"name":"cafe"}"#))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server.uri());
    client.store().set("old").unwrap();

    let options = RequestOptions::post()
        .header("X-Request-Id", "abc")
        .unwrap()
        .json(&json!({"name": "cafe"}))
        .unwrap();
    let response = client
        .authenticated_request("/api/records", options)
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
}

#[tokio::test]
async fn test_refresh_rejected_terminates_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/nearby"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "expired"})))
        .expect(1)
        .mount(&server)
        .await;

    mount_logout(&server, 1).await;

    let (client, navigator) = client_for(&server.uri());
    client.store().set("stale").unwrap();

    let result = client
        .authenticated_request("/api/nearby", RequestOptions::get())
        .await;

    assert!(matches!(result, Err(Error::SessionExpired)));
    assert!(!client.is_authenticated());
    assert_eq!(navigator.visits(), vec![format!("{}/", server.uri())]);
}

#[tokio::test]
async fn test_refresh_without_access_token_terminates_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/nearby"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "wrong-field"})))
        .mount(&server)
        .await;

    mount_logout(&server, 1).await;

    let (client, navigator) = client_for(&server.uri());
    client.store().set("stale").unwrap();

    let result = client
        .authenticated_request("/api/nearby", RequestOptions::get())
        .await;

    assert!(matches!(result, Err(Error::SessionExpired)));
    assert!(!client.is_authenticated());
    assert_eq!(navigator.visits().len(), 1);
}

#[tokio::test]
async fn test_missing_credential_makes_no_network_call() {
    let server = MockServer::start().await;
    let (client, _) = client_for(&server.uri());

    let result = client
        .authenticated_request("/api/nearby", RequestOptions::get())
        .await;

    assert!(matches!(result, Err(Error::NoCredential)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_forbidden_is_passed_through_without_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/admin"))
        .respond_with(ResponseTemplate::new(403).set_body_string("admins only"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "new"})))
        .expect(0)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server.uri());
    client.store().set("current").unwrap();

    let response = client
        .authenticated_request("/api/admin", RequestOptions::get())
        .await
        .unwrap();

    assert_eq!(response.status(), 403);
    assert_eq!(response.text().await.unwrap(), "admins only");
    assert_eq!(stored(&client), Some("current".to_string()));
}

#[tokio::test]
async fn test_server_error_is_passed_through_without_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/nearby"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server.uri());
    client.store().set("current").unwrap();

    let response = client
        .authenticated_request("/api/nearby", RequestOptions::get())
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_second_unauthorized_is_returned_without_another_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/nearby"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "new"})))
        .expect(1)
        .mount(&server)
        .await;

    mount_logout(&server, 0).await;

    let (client, _) = client_for(&server.uri());
    client.store().set("old").unwrap();

    let response = client
        .authenticated_request("/api/nearby", RequestOptions::get())
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
    assert_eq!(stored(&client), Some("new".to_string()));
}

#[tokio::test]
async fn test_caller_cannot_override_authorization() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/nearby"))
        .and(header("authorization", "Bearer stored"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server.uri());
    client.store().set("stored").unwrap();

    let options = RequestOptions::get()
        .header("Authorization", "Bearer forged")
        .unwrap();
    let response = client
        .authenticated_request("/api/nearby", options)
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_refresh_sends_cookie_but_no_bearer() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "refresh_token=r1; Path=/; HttpOnly")
                .set_body_json(json!({"access_token": "first"})),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(header("cookie", "refresh_token=r1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "second"})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server.uri());
    client
        .login(&Credentials::new("alice", "secret"))
        .await
        .unwrap();

    let token = client.refresh().await.unwrap();
    assert_eq!(token.as_str(), "second");
    assert_eq!(stored(&client), Some("second".to_string()));

    let requests = server.received_requests().await.unwrap();
    let refresh = requests
        .iter()
        .find(|r| r.url.path() == "/auth/refresh")
        .unwrap();
    assert!(refresh.headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_concurrent_unauthorized_requests_share_one_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("authorization", "Bearer old"))
        .respond_with(ResponseTemplate::new(401))
        .expect(3)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "new"}))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(header("authorization", "Bearer new"))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server.uri());
    client.store().set("old").unwrap();

    let (a, b, c) = tokio::join!(
        client.authenticated_request("/api/a", RequestOptions::get()),
        client.authenticated_request("/api/b", RequestOptions::get()),
        client.authenticated_request("/api/c", RequestOptions::get()),
    );

    for response in [a, b, c] {
        assert_eq!(response.unwrap().status(), 200);
    }
}

#[tokio::test]
async fn test_concurrent_requests_after_failed_refresh_terminate_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_millis(100)))
        .expect(1)
        .mount(&server)
        .await;

    mount_logout(&server, 1).await;

    let (client, navigator) = client_for(&server.uri());
    client.store().set("old").unwrap();

    let (a, b) = tokio::join!(
        client.authenticated_request("/api/a", RequestOptions::get()),
        client.authenticated_request("/api/b", RequestOptions::get()),
    );

    assert!(matches!(a, Err(Error::SessionExpired)));
    assert!(matches!(b, Err(Error::SessionExpired)));
    assert_eq!(navigator.visits().len(), 1);
}

// ============================================================================
// Transport failures
// ============================================================================

/// Base URL of a port nothing listens on.
fn dead_server_uri() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

#[tokio::test]
async fn test_transport_failure_is_surfaced_and_not_retried() {
    let (client, navigator) = client_for(&dead_server_uri());
    client.store().set("current").unwrap();

    let result = client
        .authenticated_request("/api/nearby", RequestOptions::get())
        .await;

    assert!(matches!(result, Err(Error::Transport(_))));
    assert_eq!(stored(&client), Some("current".to_string()));
    assert!(navigator.visits().is_empty());
}

#[tokio::test]
async fn test_transport_failure_on_retry_keeps_refreshed_credential() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/nearby"))
        .and(header("authorization", "Bearer old"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "new"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/nearby"))
        .and(header("authorization", "Bearer new"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .expect(1)
        .mount(&server)
        .await;

    mount_logout(&server, 0).await;

    let (client, navigator) = impatient_client_for(&server.uri());
    client.store().set("old").unwrap();

    let result = client
        .authenticated_request("/api/nearby", RequestOptions::get())
        .await;

    assert!(matches!(result, Err(Error::Transport(_))));
    assert_eq!(stored(&client), Some("new".to_string()));
    assert!(navigator.visits().is_empty());
}

#[tokio::test]
async fn test_transport_failure_on_refresh_terminates_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/nearby"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "too-late"}))
                .set_delay(Duration::from_secs(2)),
        )
        .expect(1)
        .mount(&server)
        .await;

    mount_logout(&server, 1).await;

    let (client, navigator) = impatient_client_for(&server.uri());
    client.store().set("old").unwrap();

    let result = client
        .authenticated_request("/api/nearby", RequestOptions::get())
        .await;

    assert!(matches!(result, Err(Error::SessionExpired)));
    assert!(!client.is_authenticated());
    assert_eq!(navigator.visits().len(), 1);
}

#[tokio::test]
async fn test_non_json_refresh_body_terminates_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/nearby"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .expect(1)
        .mount(&server)
        .await;

    mount_logout(&server, 1).await;

    let (client, navigator) = client_for(&server.uri());
    client.store().set("old").unwrap();

    let result = client
        .authenticated_request("/api/nearby", RequestOptions::get())
        .await;

    assert!(matches!(result, Err(Error::SessionExpired)));
    assert!(!client.is_authenticated());
    assert_eq!(navigator.visits().len(), 1);
}

#[tokio::test]
async fn test_explicit_refresh_reports_malformed_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    mount_logout(&server, 1).await;

    let (client, _) = client_for(&server.uri());
    client.store().set("old").unwrap();

    let err = client.refresh().await.unwrap_err();

    assert!(matches!(
        err,
        Error::RefreshFailed(RefreshError::MalformedBody { .. })
    ));
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_logout_completes_when_server_unreachable() {
    let (client, navigator) = client_for(&dead_server_uri());
    client.store().set("current").unwrap();

    client.logout().await;

    assert!(!client.is_authenticated());
    assert_eq!(navigator.visits().len(), 1);
}

// ============================================================================
// Login and collaborator surface
// ============================================================================

#[tokio::test]
async fn test_handle_login_response() {
    let server = MockServer::start().await;
    let (client, _) = client_for(&server.uri());

    assert!(client.handle_login_response(&json!({"access_token": "abc"})));
    assert_eq!(stored(&client), Some("abc".to_string()));

    assert!(!client.handle_login_response(&json!({})));
    assert!(!client.handle_login_response(&json!({"access_token": ""})));
    assert_eq!(stored(&client), Some("abc".to_string()));
}

#[tokio::test]
async fn test_login_success_exposes_user_info() {
    let server = MockServer::start().await;
    let token = jwt(json!({
        "user_id": 9,
        "is_admin": true,
        "iat": 1_700_000_000,
        "exp": 4_102_444_800_i64,
        "type": "access"
    }));

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"username": "alice", "password": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": token})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server.uri());
    assert!(!client.is_authenticated());

    client
        .login(&Credentials::new("alice", "secret"))
        .await
        .unwrap();

    assert!(client.is_authenticated());
    let info = client.user_info().unwrap();
    assert_eq!(info.subject_id, Some(SubjectId::Number(9)));
    assert!(info.is_privileged);
    assert_eq!(info.expires_at, Some(4_102_444_800));
}

#[tokio::test]
async fn test_login_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid credentials!"))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server.uri());
    let result = client.login(&Credentials::new("bad", "wrong")).await;

    let err = result.unwrap_err();
    assert!(matches!(err, Error::Login(_)));
    assert!(err.to_string().contains("401"));
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_explicit_refresh_failure_terminates() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    mount_logout(&server, 1).await;

    let (client, navigator) = client_for(&server.uri());
    client.store().set("current").unwrap();

    let err = client.refresh().await.unwrap_err();

    assert!(matches!(err, Error::RefreshFailed(_)));
    assert!(err.is_session_terminal());
    assert!(!client.is_authenticated());
    assert_eq!(navigator.visits().len(), 1);
}

#[tokio::test]
async fn test_custom_landing_path() {
    let server = MockServer::start().await;
    mount_logout(&server, 1).await;

    let config = ClientConfig::new(AppUrl::new(server.uri()).unwrap()).with_landing_path("/login");
    let navigator = Arc::new(RecordingNavigator::default());
    let client = AuthClient::new(config, Arc::new(MemoryStorage::new()), navigator.clone()).unwrap();

    client.logout().await;

    assert_eq!(navigator.visits(), vec![format!("{}/login", server.uri())]);
}
