//! Shared test helpers for MOVEit API integration tests
//!
//! Provides wiremock-based mock server setup for the MOVEit REST endpoints.
//! Each helper mounts the necessary mock endpoints and returns a configured
//! client pointing at the mock server.

use std::sync::Arc;

use cloudsync_api::{AuthenticatingTransport, MoveItClient, TokenManager};
use cloudsync_core::ports::Credentials;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Access token handed out by [`mount_password_grant`]
pub const ACCESS_TOKEN: &str = "test-access-token";

/// Refresh token handed out by [`mount_password_grant`]
pub const REFRESH_TOKEN: &str = "test-refresh-token";

/// Starts a mock server and returns a client pointing at it.
pub async fn setup_moveit_mock() -> (MockServer, MoveItClient) {
    let server = MockServer::start().await;
    let client = MoveItClient::new(server.uri());
    (server, client)
}

/// Starts a mock server with a password grant mounted and returns an
/// authenticating transport wired to it.
pub async fn setup_transport_mock() -> (MockServer, AuthenticatingTransport) {
    let (server, client) = setup_moveit_mock().await;
    mount_password_grant(&server, 3600).await;

    let tokens = Arc::new(TokenManager::new(
        Arc::new(client.clone()),
        Credentials::new("alice", "secret"),
    ));
    let transport = AuthenticatingTransport::new(client, tokens);
    (server, transport)
}

/// Mounts `POST /api/v1/token` answering the password grant.
pub async fn mount_password_grant(server: &MockServer, expires_in: u64) {
    Mock::given(method("POST"))
        .and(path("/api/v1/token"))
        .and(body_string_contains("grant_type=password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": ACCESS_TOKEN,
            "token_type": "bearer",
            "expires_in": expires_in,
            "refresh_token": REFRESH_TOKEN
        })))
        .mount(server)
        .await;
}

/// Mounts `POST /api/v1/token` answering the refresh-token grant.
pub async fn mount_refresh_grant(server: &MockServer, access_token: &str, expires_in: u64) {
    Mock::given(method("POST"))
        .and(path("/api/v1/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": access_token,
            "token_type": "bearer",
            "expires_in": expires_in,
            "refresh_token": "rotated-refresh-token"
        })))
        .mount(server)
        .await;
}

/// Mounts `GET /api/v1/users/self` reporting the given home folder.
pub async fn mount_current_user(server: &MockServer, home_folder_id: i64) {
    Mock::given(method("GET"))
        .and(path("/api/v1/users/self"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "user-test-001",
            "username": "alice",
            "homeFolderID": home_folder_id
        })))
        .mount(server)
        .await;
}
