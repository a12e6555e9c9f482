//! Integration tests for the token endpoint and the token manager

use std::sync::Arc;
use std::time::Duration;

use cloudsync_api::TokenManager;
use cloudsync_core::domain::TokenError;
use cloudsync_core::ports::{Credentials, ITokenEndpoint};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_password_grant_posts_form() {
    let (server, client) = common::setup_moveit_mock().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/token"))
        .and(body_string_contains("grant_type=password"))
        .and(body_string_contains("username=alice"))
        .and(body_string_contains("password=s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "abc",
            "expires_in": 1200,
            "refresh_token": "def"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let grant = client
        .exchange_credentials(&Credentials::new("alice", "s3cret"))
        .await
        .expect("password grant failed");

    assert_eq!(grant.access_token, "abc");
    assert_eq!(grant.refresh_token.as_deref(), Some("def"));
    assert_eq!(grant.expires_in, Some(1200));
}

#[tokio::test]
async fn test_refresh_grant_posts_refresh_token() {
    let (server, client) = common::setup_moveit_mock().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=old-refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "new-access",
            "expires_in": 1200
        })))
        .expect(1)
        .mount(&server)
        .await;

    let grant = client
        .exchange_refresh_token("old-refresh")
        .await
        .expect("refresh grant failed");

    assert_eq!(grant.access_token, "new-access");
    assert!(grant.refresh_token.is_none());
}

#[tokio::test]
async fn test_rejected_credentials_surface_status() {
    let (server, client) = common::setup_moveit_mock().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
        .mount(&server)
        .await;

    let tokens = TokenManager::new(Arc::new(client), Credentials::new("alice", "wrong"));
    let err = tokens.ensure_valid_token().await.unwrap_err();

    match err {
        TokenError::Exchange(api) => {
            assert_eq!(api.status(), Some(400));
            assert!(api.to_string().contains("invalid_grant"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_manager_refreshes_near_expiry_token() {
    let (server, client) = common::setup_moveit_mock().await;
    // 20 second lifetime sits inside the 30 second tolerance
    common::mount_password_grant(&server, 20).await;
    common::mount_refresh_grant(&server, "refreshed-access", 3600).await;

    let tokens = TokenManager::new(Arc::new(client), Credentials::new("alice", "secret"));

    assert_eq!(
        tokens.ensure_valid_token().await.unwrap(),
        common::ACCESS_TOKEN
    );
    assert_eq!(
        tokens.ensure_valid_token().await.unwrap(),
        "refreshed-access"
    );
    assert_eq!(
        tokens.ensure_valid_token().await.unwrap(),
        "refreshed-access"
    );

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn test_manager_with_zero_tolerance_reuses_short_token() {
    let (server, client) = common::setup_moveit_mock().await;
    common::mount_password_grant(&server, 20).await;

    let tokens = TokenManager::new(Arc::new(client), Credentials::new("alice", "secret"))
        .with_tolerance(Duration::ZERO);

    tokens.ensure_valid_token().await.unwrap();
    tokens.ensure_valid_token().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}
