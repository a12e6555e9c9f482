//! Integration tests for the authenticating transport

use std::sync::Arc;

use cloudsync_api::{AuthenticatingTransport, MoveItClient, TokenManager};
use cloudsync_core::domain::{ApiError, FolderId, RemoteFileId};
use cloudsync_core::ports::{Credentials, IRemoteApi};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_transport_attaches_acquired_token() {
    let (server, transport) = common::setup_transport_mock().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/users/self"))
        .and(header(
            "authorization",
            format!("Bearer {}", common::ACCESS_TOKEN).as_str(),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "homeFolderID": 555
        })))
        .expect(1)
        .mount(&server)
        .await;

    let user = transport.get_current_user().await.expect("get_current_user failed");
    assert_eq!(user.home_folder_id, Some(FolderId::new(555)));
}

#[tokio::test]
async fn test_transport_reuses_token_across_calls() {
    let (server, transport) = common::setup_transport_mock().await;
    common::mount_current_user(&server, 555).await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/files/8"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    transport.get_current_user().await.unwrap();
    transport.delete_file(RemoteFileId::new(8)).await.unwrap();
    transport.get_current_user().await.unwrap();

    let token_requests = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == "/api/v1/token")
        .count();
    assert_eq!(token_requests, 1);
}

#[tokio::test]
async fn test_transport_token_failure_is_authentication_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
        .mount(&server)
        .await;

    let client = MoveItClient::new(server.uri());
    let tokens = Arc::new(TokenManager::new(
        Arc::new(client.clone()),
        Credentials::new("alice", "wrong"),
    ));
    let transport = AuthenticatingTransport::new(client, tokens);

    let err = transport.get_current_user().await.unwrap_err();

    assert!(matches!(err, ApiError::Authentication(_)));
    assert!(!err.is_retryable());

    let api_requests = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() != "/api/v1/token")
        .count();
    assert_eq!(api_requests, 0);
}
