//! Integration tests for the user and folder listing endpoints

use cloudsync_core::domain::{ApiError, FolderId};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_get_current_user_returns_home_folder() {
    let (server, client) = common::setup_moveit_mock().await;
    common::mount_current_user(&server, 12345).await;

    let user = client
        .get_current_user(common::ACCESS_TOKEN)
        .await
        .expect("get_current_user failed");

    assert_eq!(user.home_folder_id, Some(FolderId::new(12345)));
}

#[tokio::test]
async fn test_get_current_user_without_home_folder() {
    let (server, client) = common::setup_moveit_mock().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/users/self"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "user-test-001",
            "homeFolderID": null
        })))
        .mount(&server)
        .await;

    let user = client.get_current_user("tok").await.unwrap();
    assert!(user.home_folder_id.is_none());
}

#[tokio::test]
async fn test_list_folder_contents_sends_paging_query() {
    let (server, client) = common::setup_moveit_mock().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/folders/12345/content"))
        .and(query_param("page", "2"))
        .and(query_param("perPage", "50"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [
                {"id": 11, "name": "a.txt"},
                {"id": 12, "name": "b.txt"}
            ],
            "paging": {"page": 2, "perPage": 50, "totalItems": 52, "totalPages": 2}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = client
        .list_folder_contents("tok", FolderId::new(12345), 2, 50)
        .await
        .expect("list_folder_contents failed");

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[1].name.as_deref(), Some("b.txt"));
    assert_eq!(page.total_pages, Some(2));
}

#[tokio::test]
async fn test_server_error_maps_to_status() {
    let (server, client) = common::setup_moveit_mock().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/folders/1/content"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = client
        .list_folder_contents("tok", FolderId::new(1), 1, 100)
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    match err {
        ApiError::Status { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_maps_to_invalid_response() {
    let (server, client) = common::setup_moveit_mock().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/users/self"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let err = client.get_current_user("tok").await.unwrap_err();

    assert!(matches!(err, ApiError::InvalidResponse(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_unreachable_server_maps_to_transport() {
    let (server, client) = common::setup_moveit_mock().await;
    drop(server);

    let err = client.get_current_user("tok").await.unwrap_err();

    assert!(matches!(err, ApiError::Transport(_)));
}
