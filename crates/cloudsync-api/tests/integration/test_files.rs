//! Integration tests for the upload and delete endpoints

use cloudsync_core::domain::{ApiError, FolderId, RemoteFileId};
use cloudsync_core::ports::UploadContent;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_upload_streams_multipart_file_part() {
    let (server, client) = common::setup_moveit_mock().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/folders/777/files"))
        .and(header("authorization", "Bearer tok"))
        .and(body_string_contains("name=\"file\""))
        .and(body_string_contains("filename=\"report.txt\""))
        .and(body_string_contains("quarterly numbers"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "fileId": "9001"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let content = UploadContent::new("report.txt", &b"quarterly numbers"[..], 4);
    let uploaded = client
        .upload_file("tok", FolderId::new(777), content)
        .await
        .expect("upload failed");

    assert_eq!(uploaded.file_id.as_deref(), Some("9001"));
}

#[tokio::test]
async fn test_upload_rejected_maps_to_status() {
    let (server, client) = common::setup_moveit_mock().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/folders/777/files"))
        .respond_with(ResponseTemplate::new(409).set_body_string("file exists"))
        .mount(&server)
        .await;

    let content = UploadContent::new("dup.txt", &b"x"[..], 8192);
    let err = client
        .upload_file("tok", FolderId::new(777), content)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(409));
}

#[tokio::test]
async fn test_delete_file_by_id() {
    let (server, client) = common::setup_moveit_mock().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/files/42"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client
        .delete_file("tok", RemoteFileId::new(42))
        .await
        .expect("delete failed");
}

#[tokio::test]
async fn test_delete_missing_file_maps_to_status() {
    let (server, client) = common::setup_moveit_mock().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/files/42"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let err = client
        .delete_file("tok", RemoteFileId::new(42))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Status { status: 404, .. }));
}
