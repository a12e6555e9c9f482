//! MOVEit REST client
//!
//! Provides a typed HTTP client for the MOVEit REST API. Every endpoint
//! method takes the bearer token explicitly; keeping the token lifecycle out
//! of this type lets [`crate::transport::AuthenticatingTransport`] decide
//! when a token is fetched or refreshed.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cloudsync_api::client::MoveItClient;
//!
//! # async fn example() -> Result<(), cloudsync_core::domain::ApiError> {
//! let client = MoveItClient::new("https://moveit.example.com");
//! let user = client.get_current_user("access-token-here").await?;
//! println!("Home folder: {:?}", user.home_folder_id);
//! # Ok(())
//! # }
//! ```

use cloudsync_core::domain::{ApiError, FolderId, RemoteFileId};
use cloudsync_core::ports::{
    Credentials, FolderPage, ITokenEndpoint, TokenGrant, UploadContent, UploadedFile, UserDetails,
};
use reqwest::{multipart, Body, Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::models::{FolderContentResponse, TokenResponse, UploadResponse, UserResponse};

/// Path prefix shared by every MOVEit REST endpoint
const API_PREFIX: &str = "/api/v1";

// ============================================================================
// MoveItClient
// ============================================================================

/// HTTP client for MOVEit REST API calls
///
/// Wraps `reqwest::Client` with base URL construction and maps every failure
/// onto [`ApiError`]. Cloning is cheap; the underlying connection pool is
/// shared.
#[derive(Debug, Clone)]
pub struct MoveItClient {
    /// The underlying HTTP client
    client: Client,
    /// Base URL of the service, without the `/api/v1` suffix
    base_url: String,
}

impl MoveItClient {
    /// Creates a new client for the service at `base_url`
    ///
    /// # Arguments
    /// * `base_url` - Scheme and host of the service (e.g. `https://moveit.example.com`)
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http_client(Client::new(), base_url)
    }

    /// Creates a new client reusing an existing `reqwest::Client`
    pub fn with_http_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Returns the base URL (useful for diagnostics)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Creates an unauthenticated request builder for the given method and path
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `path` - API path relative to `/api/v1` (e.g. "/token")
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}{}", self.base_url, API_PREFIX, path);
        self.client.request(method, url)
    }

    /// Creates a request builder carrying `token` as a bearer credential
    pub fn authorized(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
        self.request(method, path).bearer_auth(token)
    }

    // ========================================================================
    // Token endpoint
    // ========================================================================

    /// Posts a form to the token endpoint
    async fn post_token(&self, form: &[(&str, &str)]) -> Result<TokenGrant, ApiError> {
        let response = send(self.request(Method::POST, "/token").form(form)).await?;
        let token: TokenResponse = parse_json(response).await?;
        Ok(token.into())
    }

    // ========================================================================
    // Authenticated endpoints
    // ========================================================================

    /// Retrieves details about the authenticated user
    ///
    /// Makes `GET /api/v1/users/self`.
    pub async fn get_current_user(&self, token: &str) -> Result<UserDetails, ApiError> {
        debug!("Fetching current user details");
        let response = send(self.authorized(Method::GET, "/users/self", token)).await?;
        let user: UserResponse = parse_json(response).await?;
        Ok(user.into())
    }

    /// Retrieves one page of a folder's contents
    ///
    /// Makes `GET /api/v1/folders/{id}/content?page={page}&perPage={per_page}`.
    pub async fn list_folder_contents(
        &self,
        token: &str,
        folder_id: FolderId,
        page: u32,
        per_page: u32,
    ) -> Result<FolderPage, ApiError> {
        debug!(folder_id = %folder_id, page, per_page, "Listing folder contents");
        let path = format!("/folders/{}/content", folder_id);
        let request = self
            .authorized(Method::GET, &path, token)
            .query(&[("page", page), ("perPage", per_page)]);
        let response = send(request).await?;
        let content: FolderContentResponse = parse_json(response).await?;
        Ok(content.into())
    }

    /// Uploads a file into a folder as a streamed multipart body
    ///
    /// Makes `POST /api/v1/folders/{id}/files` with a single `file` part.
    /// The reader is consumed in chunks of `content.buffer_size` bytes.
    pub async fn upload_file(
        &self,
        token: &str,
        folder_id: FolderId,
        content: UploadContent,
    ) -> Result<UploadedFile, ApiError> {
        let UploadContent {
            file_name,
            reader,
            buffer_size,
        } = content;
        debug!(folder_id = %folder_id, file_name = %file_name, buffer_size, "Uploading file");

        let stream = ReaderStream::with_capacity(reader, buffer_size.max(1));
        let part = multipart::Part::stream(Body::wrap_stream(stream)).file_name(file_name);
        let form = multipart::Form::new().part("file", part);

        let path = format!("/folders/{}/files", folder_id);
        let response = send(self.authorized(Method::POST, &path, token).multipart(form)).await?;
        let uploaded: UploadResponse = parse_json(response).await?;
        Ok(uploaded.into())
    }

    /// Deletes a file by its remote identifier
    ///
    /// Makes `DELETE /api/v1/files/{id}`.
    pub async fn delete_file(&self, token: &str, file_id: RemoteFileId) -> Result<(), ApiError> {
        debug!(file_id = %file_id, "Deleting file");
        let path = format!("/files/{}", file_id);
        send(self.authorized(Method::DELETE, &path, token)).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ITokenEndpoint for MoveItClient {
    async fn exchange_credentials(
        &self,
        credentials: &Credentials,
    ) -> Result<TokenGrant, ApiError> {
        debug!(username = %credentials.username, "Requesting token with password grant");
        self.post_token(&[
            ("grant_type", "password"),
            ("username", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
        ])
        .await
    }

    async fn exchange_refresh_token(&self, refresh_token: &str) -> Result<TokenGrant, ApiError> {
        debug!("Requesting token with refresh_token grant");
        self.post_token(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }
}

// ============================================================================
// Response handling
// ============================================================================

/// Sends a request and maps non-success statuses onto [`ApiError::Status`]
async fn send(request: RequestBuilder) -> Result<Response, ApiError> {
    let response = request
        .send()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Reads a JSON body, separating malformed payloads from transport failures
async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::InvalidResponse(e.to_string()))
}
