//! Remote API ports (driven/secondary ports)
//!
//! This module defines the interfaces for talking to the managed
//! file-transfer service. Two traits split the surface in the same way the
//! service does:
//!
//! - [`ITokenEndpoint`] exchanges credentials or a refresh token for an
//!   access token. It is unauthenticated.
//! - [`IRemoteApi`] is the authenticated REST surface: user details, folder
//!   listings, uploads and deletions.
//!
//! ## Design Notes
//!
//! - Errors are typed as [`ApiError`] so callers can classify failures for
//!   retry without inspecting adapter-specific error chains.
//! - The DTOs below mirror the service payloads loosely: fields the service
//!   may omit are `Option`s, and the sync engine decides what to do with them.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;

use crate::domain::errors::ApiError;
use crate::domain::newtypes::{FolderId, RemoteFileId};

// ============================================================================
// Credentials and token grants
// ============================================================================

/// Username and password for the password grant
#[derive(Clone)]
pub struct Credentials {
    /// Account name
    pub username: String,
    /// Account password
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Token endpoint response
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenGrant {
    /// Bearer token for authenticating API requests
    pub access_token: String,
    /// Token for obtaining a new access token without the password
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds
    pub expires_in: Option<u64>,
}

impl fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

// ============================================================================
// Remote API DTOs
// ============================================================================

/// Details about the authenticated user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserDetails {
    /// The user's home folder, the sync target
    pub home_folder_id: Option<FolderId>,
}

/// A single entry in a folder listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FolderItem {
    pub id: Option<i64>,
    pub name: Option<String>,
}

/// One page of a folder listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FolderPage {
    /// Items on this page
    pub items: Vec<FolderItem>,
    /// Total number of pages in the listing, if reported
    pub total_pages: Option<u32>,
}

/// Result of a successful upload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Identifier assigned by the service, in its string form
    pub file_id: Option<String>,
}

/// Content for a single upload
///
/// The reader is streamed to the service in chunks of `buffer_size` bytes,
/// so uploads never require the whole file in memory.
pub struct UploadContent {
    /// Name the file will carry in the remote folder
    pub file_name: String,
    /// Source of the file bytes
    pub reader: Box<dyn AsyncRead + Send + Sync + Unpin>,
    /// Chunk size used when streaming the reader
    pub buffer_size: usize,
}

impl UploadContent {
    pub fn new(
        file_name: impl Into<String>,
        reader: impl AsyncRead + Send + Sync + Unpin + 'static,
        buffer_size: usize,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            reader: Box::new(reader),
            buffer_size,
        }
    }
}

impl fmt::Debug for UploadContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadContent")
            .field("file_name", &self.file_name)
            .field("buffer_size", &self.buffer_size)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ITokenEndpoint trait
// ============================================================================

/// Port trait for the service's token endpoint
#[async_trait::async_trait]
pub trait ITokenEndpoint: Send + Sync {
    /// Exchanges a username and password for a token grant
    ///
    /// # Arguments
    /// * `credentials` - The account credentials
    ///
    /// # Returns
    /// A grant holding the access token, refresh token and lifetime
    async fn exchange_credentials(&self, credentials: &Credentials)
        -> Result<TokenGrant, ApiError>;

    /// Exchanges a refresh token for a new token grant
    ///
    /// # Arguments
    /// * `refresh_token` - The refresh token from a previous grant
    async fn exchange_refresh_token(&self, refresh_token: &str) -> Result<TokenGrant, ApiError>;
}

// ============================================================================
// IRemoteApi trait
// ============================================================================

/// Port trait for the authenticated remote API
///
/// Implementations attach a valid bearer token to every call. Token
/// acquisition failures surface as [`ApiError::Authentication`].
#[async_trait::async_trait]
pub trait IRemoteApi: Send + Sync {
    /// Fetches the current user's details
    async fn get_current_user(&self) -> Result<UserDetails, ApiError>;

    /// Lists one page of a folder's contents
    ///
    /// # Arguments
    /// * `folder_id` - The folder to list
    /// * `page` - 1-based page number
    /// * `per_page` - Maximum number of items on the page
    async fn list_folder_contents(
        &self,
        folder_id: FolderId,
        page: u32,
        per_page: u32,
    ) -> Result<FolderPage, ApiError>;

    /// Uploads a file into a folder
    ///
    /// # Arguments
    /// * `folder_id` - Destination folder
    /// * `content` - File name and streaming source
    ///
    /// # Returns
    /// The identifier the service assigned to the new file
    async fn upload_file(
        &self,
        folder_id: FolderId,
        content: UploadContent,
    ) -> Result<UploadedFile, ApiError>;

    /// Deletes a file by its remote identifier
    async fn delete_file(&self, file_id: RemoteFileId) -> Result<(), ApiError>;
}
