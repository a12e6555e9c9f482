//! Authenticated request path
//!
//! [`AuthenticatingTransport`] implements [`IRemoteApi`] by asking the
//! [`TokenManager`] for a valid token before every call and attaching it as
//! a bearer credential. It holds no state of its own and never retries;
//! retry is the sync engine's concern.

use std::sync::Arc;

use cloudsync_core::domain::{ApiError, FolderId, RemoteFileId};
use cloudsync_core::ports::{FolderPage, IRemoteApi, UploadContent, UploadedFile, UserDetails};

use crate::auth::TokenManager;
use crate::client::MoveItClient;

/// Remote API adapter that authorizes every outbound call
#[derive(Debug, Clone)]
pub struct AuthenticatingTransport {
    client: MoveItClient,
    tokens: Arc<TokenManager>,
}

impl AuthenticatingTransport {
    pub fn new(client: MoveItClient, tokens: Arc<TokenManager>) -> Self {
        Self { client, tokens }
    }

    async fn bearer(&self) -> Result<String, ApiError> {
        Ok(self.tokens.ensure_valid_token().await?)
    }
}

#[async_trait::async_trait]
impl IRemoteApi for AuthenticatingTransport {
    async fn get_current_user(&self) -> Result<UserDetails, ApiError> {
        let token = self.bearer().await?;
        self.client.get_current_user(&token).await
    }

    async fn list_folder_contents(
        &self,
        folder_id: FolderId,
        page: u32,
        per_page: u32,
    ) -> Result<FolderPage, ApiError> {
        let token = self.bearer().await?;
        self.client
            .list_folder_contents(&token, folder_id, page, per_page)
            .await
    }

    async fn upload_file(
        &self,
        folder_id: FolderId,
        content: UploadContent,
    ) -> Result<UploadedFile, ApiError> {
        let token = self.bearer().await?;
        self.client.upload_file(&token, folder_id, content).await
    }

    async fn delete_file(&self, file_id: RemoteFileId) -> Result<(), ApiError> {
        let token = self.bearer().await?;
        self.client.delete_file(&token, file_id).await
    }
}
