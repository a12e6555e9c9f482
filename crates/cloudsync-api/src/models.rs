//! MOVEit wire models
//!
//! Deserialization targets for the JSON payloads of the MOVEit REST API and
//! their conversions into the port-level DTOs defined in `cloudsync-core`.
//! Every field the service may omit is optional here; deciding what a missing
//! field means is left to the caller.

use cloudsync_core::domain::FolderId;
use cloudsync_core::ports::{FolderItem, FolderPage, TokenGrant, UploadedFile, UserDetails};
use serde::{Deserialize, Deserializer};

// ============================================================================
// Token endpoint
// ============================================================================

/// Response from `POST /api/v1/token`
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl From<TokenResponse> for TokenGrant {
    fn from(resp: TokenResponse) -> Self {
        TokenGrant {
            access_token: resp.access_token,
            refresh_token: resp.refresh_token.filter(|t| !t.is_empty()),
            expires_in: resp.expires_in,
        }
    }
}

// ============================================================================
// Users
// ============================================================================

/// Response from `GET /api/v1/users/self`
#[derive(Debug, Deserialize)]
pub(crate) struct UserResponse {
    #[serde(rename = "homeFolderID", default)]
    pub home_folder_id: Option<i64>,
}

impl From<UserResponse> for UserDetails {
    fn from(resp: UserResponse) -> Self {
        UserDetails {
            home_folder_id: resp.home_folder_id.map(FolderId::new),
        }
    }
}

// ============================================================================
// Folder content
// ============================================================================

/// Response from `GET /api/v1/folders/{id}/content`
#[derive(Debug, Deserialize)]
pub(crate) struct FolderContentResponse {
    #[serde(default)]
    pub items: Option<Vec<FolderContentItem>>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FolderContentItem {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Paging {
    #[serde(default)]
    pub total_pages: Option<u32>,
}

impl From<FolderContentResponse> for FolderPage {
    fn from(resp: FolderContentResponse) -> Self {
        FolderPage {
            items: resp
                .items
                .unwrap_or_default()
                .into_iter()
                .map(|item| FolderItem {
                    id: item.id,
                    name: item.name,
                })
                .collect(),
            total_pages: resp.paging.and_then(|p| p.total_pages),
        }
    }
}

// ============================================================================
// Upload
// ============================================================================

/// Response from `POST /api/v1/folders/{id}/files`
///
/// The service reports the new file's identifier as a string; some
/// deployments send it as a bare number, so both are accepted.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UploadResponse {
    #[serde(default, deserialize_with = "string_or_number")]
    pub file_id: Option<String>,
}

impl From<UploadResponse> for UploadedFile {
    fn from(resp: UploadResponse) -> Self {
        UploadedFile {
            file_id: resp.file_id,
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
