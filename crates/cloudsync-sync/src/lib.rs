//! CloudSync Sync - One-way local to remote synchronization
//!
//! Provides:
//! - Remote index bootstrap with concurrent, bounded page fetching
//! - Upload with exponential-backoff retry and delete by tracked identifier
//! - Filesystem change watching for a single root directory
//! - A bounded-concurrency dispatcher from change events to sync operations
//!
//! ## Modules
//!
//! - [`engine`] - [`SyncEngine`](engine::SyncEngine), owner of the remote file index
//! - [`retry`] - Retry policy with pluggable backoff
//! - [`watcher`] - `notify`-based change event source
//! - [`coordinator`] - Event dispatcher driving the engine

pub mod coordinator;
pub mod engine;
pub mod retry;
pub mod watcher;

use cloudsync_core::domain::ApiError;
use thiserror::Error;

/// Errors that can occur during synchronization operations
#[derive(Debug, Error)]
pub enum SyncError {
    /// Upload or delete was attempted before a successful initialization
    #[error("Home folder ID is not set; the sync engine has not been initialized")]
    NotInitialized,

    /// Initialization was requested a second time
    #[error("Sync engine is already initialized")]
    AlreadyInitialized,

    /// The remote account has no home folder to sync into
    #[error("User does not have a home folder")]
    NoHomeFolder,

    /// An I/O error occurred while reading a local file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A remote API call failed
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// The service returned a file identifier that is not an integer
    #[error("Invalid remote file ID: {0}")]
    InvalidRemoteId(String),

    /// A folder listing page could not be fetched during initialization
    #[error("Failed to fetch folder content page {page}: {source}")]
    PageFetch {
        /// 1-based page number
        page: u32,
        #[source]
        source: ApiError,
    },

    /// The operation was cancelled before it completed
    #[error("Operation cancelled")]
    Cancelled,

    /// The filesystem watcher could not be set up
    #[error("Watcher error: {0}")]
    Watcher(#[from] notify::Error),
}

impl SyncError {
    /// Returns true if the upload retry policy should try again
    ///
    /// Local I/O failures and retryable API failures qualify. Malformed
    /// identifiers, token failures and precondition violations do not.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Io(_) => true,
            SyncError::Api(err) => err.is_retryable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use cloudsync_core::domain::TokenError;

    use super::*;

    #[test]
    fn test_io_and_status_errors_are_retryable() {
        let io = SyncError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let api = SyncError::Api(ApiError::Status {
            status: 500,
            body: String::new(),
        });
        assert!(io.is_retryable());
        assert!(api.is_retryable());
    }

    #[test]
    fn test_fatal_errors_are_not_retryable() {
        assert!(!SyncError::NotInitialized.is_retryable());
        assert!(!SyncError::InvalidRemoteId("x".into()).is_retryable());
        assert!(!SyncError::Api(ApiError::from(TokenError::MissingExpiry)).is_retryable());
        assert!(!SyncError::Api(ApiError::InvalidResponse("bad".into())).is_retryable());
    }

    #[test]
    fn test_page_fetch_display_names_page() {
        let err = SyncError::PageFetch {
            page: 3,
            source: ApiError::Transport("reset".into()),
        };
        assert_eq!(
            err.to_string(),
            "Failed to fetch folder content page 3: Transport error: reset"
        );
    }
}
