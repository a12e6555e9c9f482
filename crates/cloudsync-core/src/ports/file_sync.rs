//! File synchronization port (driving/primary port)
//!
//! The event dispatcher drives synchronization through this trait. Keeping
//! it narrow lets the dispatcher be tested without any remote service.

use std::path::Path;

/// Port trait for mirroring local file events to the remote folder
///
/// Both operations are keyed by file name. The error type is left to the
/// implementation; callers only log failures.
#[async_trait::async_trait]
pub trait IFileSync: Send + Sync {
    /// Error returned by sync operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Uploads the file at `path` under the name `file_name`
    async fn upload(&self, path: &Path, file_name: &str) -> Result<(), Self::Error>;

    /// Deletes the remote copy of `file_name`
    async fn delete_file(&self, file_name: &str) -> Result<(), Self::Error>;
}
