//! Sync engine - remote file index and upload/delete orchestration
//!
//! The [`SyncEngine`] owns the mapping from local file name to remote file
//! identifier. It is bootstrapped once from the user's home folder listing
//! and then kept current by [`SyncEngine::upload`] and
//! [`SyncEngine::delete_file`].
//!
//! ## Initialization
//!
//! ```text
//! get_current_user ──→ home folder ──→ page 1 ──→ pages 2..=N (bounded, concurrent)
//!                                                        │
//!                                                        ▼
//!                                             merge into index (page order)
//! ```
//!
//! ## Index discipline
//!
//! Index entries are only added on a successful listing or upload and only
//! removed on a successful delete. An existing entry is never overwritten.
//! Upload and delete for the same file name are serialized through a
//! per-name async lock, so a delete cannot interleave with an upload of the
//! same file.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use cloudsync_core::config::Config;
use cloudsync_core::domain::{ApiError, FolderId, RemoteFileId};
use cloudsync_core::ports::{FolderItem, FolderPage, IFileSync, IRemoteApi, UploadContent};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::stream::{self, StreamExt};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::retry::RetryPolicy;
use crate::SyncError;

// ============================================================================
// SyncEngineOptions
// ============================================================================

/// Tuning knobs for the sync engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncEngineOptions {
    /// Page size for the home folder listing
    pub fetch_files_per_page: u32,
    /// Maximum number of listing pages in flight at once
    pub max_degree_of_parallelism: usize,
    /// Chunk size used when streaming a local file
    pub read_buffer_size: usize,
    /// Retries after the first failed upload attempt
    pub retry_count: u32,
    /// Base of the exponential upload backoff, in seconds
    pub retry_base_delay_seconds: u64,
}

impl Default for SyncEngineOptions {
    fn default() -> Self {
        Self {
            fetch_files_per_page: 100,
            max_degree_of_parallelism: 5,
            read_buffer_size: 8192,
            retry_count: 3,
            retry_base_delay_seconds: 2,
        }
    }
}

impl From<&Config> for SyncEngineOptions {
    fn from(config: &Config) -> Self {
        Self {
            fetch_files_per_page: config.sync.fetch_files_per_page,
            max_degree_of_parallelism: config.sync.max_degree_of_parallelism,
            read_buffer_size: config.sync.read_buffer_size,
            retry_count: config.upload.retry_count,
            retry_base_delay_seconds: config.upload.retry_base_delay_seconds,
        }
    }
}

/// Counters gathered while merging listing pages into the index
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct MergeStats {
    added: usize,
    skipped: usize,
    duplicates: usize,
}

// ============================================================================
// SyncEngine
// ============================================================================

/// One-way sync engine mirroring local file events to the remote home folder
pub struct SyncEngine {
    api: Arc<dyn IRemoteApi>,
    options: SyncEngineOptions,
    retry: RetryPolicy,
    /// File name -> remote file identifier
    index: DashMap<String, RemoteFileId>,
    /// Per-name locks serializing upload/delete of the same file
    op_locks: DashMap<String, Arc<Mutex<()>>>,
    home_folder: OnceLock<FolderId>,
    init_started: AtomicBool,
}

impl SyncEngine {
    /// Creates an engine with an empty index
    ///
    /// # Arguments
    /// * `api` - Authenticated remote API
    /// * `options` - Paging, buffering and retry settings
    pub fn new(api: Arc<dyn IRemoteApi>, options: SyncEngineOptions) -> Self {
        let retry = RetryPolicy::exponential(options.retry_count, options.retry_base_delay_seconds);
        Self {
            api,
            options,
            retry,
            index: DashMap::new(),
            op_locks: DashMap::new(),
            home_folder: OnceLock::new(),
            init_started: AtomicBool::new(false),
        }
    }

    /// Replaces the upload retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The resolved home folder, once initialization has fetched it
    pub fn home_folder_id(&self) -> Option<FolderId> {
        self.home_folder.get().copied()
    }

    /// Number of files currently tracked in the index
    pub fn tracked_count(&self) -> usize {
        self.index.len()
    }

    /// Remote identifier tracked for `file_name`, if any
    pub fn remote_id(&self, file_name: &str) -> Option<RemoteFileId> {
        self.index.get(file_name).map(|entry| *entry.value())
    }

    // ========================================================================
    // Initialization
    // ========================================================================

    /// Resolves the home folder and loads its listing into the index
    ///
    /// Must be called once before any upload or delete. A second call fails
    /// with [`SyncError::AlreadyInitialized`], even if the first one failed.
    pub async fn initialize(&self) -> Result<(), SyncError> {
        self.initialize_with_cancellation(CancellationToken::new())
            .await
    }

    /// Same as [`initialize`](Self::initialize), with an external cancellation
    /// token for the concurrent page fetch
    ///
    /// Cancelling `cancel` abandons the in-flight page fetches and returns
    /// [`SyncError::Cancelled`]. Pages that already completed are still
    /// merged into the index.
    pub async fn initialize_with_cancellation(
        &self,
        cancel: CancellationToken,
    ) -> Result<(), SyncError> {
        if self.init_started.swap(true, Ordering::SeqCst) {
            return Err(SyncError::AlreadyInitialized);
        }

        let folder_id = self.fetch_home_folder_id().await?;
        self.fetch_home_folder_content(folder_id, cancel).await
    }

    async fn fetch_home_folder_id(&self) -> Result<FolderId, SyncError> {
        let user = self.api.get_current_user().await.map_err(|err| {
            error!(
                status = ?err.status(),
                error = %err,
                "API error occurred while fetching user's home folder ID"
            );
            SyncError::Api(err)
        })?;

        let folder_id = user.home_folder_id.ok_or_else(|| {
            error!("User does not have a home folder");
            SyncError::NoHomeFolder
        })?;

        // init_started guarantees a single writer
        let _ = self.home_folder.set(folder_id);
        info!(home_folder_id = %folder_id, "User's home folder ID retrieved");
        Ok(folder_id)
    }

    async fn fetch_home_folder_content(
        &self,
        folder_id: FolderId,
        cancel: CancellationToken,
    ) -> Result<(), SyncError> {
        let per_page = self.options.fetch_files_per_page;

        let first = self
            .api
            .list_folder_contents(folder_id, 1, per_page)
            .await
            .map_err(|source| page_error(1, source))?;

        if first.items.is_empty() {
            info!(home_folder_id = %folder_id, "No files found in the home folder");
            return Ok(());
        }

        let total_pages = first.total_pages.unwrap_or(1).max(1);
        let mut pages = BTreeMap::from([(1, first)]);
        let outcome = if total_pages > 1 {
            self.fetch_remaining_pages(folder_id, total_pages, &mut pages, cancel)
                .await
        } else {
            Ok(())
        };

        // Merge whatever completed, in page order, even if a fetch failed
        let mut stats = MergeStats::default();
        for (_, page) in pages {
            self.merge_items(page.items, &mut stats);
        }

        if stats.skipped > 0 {
            info!(
                skipped = stats.skipped,
                "Skipped folder items without a name or identifier"
            );
        }
        if stats.duplicates > 0 {
            warn!(
                duplicates = stats.duplicates,
                "Folder listing contained duplicate file names; kept the first"
            );
        }

        outcome?;
        info!(
            added = stats.added,
            count = self.index.len(),
            pages = total_pages,
            "Sync engine initialized"
        );
        Ok(())
    }

    /// Fetches pages `2..=total_pages` with bounded concurrency
    ///
    /// Stops at the first failure or cancellation. Dropping the stream
    /// abandons every fetch still in flight.
    async fn fetch_remaining_pages(
        &self,
        folder_id: FolderId,
        total_pages: u32,
        pages: &mut BTreeMap<u32, FolderPage>,
        cancel: CancellationToken,
    ) -> Result<(), SyncError> {
        let per_page = self.options.fetch_files_per_page;
        let api = &self.api;
        let cancel = cancel.child_token();

        debug!(
            total_pages,
            parallelism = self.options.max_degree_of_parallelism,
            "Fetching remaining folder content pages"
        );

        let mut fetches = stream::iter(2..=total_pages)
            .map(|page| {
                let cancel = cancel.clone();
                async move {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => (page, None),
                        result = api.list_folder_contents(folder_id, page, per_page) => {
                            (page, Some(result))
                        }
                    }
                }
            })
            .buffer_unordered(self.options.max_degree_of_parallelism.max(1));

        while let Some((page, result)) = fetches.next().await {
            match result {
                Some(Ok(content)) => {
                    debug!(page, items = content.items.len(), "Fetched folder content page");
                    pages.insert(page, content);
                }
                Some(Err(source)) => {
                    cancel.cancel();
                    return Err(page_error(page, source));
                }
                None => {
                    warn!(page, "Folder content fetch cancelled");
                    return Err(SyncError::Cancelled);
                }
            }
        }

        Ok(())
    }

    fn merge_items(&self, items: Vec<FolderItem>, stats: &mut MergeStats) {
        for item in items {
            let (Some(name), Some(id)) = (item.name.filter(|n| !n.is_empty()), item.id) else {
                stats.skipped += 1;
                continue;
            };

            match self.index.entry(name) {
                Entry::Occupied(existing) => {
                    debug!(file_name = %existing.key(), "Duplicate file name in listing");
                    stats.duplicates += 1;
                }
                Entry::Vacant(slot) => {
                    slot.insert(RemoteFileId::new(id));
                    stats.added += 1;
                }
            }
        }
    }

    // ========================================================================
    // Upload
    // ========================================================================

    /// Uploads the file at `path` into the home folder as `file_name`
    ///
    /// Retries local I/O failures and retryable API failures with
    /// exponential backoff. A file that still cannot be opened or read once
    /// retries are exhausted is logged and skipped (`Ok(())`); every other
    /// failure is returned.
    pub async fn upload(&self, path: &Path, file_name: &str) -> Result<(), SyncError> {
        let folder_id = self.require_home_folder()?;
        info!(file_name, "Uploading file");

        let result = self
            .serialized(file_name, self.upload_with_retry(path, file_name, folder_id))
            .await;

        match result {
            Ok(Some(file_id)) => {
                info!(file_name, file_id = %file_id, "File uploaded");
                Ok(())
            }
            Ok(None) => {
                info!(file_name, "File uploaded");
                Ok(())
            }
            Err(SyncError::Io(err)) => {
                error!(
                    file_name,
                    path = %path.display(),
                    error = %err,
                    "Error occurred while opening file for upload"
                );
                Ok(())
            }
            Err(err) => {
                error!(file_name, error = %err, "Error during file upload");
                Err(err)
            }
        }
    }

    async fn upload_with_retry(
        &self,
        path: &Path,
        file_name: &str,
        folder_id: FolderId,
    ) -> Result<Option<RemoteFileId>, SyncError> {
        self.retry
            .execute(
                |_| self.upload_once(path, file_name, folder_id),
                SyncError::is_retryable,
                |err, delay, attempt| {
                    warn!(
                        file_name,
                        attempt,
                        delay_secs = delay.as_secs(),
                        error = %err,
                        "Error occurred while uploading file; retrying"
                    );
                },
            )
            .await
    }

    async fn upload_once(
        &self,
        path: &Path,
        file_name: &str,
        folder_id: FolderId,
    ) -> Result<Option<RemoteFileId>, SyncError> {
        let file = tokio::fs::File::open(path).await?;
        let content = UploadContent::new(file_name, file, self.options.read_buffer_size);

        let uploaded = self.api.upload_file(folder_id, content).await?;

        let Some(raw) = uploaded.file_id.filter(|id| !id.is_empty()) else {
            warn!(file_name, "Upload response did not include a file ID; not tracking");
            return Ok(None);
        };
        let file_id: RemoteFileId = raw
            .parse()
            .map_err(|_| SyncError::InvalidRemoteId(raw.clone()))?;

        if let Entry::Vacant(slot) = self.index.entry(file_name.to_string()) {
            slot.insert(file_id);
        } else {
            debug!(file_name, "File already tracked; keeping existing ID");
        }
        Ok(Some(file_id))
    }

    // ========================================================================
    // Delete
    // ========================================================================

    /// Deletes the remote copy of `file_name`
    ///
    /// Deleting a file that is not tracked is not an error. The index entry
    /// is only removed once the remote delete succeeds. Deletes are not
    /// retried.
    pub async fn delete_file(&self, file_name: &str) -> Result<(), SyncError> {
        self.require_home_folder()?;
        info!(file_name, "Deleting file");

        self.serialized(file_name, async {
            let Some(file_id) = self.remote_id(file_name) else {
                warn!(file_name, "Attempted to delete non-tracked file");
                return Ok(());
            };

            if let Err(err) = self.api.delete_file(file_id).await {
                error!(file_name, file_id = %file_id, error = %err, "API error during file deletion");
                return Err(SyncError::Api(err));
            }

            self.index.remove(file_name);
            info!(file_name, file_id = %file_id, "File deleted");
            Ok(())
        })
        .await
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn require_home_folder(&self) -> Result<FolderId, SyncError> {
        self.home_folder_id().ok_or_else(|| {
            error!("Home folder ID is not set; cannot sync before initialization");
            SyncError::NotInitialized
        })
    }

    /// Runs `operation` while holding the per-name lock for `file_name`
    ///
    /// The lock entry is dropped from the map once no other task holds it.
    async fn serialized<T>(&self, file_name: &str, operation: impl Future<Output = T>) -> T {
        let lock = self
            .op_locks
            .entry(file_name.to_string())
            .or_default()
            .clone();

        let result = {
            let _guard = lock.lock().await;
            operation.await
        };

        drop(lock);
        self.op_locks
            .remove_if(file_name, |_, lock| Arc::strong_count(lock) == 1);
        result
    }
}

fn page_error(page: u32, source: ApiError) -> SyncError {
    error!(
        page,
        status = ?source.status(),
        error = %source,
        "API error occurred while fetching folder content"
    );
    SyncError::PageFetch { page, source }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("options", &self.options)
            .field("home_folder", &self.home_folder.get())
            .field("tracked", &self.index.len())
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl IFileSync for SyncEngine {
    type Error = SyncError;

    async fn upload(&self, path: &Path, file_name: &str) -> Result<(), SyncError> {
        SyncEngine::upload(self, path, file_name).await
    }

    async fn delete_file(&self, file_name: &str) -> Result<(), SyncError> {
        SyncEngine::delete_file(self, file_name).await
    }
}

// ============================================================================
// Tests
// ============================================================================
