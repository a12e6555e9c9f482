//! Sync coordinator - dispatches watch events to the sync engine
//!
//! The [`SyncCoordinator`] reads [`WatchEvent`]s from the watcher channel and
//! turns each one into an upload or delete on an [`IFileSync`]
//! implementation. Dispatches run as independent tasks, bounded by a
//! semaphore; once every permit is taken the coordinator stops reading the
//! channel, which applies backpressure to the watcher.
//!
//! The coordinator holds no sync state. A failed upload or delete is logged
//! and never retried here, and a single failure never stops the loop.

use std::path::PathBuf;
use std::sync::Arc;

use cloudsync_core::ports::IFileSync;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::watcher::WatchEvent;

/// Counters reported when the coordinator stops
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    /// Upload tasks started
    pub uploads: usize,
    /// Delete tasks started
    pub deletes: usize,
    /// Events discarded (directories, unnamed entries)
    pub discarded: usize,
    /// Error notifications received from the watcher
    pub watcher_errors: usize,
}

/// Bounded-concurrency dispatcher from watch events to sync operations
pub struct SyncCoordinator<S> {
    sync: Arc<S>,
    limit: Arc<Semaphore>,
    tasks: JoinSet<()>,
    stats: DispatchStats,
}

impl<S> SyncCoordinator<S>
where
    S: IFileSync + 'static,
{
    /// Creates a coordinator running at most `concurrency` operations at once
    pub fn new(sync: Arc<S>, concurrency: usize) -> Self {
        Self {
            sync,
            limit: Arc::new(Semaphore::new(concurrency.max(1))),
            tasks: JoinSet::new(),
            stats: DispatchStats::default(),
        }
    }

    /// Dispatches events until the channel closes or `shutdown` fires
    ///
    /// In-flight operations are awaited before returning.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<WatchEvent>,
        shutdown: CancellationToken,
    ) -> DispatchStats {
        info!("Sync coordinator started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested; stopping event dispatch");
                    break;
                }
                event = events.recv() => match event {
                    Some(event) => self.dispatch(event).await,
                    None => {
                        info!("Watch event channel closed");
                        break;
                    }
                },
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    log_join_error(joined);
                }
            }
        }

        self.drain().await;
        info!(
            uploads = self.stats.uploads,
            deletes = self.stats.deletes,
            discarded = self.stats.discarded,
            watcher_errors = self.stats.watcher_errors,
            "Sync coordinator stopped"
        );
        self.stats
    }

    async fn dispatch(&mut self, event: WatchEvent) {
        match event {
            WatchEvent::Created { path, name } => self.on_created(path, name).await,
            WatchEvent::Deleted { path, name } => self.on_deleted(path, name).await,
            WatchEvent::Error(cause) => {
                self.stats.watcher_errors += 1;
                error!(error = %cause, "File watcher reported an error");
            }
        }
    }

    async fn on_created(&mut self, path: PathBuf, name: String) {
        if tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
        {
            warn!(path = %path.display(), "Cannot upload directories");
            self.stats.discarded += 1;
            return;
        }
        if name.is_empty() {
            warn!(path = %path.display(), "Created event has no file name; ignoring");
            self.stats.discarded += 1;
            return;
        }

        debug!(file_name = %name, "Dispatching upload");
        self.stats.uploads += 1;
        let sync = self.sync.clone();
        self.spawn(async move {
            if let Err(err) = sync.upload(&path, &name).await {
                error!(file_name = %name, error = %err, "Upload failed");
            }
        })
        .await;
    }

    async fn on_deleted(&mut self, path: PathBuf, name: String) {
        if name.is_empty() {
            warn!(path = %path.display(), "Deleted event has no file name; ignoring");
            self.stats.discarded += 1;
            return;
        }

        debug!(file_name = %name, "Dispatching delete");
        self.stats.deletes += 1;
        let sync = self.sync.clone();
        self.spawn(async move {
            if let Err(err) = sync.delete_file(&name).await {
                error!(file_name = %name, error = %err, "Delete failed");
            }
        })
        .await;
    }

    /// Waits for a permit, then runs `operation` on its own task
    async fn spawn<F>(&mut self, operation: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let permit = loop {
            match self.limit.clone().try_acquire_owned() {
                Ok(permit) => break permit,
                Err(_) => {
                    // Saturated: reap a finished task to free a permit
                    if let Some(joined) = self.tasks.join_next().await {
                        log_join_error(joined);
                    }
                }
            }
        };

        self.tasks.spawn(async move {
            operation.await;
            drop(permit);
        });
    }

    async fn drain(&mut self) {
        if !self.tasks.is_empty() {
            info!(in_flight = self.tasks.len(), "Waiting for in-flight sync operations");
        }
        while let Some(joined) = self.tasks.join_next().await {
            log_join_error(joined);
        }
    }
}

fn log_join_error(joined: Result<(), tokio::task::JoinError>) {
    if let Err(err) = joined {
        error!(error = %err, "Sync task panicked or was cancelled");
    }
}
