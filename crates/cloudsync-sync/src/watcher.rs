//! File watching for the sync root
//!
//! Provides a [`FileWatcher`] that wraps the `notify` crate to monitor the
//! sync root (non-recursively), converting raw OS events into
//! [`WatchEvent`] values delivered over a bounded channel.
//!
//! ## Architecture
//!
//! ```text
//! inotify / kqueue / ReadDirectoryChangesW
//!       │
//!       ▼
//!  FileWatcher  ──→  mpsc::channel  ──→  SyncCoordinator  ──→  SyncEngine
//! ```
//!
//! Only creations and removals are surfaced. A rename is reported as the
//! removal of the old name followed by the creation of the new one.

use std::path::{Path, PathBuf};

use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::SyncError;

/// Capacity of the event channel between the OS callback and the consumer
const EVENT_CHANNEL_CAPACITY: usize = 1024;

// ============================================================================
// WatchEvent
// ============================================================================

/// A change under the watched root, as seen by the sync coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// An entry appeared at `path`
    Created {
        path: PathBuf,
        /// Final path component; empty if it could not be resolved
        name: String,
    },
    /// The entry at `path` went away
    Deleted {
        path: PathBuf,
        /// Final path component; empty if it could not be resolved
        name: String,
    },
    /// The OS watcher reported a failure (e.g. event queue overflow)
    Error(String),
}

impl WatchEvent {
    fn created(path: &Path) -> Self {
        WatchEvent::Created {
            path: path.to_path_buf(),
            name: file_name_of(path),
        }
    }

    fn deleted(path: &Path) -> Self {
        WatchEvent::Deleted {
            path: path.to_path_buf(),
            name: file_name_of(path),
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ============================================================================
// FileWatcher
// ============================================================================

/// Watches the sync root for entries being created or removed
///
/// ## Usage
///
/// ```ignore
/// let (mut watcher, rx) = FileWatcher::new()?;
/// watcher.watch(Path::new("/home/user/CloudSync"))?;
/// // rx.recv().await to get events
/// ```
pub struct FileWatcher {
    watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Creates a new `FileWatcher` and the receiver its events arrive on
    ///
    /// # Errors
    /// Returns an error if the underlying OS watcher cannot be created
    pub fn new() -> Result<(Self, mpsc::Receiver<WatchEvent>), SyncError> {
        let (tx, rx) = mpsc::channel::<WatchEvent>(EVENT_CHANNEL_CAPACITY);

        info!("Initializing file watcher");

        let watcher = RecommendedWatcher::new(
            move |res: Result<notify::Event, notify::Error>| {
                let events = match res {
                    Ok(event) => map_notify_event(&event),
                    Err(err) => {
                        error!(error = %err, "File watcher error");
                        vec![WatchEvent::Error(err.to_string())]
                    }
                };
                for event in events {
                    if let Err(e) = tx.blocking_send(event) {
                        warn!(error = %e, "Failed to send watch event (receiver dropped)");
                    }
                }
            },
            notify::Config::default(),
        )?;

        Ok((Self { watcher }, rx))
    }

    /// Starts watching the entries directly under `root`
    ///
    /// # Errors
    /// Returns an error if the path cannot be watched (e.g. does not exist,
    /// insufficient permissions, or the inotify watch limit is reached)
    pub fn watch(&mut self, root: &Path) -> Result<(), SyncError> {
        info!(path = %root.display(), "Starting watch");
        self.watcher.watch(root, RecursiveMode::NonRecursive)?;
        Ok(())
    }

    /// Stops watching `root`
    pub fn unwatch(&mut self, root: &Path) -> Result<(), SyncError> {
        info!(path = %root.display(), "Stopping watch");
        self.watcher.unwatch(root)?;
        Ok(())
    }
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher").finish_non_exhaustive()
    }
}

// ============================================================================
// Event mapping - notify::Event → WatchEvent
// ============================================================================

/// Converts a `notify::Event` into zero or more [`WatchEvent`]s
///
/// - `Create(*)` -> `Created`
/// - `Remove(*)` -> `Deleted`
/// - `Modify(Name(From))` -> `Deleted`, `Modify(Name(To))` -> `Created`
/// - `Modify(Name(Any))` -> `Created` if the path still exists, else `Deleted`
///
/// `Modify(Name(Both))` is dropped: backends that emit it also emit the
/// separate `From` and `To` halves. Content and metadata changes, access
/// events and anything else are ignored.
fn map_notify_event(event: &notify::Event) -> Vec<WatchEvent> {
    let paths = &event.paths;

    match &event.kind {
        EventKind::Create(_) => {
            debug!(paths = ?paths, "Mapped Create event");
            paths.iter().map(|p| WatchEvent::created(p)).collect()
        }

        EventKind::Remove(_) => {
            debug!(paths = ?paths, "Mapped Remove event");
            paths.iter().map(|p| WatchEvent::deleted(p)).collect()
        }

        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            debug!(paths = ?paths, "Mapped Rename(From) event");
            paths.iter().map(|p| WatchEvent::deleted(p)).collect()
        }

        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            debug!(paths = ?paths, "Mapped Rename(To) event");
            paths.iter().map(|p| WatchEvent::created(p)).collect()
        }

        EventKind::Modify(ModifyKind::Name(RenameMode::Any)) => paths
            .iter()
            .map(|p| {
                if p.exists() {
                    WatchEvent::created(p)
                } else {
                    WatchEvent::deleted(p)
                }
            })
            .collect(),

        _ => {
            debug!(kind = ?event.kind, "Ignoring event kind");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use notify::event::{AccessKind, CreateKind, DataChange, RemoveKind};

    use super::*;

    fn event(kind: EventKind, paths: &[&str]) -> notify::Event {
        notify::Event {
            kind,
            paths: paths.iter().map(PathBuf::from).collect(),
            attrs: Default::default(),
        }
    }

    fn created(path: &str, name: &str) -> WatchEvent {
        WatchEvent::Created {
            path: PathBuf::from(path),
            name: name.to_string(),
        }
    }

    fn deleted(path: &str, name: &str) -> WatchEvent {
        WatchEvent::Deleted {
            path: PathBuf::from(path),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_map_create_event() {
        let mapped = map_notify_event(&event(
            EventKind::Create(CreateKind::File),
            &["/sync/a.txt"],
        ));
        assert_eq!(mapped, vec![created("/sync/a.txt", "a.txt")]);
    }

    #[test]
    fn test_map_remove_event() {
        let mapped = map_notify_event(&event(
            EventKind::Remove(RemoveKind::File),
            &["/sync/a.txt"],
        ));
        assert_eq!(mapped, vec![deleted("/sync/a.txt", "a.txt")]);
    }

    #[test]
    fn test_map_rename_halves() {
        let from = map_notify_event(&event(
            EventKind::Modify(ModifyKind::Name(RenameMode::From)),
            &["/sync/old.txt"],
        ));
        let to = map_notify_event(&event(
            EventKind::Modify(ModifyKind::Name(RenameMode::To)),
            &["/sync/new.txt"],
        ));
        assert_eq!(from, vec![deleted("/sync/old.txt", "old.txt")]);
        assert_eq!(to, vec![created("/sync/new.txt", "new.txt")]);
    }

    #[test]
    fn test_map_rename_both_is_ignored() {
        let mapped = map_notify_event(&event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/sync/old.txt", "/sync/new.txt"],
        ));
        assert!(mapped.is_empty());
    }

    #[test]
    fn test_map_rename_any_checks_existence() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("present.txt");
        std::fs::write(&present, b"x").unwrap();
        let missing = dir.path().join("missing.txt");

        let mapped = map_notify_event(&notify::Event {
            kind: EventKind::Modify(ModifyKind::Name(RenameMode::Any)),
            paths: vec![present.clone(), missing.clone()],
            attrs: Default::default(),
        });

        assert_eq!(
            mapped,
            vec![
                WatchEvent::Created {
                    path: present,
                    name: "present.txt".to_string()
                },
                WatchEvent::Deleted {
                    path: missing,
                    name: "missing.txt".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_map_content_change_ignored() {
        let mapped = map_notify_event(&event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            &["/sync/a.txt"],
        ));
        assert!(mapped.is_empty());
    }

    #[test]
    fn test_map_access_event_ignored() {
        let mapped = map_notify_event(&event(
            EventKind::Access(AccessKind::Read),
            &["/sync/a.txt"],
        ));
        assert!(mapped.is_empty());
    }

    #[test]
    fn test_map_event_no_paths() {
        let mapped = map_notify_event(&event(EventKind::Create(CreateKind::Any), &[]));
        assert!(mapped.is_empty());
    }

    #[test]
    fn test_root_path_has_empty_name() {
        assert_eq!(WatchEvent::created(Path::new("/")), created("/", ""));
    }

    #[tokio::test]
    async fn test_watcher_reports_created_and_deleted_file() {
        let dir = tempfile::tempdir().unwrap();
        let (mut watcher, mut rx) = FileWatcher::new().unwrap();
        watcher.watch(dir.path()).unwrap();

        let path = dir.path().join("hello.txt");
        tokio::fs::write(&path, b"hi").await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();

        let mut saw_created = false;
        let mut saw_deleted = false;
        let deadline = tokio::time::Duration::from_secs(5);
        while !(saw_created && saw_deleted) {
            let event = tokio::time::timeout(deadline, rx.recv())
                .await
                .expect("timed out waiting for watch events")
                .expect("watcher channel closed");
            match event {
                WatchEvent::Created { name, .. } if name == "hello.txt" => saw_created = true,
                WatchEvent::Deleted { name, .. } if name == "hello.txt" => saw_deleted = true,
                _ => {}
            }
        }

        watcher.unwatch(dir.path()).unwrap();
    }
}
