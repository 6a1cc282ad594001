//! File system watcher feeding debounced rebuilds
//!
//! Watches the source directories of a workspace one by one, without
//! recursion, so build output and dependency trees never consume OS watch
//! handles. Create/modify/remove events for selected sources, and for
//! directories that may hold them, go to a [`RebuildTrigger`]. The watcher
//! never rebuilds by itself; coalescing happens in the debouncer.

use notify::event::{CreateKind, ModifyKind, RemoveKind};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use super::debounce::RebuildTrigger;
use super::walker::SourceMatcher;
use crate::error::{IndexError, IndexResult};

/// Keeps the OS watches alive for as long as it is held
pub struct SourceWatcher {
    inner: Mutex<WatchedDirs>,
}

struct WatchedDirs {
    watcher: RecommendedWatcher,
    dirs: BTreeSet<PathBuf>,
}

impl SourceWatcher {
    /// Start watching `directories`. Fails when no directory could be watched.
    pub fn start(
        matcher: Arc<SourceMatcher>,
        trigger: RebuildTrigger,
        directories: Vec<PathBuf>,
    ) -> IndexResult<Self> {
        let root = matcher.root().to_path_buf();
        let callback_matcher = matcher.clone();

        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    if is_relevant(&event, &callback_matcher) {
                        debug!("source change detected: {:?}", event.paths);
                        trigger.schedule();
                    }
                }
                Err(e) => warn!("file watch error: {e}"),
            }
        })
        .map_err(|e| IndexError::WatcherInit {
            path: root.clone(),
            reason: e.to_string(),
        })?;

        let this = Self {
            inner: Mutex::new(WatchedDirs {
                watcher,
                dirs: BTreeSet::new(),
            }),
        };
        this.sync_directories(directories);

        let count = this.inner.lock().dirs.len();
        if count == 0 {
            return Err(IndexError::WatcherInit {
                path: root,
                reason: "no source directory could be watched".to_string(),
            });
        }

        debug!("watching {count} directories under {}", root.display());
        Ok(this)
    }

    /// Bring the watched set in line with `directories`: new ones are added,
    /// vanished ones dropped. Individual failures are logged and skipped.
    pub fn sync_directories(&self, directories: Vec<PathBuf>) {
        let wanted: BTreeSet<PathBuf> = directories.into_iter().collect();
        let mut inner = self.inner.lock();

        let stale: Vec<PathBuf> = inner.dirs.difference(&wanted).cloned().collect();
        for dir in stale {
            // The OS drops the watch on its own when the directory is deleted
            if let Err(e) = inner.watcher.unwatch(&dir) {
                debug!("unwatch {}: {e}", dir.display());
            }
            inner.dirs.remove(&dir);
        }

        for dir in wanted {
            if inner.dirs.contains(&dir) {
                continue;
            }
            match inner.watcher.watch(&dir, RecursiveMode::NonRecursive) {
                Ok(()) => {
                    inner.dirs.insert(dir);
                }
                Err(e) => warn!("Failed to watch {}: {e}", dir.display()),
            }
        }
    }

    /// Directories currently under watch, in path order
    pub fn watched_directories(&self) -> Vec<PathBuf> {
        self.inner.lock().dirs.iter().cloned().collect()
    }
}

/// Create, change and delete events on a selected file, or on a directory
/// that can contain selected files; access events and unrelated paths are
/// ignored.
pub fn is_relevant(event: &Event, matcher: &SourceMatcher) -> bool {
    if !matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) {
        return false;
    }

    event.paths.iter().any(|path| {
        matcher.is_match(path)
            || (is_directory_event(&event.kind, path) && matcher.is_directory_candidate(path))
    })
}

fn is_directory_event(kind: &EventKind, path: &Path) -> bool {
    match kind {
        EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder) => true,
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(_)) => path.is_dir(),
        _ => false,
    }
}
