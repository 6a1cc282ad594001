//! Per-root command index
//!
//! Each workspace root owns one [`CommandIndex`]. A rebuild walks the
//! declaration sources, scans every file, applies the registration filter and
//! swaps in a new immutable [`CommandSnapshot`]. Readers clone the current
//! `Arc` and never observe a half-built map.

use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::debounce::Debouncer;
use super::fs_watcher::SourceWatcher;
use super::walker::{FileWalker, SourceMatcher};
use crate::config::CommandIndexConfig;
use crate::error::{ErrorContext, IndexError, IndexResult};
use crate::parsing::{CommandDefinition, DeclarationScanner, FileDeclarations};

/// Immutable result of one rebuild
#[derive(Debug, Default)]
pub struct CommandSnapshot {
    commands: HashMap<String, Vec<CommandDefinition>>,
    registered: HashSet<String>,
    files_scanned: usize,
}

impl CommandSnapshot {
    /// Merge per-file contributions.
    ///
    /// When any file registers names, every definition outside the union of
    /// registered names is dropped; with no registration list at all nothing
    /// is dropped. Definitions sharing a name are all kept.
    pub fn build(contributions: Vec<FileDeclarations>, files_scanned: usize) -> Self {
        let registered: HashSet<String> = contributions
            .iter()
            .flat_map(|file| file.registered.iter().cloned())
            .collect();
        let filter = !registered.is_empty();

        let mut commands: HashMap<String, Vec<CommandDefinition>> = HashMap::new();
        for definition in contributions.into_iter().flat_map(|file| file.definitions) {
            if filter && !registered.contains(&definition.name) {
                continue;
            }
            commands
                .entry(definition.name.clone())
                .or_default()
                .push(definition);
        }

        Self {
            commands,
            registered,
            files_scanned,
        }
    }

    pub fn definitions(&self, name: &str) -> &[CommandDefinition] {
        self.commands.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Command names in sorted order
    pub fn command_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    pub fn definition_count(&self) -> usize {
        self.commands.values().map(Vec::len).sum()
    }

    pub fn registered_count(&self) -> usize {
        self.registered.len()
    }

    /// Whether a registration list restricted this snapshot
    pub fn is_filtered(&self) -> bool {
        !self.registered.is_empty()
    }

    pub fn files_scanned(&self) -> usize {
        self.files_scanned
    }
}

struct WatchState {
    // Field order matters: stop OS events before cancelling the debounce task
    watcher: SourceWatcher,
    _debouncer: Debouncer,
}

/// Declaration index for one workspace root
pub struct CommandIndex {
    root: PathBuf,
    config: CommandIndexConfig,
    scanner: DeclarationScanner,
    matcher: Arc<SourceMatcher>,
    snapshot: RwLock<Arc<CommandSnapshot>>,
    watch: Mutex<Option<WatchState>>,
}

impl CommandIndex {
    pub fn new(root: &Path, config: CommandIndexConfig) -> IndexResult<Self> {
        let root = root
            .canonicalize()
            .ok()
            .filter(|path| path.is_dir())
            .ok_or_else(|| IndexError::RootNotFound {
                path: root.to_path_buf(),
            })?;

        let scanner = DeclarationScanner::from_config(&config)?;
        let matcher = SourceMatcher::new(&root, &config.source_glob, &config.exclude_dirs)?;

        Ok(Self {
            root,
            config,
            scanner,
            matcher: Arc::new(matcher),
            snapshot: RwLock::new(Arc::new(CommandSnapshot::default())),
            watch: Mutex::new(None),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Build the first snapshot, then start watching if configured.
    ///
    /// Returns only after the first rebuild, so queries right after
    /// activation see the sources already on disk. A watcher that cannot
    /// start is logged; the index stays usable through manual rebuilds.
    pub async fn initialize(self: &Arc<Self>) -> IndexResult<()> {
        self.rebuild().await?;
        if self.config.watch {
            if let Err(e) = self.start_watching() {
                warn!(
                    "watching {} disabled, index will not refresh on its own: {e}",
                    self.root.display()
                );
            }
        }
        Ok(())
    }

    /// Scan all sources and atomically replace the snapshot.
    ///
    /// Unreadable files are logged and skipped; the rebuild still completes.
    pub async fn rebuild(&self) -> IndexResult<Arc<CommandSnapshot>> {
        let started = Instant::now();
        let walker = FileWalker::new(self.matcher.clone());
        let watching = self.is_watching();
        let (files, directories) = tokio::task::spawn_blocking(move || {
            (walker.walk(), watching.then(|| walker.watch_directories()))
        })
        .await
        .context("walking declaration sources")?;

        let mut contributions = Vec::with_capacity(files.len());
        for path in &files {
            match tokio::fs::read_to_string(path).await {
                Ok(source) => {
                    let declarations = self.scanner.scan_file(path, &source);
                    debug!(
                        "{}: {} definitions, {} registered",
                        path.display(),
                        declarations.definitions.len(),
                        declarations.registered.len()
                    );
                    contributions.push(declarations);
                }
                Err(e) => warn!("skipping unreadable source {}: {e}", path.display()),
            }
        }

        let snapshot = Arc::new(CommandSnapshot::build(contributions, files.len()));
        *self.snapshot.write() = snapshot.clone();

        // Pick up source directories created or deleted since the last walk
        if let Some(directories) = directories {
            if let Some(state) = self.watch.lock().as_ref() {
                state.watcher.sync_directories(directories);
            }
        }

        info!(
            "indexed {} commands from {} files in {} ({}ms, filtered: {})",
            snapshot.command_count(),
            snapshot.files_scanned(),
            self.root.display(),
            started.elapsed().as_millis(),
            snapshot.is_filtered()
        );

        Ok(snapshot)
    }

    /// Start the debounced watcher; a no-op when already watching
    pub fn start_watching(self: &Arc<Self>) -> IndexResult<()> {
        let mut watch = self.watch.lock();
        if watch.is_some() {
            return Ok(());
        }

        // The debounce task must not keep the index alive
        let weak = Arc::downgrade(self);
        let debouncer = Debouncer::spawn(self.config.debounce(), move || {
            let weak = weak.clone();
            async move {
                let Some(index) = weak.upgrade() else {
                    return;
                };
                if let Err(e) = index.rebuild().await {
                    warn!("rebuild of {} failed: {e}", index.root.display());
                }
            }
        });

        let directories = FileWalker::new(self.matcher.clone()).watch_directories();
        let watcher = SourceWatcher::start(self.matcher.clone(), debouncer.trigger(), directories)?;
        *watch = Some(WatchState {
            watcher,
            _debouncer: debouncer,
        });

        Ok(())
    }

    pub fn is_watching(&self) -> bool {
        self.watch.lock().is_some()
    }

    /// Directories under OS watch; empty when not watching
    pub fn watched_directories(&self) -> Vec<PathBuf> {
        self.watch
            .lock()
            .as_ref()
            .map(|state| state.watcher.watched_directories())
            .unwrap_or_default()
    }

    /// Stop watching and cancel any pending debounced rebuild
    pub fn dispose(&self) {
        if self.watch.lock().take().is_some() {
            debug!("stopped watching {}", self.root.display());
        }
    }

    /// Current snapshot; stays valid even if a rebuild replaces it
    pub fn snapshot(&self) -> Arc<CommandSnapshot> {
        self.snapshot.read().clone()
    }

    pub fn definitions(&self, name: &str) -> Vec<CommandDefinition> {
        self.snapshot().definitions(name).to_vec()
    }
}
