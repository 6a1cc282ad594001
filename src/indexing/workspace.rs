//! Multi-root index manager
//!
//! Owns one [`CommandIndex`] per workspace root, keeps that set in sync with
//! the host's root list and answers lookups across all roots.

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};

use super::command_index::CommandIndex;
use crate::config::CommandIndexConfig;
use crate::error::{IndexError, IndexResult};
use crate::parsing::CommandDefinition;

pub struct WorkspaceIndexManager {
    config: CommandIndexConfig,
    // Ordered by root so aggregated lookups are deterministic
    indexes: RwLock<BTreeMap<PathBuf, Arc<CommandIndex>>>,
    sync_lock: tokio::sync::Mutex<()>,
}

impl WorkspaceIndexManager {
    pub fn new(config: CommandIndexConfig) -> Self {
        Self {
            config,
            indexes: RwLock::new(BTreeMap::new()),
            sync_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub async fn initialize(&self, roots: &[PathBuf]) -> IndexResult<()> {
        self.sync_roots(roots).await
    }

    /// Make the managed roots equal to `roots`.
    ///
    /// Indexes of removed roots are disposed; new roots are initialized
    /// (first rebuild included) before this returns. A root that cannot be
    /// indexed is logged and left out.
    pub async fn sync_roots(&self, roots: &[PathBuf]) -> IndexResult<()> {
        // Serialize concurrent syncs so a root is never initialized twice
        let _guard = self.sync_lock.lock().await;

        let expected: HashSet<PathBuf> = roots.iter().map(|root| canonical_key(root)).collect();

        let removed: Vec<Arc<CommandIndex>> = {
            let mut indexes = self.indexes.write();
            let stale: Vec<PathBuf> = indexes
                .keys()
                .filter(|key| !expected.contains(*key))
                .cloned()
                .collect();
            stale.iter().filter_map(|key| indexes.remove(key)).collect()
        };
        for index in removed {
            info!("removing workspace root {}", index.root().display());
            index.dispose();
        }

        for root in roots {
            let key = canonical_key(root);
            if self.indexes.read().contains_key(&key) {
                continue;
            }

            let index = match CommandIndex::new(root, self.config.clone()) {
                Ok(index) => Arc::new(index),
                Err(e) => {
                    warn!("skipping workspace root {}: {e}", root.display());
                    continue;
                }
            };

            if let Err(e) = index.initialize().await {
                warn!("failed to initialize index for {}: {e}", root.display());
                index.dispose();
                continue;
            }

            self.indexes.write().insert(key, index);
        }

        Ok(())
    }

    /// Rebuild every root concurrently; returns after all have finished.
    ///
    /// Every root is attempted; the first failure, if any, is returned.
    pub async fn rebuild_all(&self) -> IndexResult<()> {
        let mut tasks = JoinSet::new();
        for index in self.indexes() {
            tasks.spawn(async move { index.rebuild().await.map(|_| ()) });
        }

        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            let result = joined.map_err(|e| IndexError::General(format!("rebuild task failed: {e}")));
            if let Err(e) = result.and_then(|rebuilt| rebuilt) {
                warn!("rebuild failed: {e}");
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Definitions of `name` from every root
    pub fn get_definitions(&self, name: &str) -> Vec<CommandDefinition> {
        self.indexes()
            .iter()
            .flat_map(|index| index.definitions(name))
            .collect()
    }

    pub fn roots(&self) -> Vec<PathBuf> {
        self.indexes.read().keys().cloned().collect()
    }

    pub fn index(&self, root: &Path) -> Option<Arc<CommandIndex>> {
        self.indexes.read().get(&canonical_key(root)).cloned()
    }

    /// Snapshot of the managed indexes, safe to use across awaits
    pub fn indexes(&self) -> Vec<Arc<CommandIndex>> {
        self.indexes.read().values().cloned().collect()
    }

    /// Stop all watchers and forget every root
    pub fn dispose(&self) {
        let indexes = std::mem::take(&mut *self.indexes.write());
        for index in indexes.values() {
            index.dispose();
        }
    }
}

fn canonical_key(root: &Path) -> PathBuf {
    root.canonicalize().unwrap_or_else(|_| root.to_path_buf())
}
