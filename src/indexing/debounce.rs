//! Trailing debounce for rebuild requests
//!
//! Every request restarts the quiet window; the action runs once after the
//! window passes without new requests. Requests arriving while the action is
//! running start a new window afterwards.

use std::future::Future;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, sleep};

/// Cheap handle for scheduling a debounced action, usable from any thread
#[derive(Debug, Clone)]
pub struct RebuildTrigger {
    tx: mpsc::UnboundedSender<()>,
}

impl RebuildTrigger {
    pub fn schedule(&self) {
        // A closed channel means the debouncer was dropped; nothing to do
        let _ = self.tx.send(());
    }
}

/// Owns the debounce task; dropping it cancels any pending run.
#[derive(Debug)]
pub struct Debouncer {
    trigger: RebuildTrigger,
    task: JoinHandle<()>,
}

impl Debouncer {
    /// Spawn the debounce task on the current tokio runtime
    pub fn spawn<F, Fut>(window: Duration, mut action: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();

        let task = tokio::spawn(async move {
            while rx.recv().await.is_some() {
                loop {
                    tokio::select! {
                        _ = sleep(window) => break,
                        next = rx.recv() => {
                            if next.is_none() {
                                return;
                            }
                        }
                    }
                }
                action().await;
            }
        });

        Self {
            trigger: RebuildTrigger { tx },
            task,
        }
    }

    pub fn trigger(&self) -> RebuildTrigger {
        self.trigger.clone()
    }

    pub fn schedule(&self) {
        self.trigger.schedule();
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
