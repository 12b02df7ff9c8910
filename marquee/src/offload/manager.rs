//! Registry of running background tasks.

use std::future::Future;
use std::pin::pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use dashmap::DashSet;
use marquee_core::EntryKey;
use smol_str::SmolStr;
use tokio::sync::Notify;
use tracing::{Instrument, debug, info_span, warn};

use super::policy::TimeoutPolicy;
use crate::metrics;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum TaskKey {
    /// Refresh of one namespace entry. At most one runs per entry.
    Entry(EntryKey),
    Job { kind: SmolStr, seq: u64 },
}

impl TaskKey {
    fn kind(&self) -> &str {
        match self {
            Self::Entry(_) => "revalidate",
            Self::Job { kind, .. } => kind,
        }
    }
}

#[derive(Debug)]
struct Registry {
    policy: TimeoutPolicy,
    running: DashSet<TaskKey>,
    seq: AtomicU64,
    idle: Notify,
}

/// Owned by the spawned task. Dropping it unregisters the key, so a task
/// that completes, times out or panics never lingers in the registry.
struct Running {
    registry: Arc<Registry>,
    key: TaskKey,
}

impl Drop for Running {
    fn drop(&mut self) {
        self.registry.running.remove(&self.key);
        if self.registry.running.is_empty() {
            self.registry.idle.notify_waiters();
        }
    }
}

/// Runs revalidations and priority caching off the request path.
///
/// Clones share one registry. A task is registered before it is spawned and
/// unregisters itself when it ends.
#[derive(Clone, Debug)]
pub struct OffloadManager {
    registry: Arc<Registry>,
}

impl OffloadManager {
    pub fn new(policy: TimeoutPolicy) -> Self {
        Self {
            registry: Arc::new(Registry {
                policy,
                running: DashSet::new(),
                seq: AtomicU64::new(0),
                idle: Notify::new(),
            }),
        }
    }

    /// Spawns a task of `kind`. Jobs are never deduplicated.
    pub fn spawn<F>(&self, kind: impl Into<SmolStr>, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let seq = self.registry.seq.fetch_add(1, Ordering::Relaxed);
        self.launch(
            TaskKey::Job {
                kind: kind.into(),
                seq,
            },
            task,
        );
    }

    /// Spawns a refresh of `entry` unless one is already running.
    ///
    /// Returns `false` when the task was skipped.
    pub fn spawn_keyed<F>(&self, entry: EntryKey, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.launch(TaskKey::Entry(entry), task)
    }

    /// Resolves once no task is running, including tasks spawned meanwhile.
    pub async fn wait_all(&self) {
        loop {
            let mut idle = pin!(self.registry.idle.notified());
            idle.as_mut().enable();
            if self.registry.running.is_empty() {
                return;
            }
            idle.await;
        }
    }

    fn launch<F>(&self, key: TaskKey, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if !self.registry.running.insert(key.clone()) {
            debug!(?key, "entry refresh already running");
            metrics::record_offload_deduplicated(key.kind());
            return false;
        }
        metrics::record_offload_spawned(key.kind());

        let span = info_span!("offload_task", kind = key.kind(), key = ?key);
        let policy = self.registry.policy;
        let running = Running {
            registry: self.registry.clone(),
            key,
        };
        tokio::spawn(
            async move {
                let start = Instant::now();
                let cancelled = match policy {
                    TimeoutPolicy::None => {
                        task.await;
                        false
                    }
                    TimeoutPolicy::Cancel { after } => {
                        let outcome = tokio::time::timeout(after, task).await;
                        if outcome.is_err() {
                            warn!(budget_ms = after.as_millis(), "background task cancelled");
                        }
                        outcome.is_err()
                    }
                    TimeoutPolicy::Warn { after } => {
                        task.await;
                        if start.elapsed() > after {
                            warn!(
                                elapsed_ms = start.elapsed().as_millis(),
                                budget_ms = after.as_millis(),
                                "background task overran its budget"
                            );
                        }
                        false
                    }
                };
                metrics::record_offload_finished(running.key.kind(), cancelled, start.elapsed());
                drop(running);
            }
            .instrument(span),
        );
        true
    }
}

impl Default for OffloadManager {
    fn default() -> Self {
        Self::new(TimeoutPolicy::default())
    }
}
