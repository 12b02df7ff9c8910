//! The interception worker.
//!
//! [`Orchestrator`] owns the strategy table, the precache manifest and the
//! namespace backend. Its lifecycle mirrors a browser service worker:
//! [`install`](Orchestrator::install) fills the precache,
//! [`activate`](Orchestrator::activate) drops stale namespaces and takes
//! control, and from then on [`handle`](Orchestrator::handle) resolves every
//! request.

mod builder;
mod handle;
mod lifecycle;
mod state;

use std::collections::HashSet;
use std::sync::Arc;

use marquee_backend::Backend;
use marquee_core::Fetch;
use smol_str::SmolStr;

pub use builder::{NotSet, OrchestratorBuilder};
pub use lifecycle::{ActivateReport, InstallReport};
pub use state::WorkerState;

use crate::config::WorkerConfig;
use crate::namespace::Namespace;
use crate::offload::OffloadManager;
use crate::precache::PrecacheManifest;
use crate::strategy::{RuntimeCache, StrategyTable};
use state::AtomicState;

/// A precache entry with its resolved request key.
#[derive(Debug, Clone)]
pub(crate) struct PrecacheAsset {
    pub(crate) url: String,
    pub(crate) uri: Option<http::Uri>,
}

pub(crate) struct Inner<F> {
    pub(crate) table: StrategyTable,
    pub(crate) manifest: PrecacheManifest,
    pub(crate) config: WorkerConfig,
    pub(crate) backend: Arc<dyn Backend>,
    pub(crate) network: F,
    pub(crate) offload: OffloadManager,
    pub(crate) state: AtomicState,
    pub(crate) precache: Namespace,
    pub(crate) precache_assets: Vec<PrecacheAsset>,
    pub(crate) precache_keys: HashSet<SmolStr>,
    pub(crate) shell_key: SmolStr,
    pub(crate) priority: Namespace,
}

/// Network-interception cache orchestrator.
///
/// Cloning is cheap; clones drive the same worker.
pub struct Orchestrator<F> {
    pub(crate) inner: Arc<Inner<F>>,
}

impl<F> Clone for Orchestrator<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Orchestrator<NotSet> {
    /// Starts building a worker for `table` and `manifest`.
    ///
    /// The shell URL is added to the manifest when missing.
    pub fn builder(
        table: StrategyTable,
        manifest: PrecacheManifest,
    ) -> OrchestratorBuilder<NotSet, NotSet> {
        OrchestratorBuilder::new(table, manifest)
    }
}

impl<F> Orchestrator<F>
where
    F: Fetch + 'static,
{
    pub fn state(&self) -> WorkerState {
        self.inner.state.get()
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.inner.config
    }

    pub fn table(&self) -> &StrategyTable {
        &self.inner.table
    }

    pub fn manifest(&self) -> &PrecacheManifest {
        &self.inner.manifest
    }

    /// The manager running revalidations and priority caching.
    pub fn offload(&self) -> &OffloadManager {
        &self.inner.offload
    }

    /// The versioned precache namespace.
    pub fn precache(&self) -> &Namespace {
        &self.inner.precache
    }

    /// The durable namespace filled by priority cache requests.
    pub fn priority(&self) -> &Namespace {
        &self.inner.priority
    }

    /// The namespace behind a runtime rule.
    pub fn runtime(&self, cache: &RuntimeCache) -> Namespace {
        Namespace::runtime(&self.inner.config.prefix, cache, self.inner.backend.clone())
    }

    /// Every namespace name the current build declares.
    pub fn declared_namespaces(&self) -> HashSet<SmolStr> {
        let prefix = &self.inner.config.prefix;
        let mut names: HashSet<SmolStr> = self
            .inner
            .table
            .runtime_caches()
            .map(|cache| cache.namespace(prefix))
            .collect();
        names.insert(SmolStr::new(self.inner.precache.name()));
        names.insert(SmolStr::new(self.inner.priority.name()));
        names
    }
}
