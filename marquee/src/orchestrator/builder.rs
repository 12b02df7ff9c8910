use std::collections::HashSet;
use std::sync::Arc;

use marquee_backend::Backend;
use marquee_core::Fetch;
use smol_str::SmolStr;

use super::state::{AtomicState, WorkerState};
use super::{Inner, Orchestrator, PrecacheAsset};
use crate::config::WorkerConfig;
use crate::namespace::Namespace;
use crate::offload::OffloadManager;
use crate::precache::PrecacheManifest;
use crate::strategy::StrategyTable;

/// Marker type for unset builder fields.
///
/// When you see `NotSet` in a compiler error, it means you haven't called
/// the corresponding builder method yet.
#[derive(Debug, Clone, Copy)]
pub struct NotSet;

/// Builder for [`Orchestrator`].
pub struct OrchestratorBuilder<B, F> {
    table: StrategyTable,
    manifest: PrecacheManifest,
    config: WorkerConfig,
    backend: B,
    network: F,
}

impl OrchestratorBuilder<NotSet, NotSet> {
    pub(crate) fn new(table: StrategyTable, manifest: PrecacheManifest) -> Self {
        Self {
            table,
            manifest,
            config: WorkerConfig::default(),
            backend: NotSet,
            network: NotSet,
        }
    }
}

impl<B, F> OrchestratorBuilder<B, F> {
    /// Sets the namespace backend.
    pub fn backend<NB>(self, backend: NB) -> OrchestratorBuilder<Arc<dyn Backend>, F>
    where
        NB: Backend + 'static,
    {
        OrchestratorBuilder {
            table: self.table,
            manifest: self.manifest,
            config: self.config,
            backend: Arc::new(backend),
            network: self.network,
        }
    }

    /// Sets the network the worker fetches from.
    pub fn network<NF>(self, network: NF) -> OrchestratorBuilder<B, NF>
    where
        NF: Fetch + 'static,
    {
        OrchestratorBuilder {
            table: self.table,
            manifest: self.manifest,
            config: self.config,
            backend: self.backend,
            network,
        }
    }

    /// Replaces the worker settings.
    pub fn config(self, config: WorkerConfig) -> Self {
        Self { config, ..self }
    }
}

impl<F> OrchestratorBuilder<Arc<dyn Backend>, F>
where
    F: Fetch + 'static,
{
    /// Builds the worker in the [`Parsed`](WorkerState::Parsed) state.
    pub fn build(self) -> Orchestrator<F> {
        let Self {
            table,
            mut manifest,
            config,
            backend,
            network,
        } = self;

        manifest.push(table.app_shell().url());
        let precache_assets: Vec<PrecacheAsset> = manifest
            .urls()
            .iter()
            .map(|url| PrecacheAsset {
                url: url.clone(),
                uri: config.resolve(url),
            })
            .collect();
        let precache_keys: HashSet<SmolStr> = precache_assets
            .iter()
            .filter_map(|asset| asset.uri.as_ref())
            .map(|uri| SmolStr::new(uri.to_string()))
            .collect();
        let shell_key = config
            .resolve(table.app_shell().url())
            .map(|uri| SmolStr::new(uri.to_string()))
            .unwrap_or_else(|| SmolStr::new(table.app_shell().url()));

        let precache = Namespace::new(manifest.namespace(&config.prefix), backend.clone());
        let priority = Namespace::runtime(
            &config.prefix,
            &config.priority.runtime_cache(),
            backend.clone(),
        );
        let offload = OffloadManager::new(config.offload);

        Orchestrator {
            inner: Arc::new(Inner {
                table,
                manifest,
                config,
                backend,
                network,
                offload,
                state: AtomicState::new(WorkerState::Parsed),
                precache,
                precache_assets,
                precache_keys,
                shell_key,
                priority,
            }),
        }
    }
}
