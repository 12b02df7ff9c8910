use futures::{StreamExt, stream};
use marquee_backend::DeleteStatus;
use marquee_core::{Fetch, FetchRequest};
use smol_str::SmolStr;
use tracing::{debug, info, warn};

use super::{Orchestrator, PrecacheAsset, WorkerState};
use crate::metrics;

/// Outcome of [`Orchestrator::install`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    /// Assets now in the precache namespace.
    pub cached: usize,
    /// Manifest URLs that could not be installed.
    pub failed: Vec<String>,
}

/// Outcome of [`Orchestrator::activate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivateReport {
    /// Stale namespaces deleted.
    pub dropped: Vec<SmolStr>,
    /// Expired entries swept out of declared namespaces.
    pub purged: usize,
}

impl<F> Orchestrator<F>
where
    F: Fetch + 'static,
{
    /// Fetches every manifest asset into the precache namespace.
    ///
    /// A failing asset is logged and skipped; the others still install.
    pub async fn install(&self) -> InstallReport {
        self.inner.state.set(WorkerState::Installing);
        info!(
            revision = self.inner.manifest.revision(),
            assets = self.inner.precache_assets.len(),
            "installing precache"
        );

        let concurrency = usize::from(self.inner.config.precache_concurrency.get());
        let outcomes: Vec<(String, bool)> = stream::iter(self.inner.precache_assets.iter())
            .map(|asset| async move { (asset.url.clone(), self.precache_one(asset).await) })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut report = InstallReport::default();
        for (url, cached) in outcomes {
            if cached {
                report.cached += 1;
            } else {
                metrics::record_precache_failure();
                report.failed.push(url);
            }
        }
        report.failed.sort();

        self.inner.state.set(WorkerState::Installed);
        info!(
            cached = report.cached,
            failed = report.failed.len(),
            "precache installed"
        );
        report
    }

    async fn precache_one(&self, asset: &PrecacheAsset) -> bool {
        let Some(uri) = asset.uri.clone() else {
            warn!(url = %asset.url, "precache url does not parse, skipping");
            return false;
        };
        let key = SmolStr::new(uri.to_string());
        metrics::record_network("precache");
        match self.inner.network.fetch(FetchRequest::get(uri)).await {
            Ok(response) if response.is_ok() => self.inner.precache.put(&key, response).await,
            Ok(response) => {
                warn!(url = %asset.url, status = response.status_code(), "precache asset rejected");
                false
            }
            Err(error) => {
                warn!(url = %asset.url, %error, "precache asset failed");
                false
            }
        }
    }

    /// Takes control and deletes namespaces the current build no longer declares.
    ///
    /// Only namespaces carrying the worker prefix are considered. Expired
    /// entries of the declared runtime and priority namespaces are swept too.
    pub async fn activate(&self) -> ActivateReport {
        self.inner.state.set(WorkerState::Activating);
        let declared = self.declared_namespaces();
        let owned = format!("{}-", self.inner.config.prefix);

        let existing = match self.inner.backend.namespaces().await {
            Ok(names) => names,
            Err(error) => {
                warn!(%error, "listing namespaces failed, skipping cleanup");
                Vec::new()
            }
        };

        let mut report = ActivateReport::default();
        for name in existing {
            if !name.starts_with(owned.as_str()) || declared.contains(&name) {
                continue;
            }
            match self.inner.backend.drop_namespace(&name).await {
                Ok(DeleteStatus::Deleted(entries)) => {
                    debug!(namespace = %name, entries, "dropped stale namespace");
                    report.dropped.push(name);
                }
                Ok(DeleteStatus::Missing) => {}
                Err(error) => warn!(namespace = %name, %error, "dropping stale namespace failed"),
            }
        }
        report.dropped.sort();

        for cache in self.inner.table.runtime_caches() {
            report.purged += self.runtime(cache).purge_expired().await;
        }
        report.purged += self.inner.priority.purge_expired().await;

        self.inner.state.set(WorkerState::Activated);
        info!(
            dropped = report.dropped.len(),
            purged = report.purged,
            "worker activated"
        );
        report
    }
}
