use async_trait::async_trait;
use http::Method;
use marquee_core::{Fetch, FetchError, FetchRequest, FetchResponse};
use tracing::{debug, warn};

use super::{Orchestrator, WorkerState};
use crate::error::CacheError;
use crate::metrics;
use crate::namespace::Namespace;
use crate::strategy::{CacheableResponse, Route, Rule, RuntimeCache, Strategy};

impl<F> Orchestrator<F>
where
    F: Fetch + 'static,
{
    /// Resolves `request` through the first matching rule.
    ///
    /// Before activation the worker does not control pages and every request
    /// goes to the network untouched.
    pub async fn handle(&self, request: FetchRequest) -> Result<FetchResponse, CacheError> {
        if self.state() != WorkerState::Activated {
            return Ok(self.network(request, "uncontrolled").await?);
        }
        if request.method() == Method::GET
            && !request.is_navigation()
            && self.inner.precache_keys.contains(&request.cache_key())
        {
            if let Some(hit) = self.inner.precache.get(&request.cache_key()).await {
                return Ok(hit);
            }
        }
        match self.inner.table.route(&request) {
            Route::AppShell(_) => self.serve_shell(request).await,
            Route::Rule(rule) => self.apply(rule, request).await,
            Route::Passthrough => Ok(self.network(request, "passthrough").await?),
        }
    }

    async fn serve_shell(&self, request: FetchRequest) -> Result<FetchResponse, CacheError> {
        if let Some(shell) = self.inner.precache.get(&self.inner.shell_key).await {
            debug!(uri = %request.uri(), "navigation served from app shell");
            return Ok(shell);
        }
        warn!(uri = %request.uri(), "app shell missing from precache, trying network");
        self.network(request, "app_shell")
            .await
            .map_err(CacheError::ShellUnavailable)
    }

    async fn apply(&self, rule: &Rule, request: FetchRequest) -> Result<FetchResponse, CacheError> {
        match rule.strategy() {
            Strategy::CacheFirst(cache) => self.cache_first(rule, cache, request).await,
            Strategy::StaleWhileRevalidate(cache) => {
                self.stale_while_revalidate(rule, cache, request).await
            }
            Strategy::NetworkOnly => Ok(self.network(request, rule.name()).await?),
        }
    }

    async fn cache_first(
        &self,
        rule: &Rule,
        cache: &RuntimeCache,
        request: FetchRequest,
    ) -> Result<FetchResponse, CacheError> {
        let namespace = self.runtime(cache);
        let key = request.cache_key();
        if let Some(hit) = self.lookup(&namespace, &key).await {
            return Ok(hit);
        }
        self.fetch_and_store(rule.name(), namespace, rule.cacheable_response(), request)
            .await
    }

    async fn stale_while_revalidate(
        &self,
        rule: &Rule,
        cache: &RuntimeCache,
        request: FetchRequest,
    ) -> Result<FetchResponse, CacheError> {
        let namespace = self.runtime(cache);
        let key = request.cache_key();
        if let Some(hit) = self.lookup(&namespace, &key).await {
            self.revalidate(namespace, rule.cacheable_response().clone(), request);
            return Ok(hit);
        }
        self.fetch_and_store(rule.name(), namespace, rule.cacheable_response(), request)
            .await
    }

    /// Runtime namespace first, then the priority namespace.
    async fn lookup(&self, namespace: &Namespace, key: &str) -> Option<FetchResponse> {
        if let Some(hit) = namespace.get(key).await {
            debug!(namespace = namespace.name(), key, "cache hit");
            return Some(hit);
        }
        let hit = self.inner.priority.get(key).await?;
        debug!(namespace = self.inner.priority.name(), key, "priority cache hit");
        Some(hit)
    }

    async fn fetch_and_store(
        &self,
        route: &str,
        namespace: Namespace,
        cacheable: &CacheableResponse,
        request: FetchRequest,
    ) -> Result<FetchResponse, CacheError> {
        let key = request.cache_key();
        let response = self.network(request, route).await?;
        if cacheable.accepts(&response) {
            namespace.put(&key, response.clone()).await;
        } else {
            debug!(namespace = namespace.name(), key = %key, status = response.status_code(), "response not cacheable");
        }
        Ok(response)
    }

    fn revalidate(&self, namespace: Namespace, cacheable: CacheableResponse, request: FetchRequest) {
        let key = request.cache_key();
        let entry = namespace.key(key.clone());
        let worker = self.clone();
        self.inner.offload.spawn_keyed(entry, async move {
            match worker.network(request, "revalidate").await {
                Ok(response) if cacheable.accepts(&response) => {
                    if namespace.put(&key, response).await {
                        metrics::record_revalidation(namespace.name());
                        debug!(namespace = namespace.name(), key = %key, "entry revalidated");
                    }
                }
                Ok(response) => {
                    debug!(namespace = namespace.name(), key = %key, status = response.status_code(), "revalidation response not cacheable");
                }
                Err(error) => {
                    debug!(namespace = namespace.name(), key = %key, %error, "revalidation failed, keeping cached entry");
                }
            }
        });
    }

    pub(crate) async fn network(
        &self,
        request: FetchRequest,
        route: &str,
    ) -> Result<FetchResponse, FetchError> {
        metrics::record_network(route);
        self.inner.network.fetch(request).await
    }
}

#[async_trait]
impl<F> Fetch for Orchestrator<F>
where
    F: Fetch + 'static,
{
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        self.handle(request).await.map_err(FetchError::from)
    }
}
