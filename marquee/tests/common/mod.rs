#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use http::StatusCode;
use marquee::strategy::{CacheableResponse, Rule, RuntimeCache, Strategy, StrategyTable};
use marquee::{Orchestrator, PrecacheManifest, WorkerConfig};
use marquee_backend::{Backend, BackendError, BackendResult, DeleteStatus, EntryMeta, KeyValueStore};
use marquee_core::{
    CachedResponse, Destination, DestinationMatcher, EntryKey, Fetch, FetchError, FetchRequest,
    FetchResponse, Host,
};
use smol_str::SmolStr;
use marquee_moka::MokaBackend;

pub const SCOPE: &str = "https://marquee.app/";

#[derive(Clone)]
enum Reply {
    Respond(FetchResponse),
    Fail,
}

/// In-memory network counting every request it sees.
///
/// Unknown URLs answer `404`. While offline every request fails.
#[derive(Default)]
pub struct MockFetcher {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<FetchRequest>>,
    offline: AtomicBool,
    delay: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, url: &str, response: FetchResponse) {
        self.replies
            .lock()
            .unwrap()
            .insert(url.to_owned(), Reply::Respond(response));
    }

    pub fn ok(&self, url: &str, body: &'static str) {
        self.respond(url, FetchResponse::ok(body));
    }

    pub fn fail(&self, url: &str) {
        self.replies
            .lock()
            .unwrap()
            .insert(url.to_owned(), Reply::Fail);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.uri().to_string() == url)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetch for MockFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        let url = request.uri().to_string();
        self.calls.lock().unwrap().push(request);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.offline.load(Ordering::SeqCst) {
            return Err(FetchError::Offline);
        }
        let reply = self.replies.lock().unwrap().get(&url).cloned();
        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail) => Err(FetchError::Timeout),
            None => Ok(FetchResponse::new(StatusCode::NOT_FOUND, "")),
        }
    }
}

/// Storage that is switched off: reads fail as unreachable, writes as full.
pub struct UnavailableStorage;

fn disabled() -> BackendError {
    BackendError::ConnectionError(Box::new(std::io::Error::new(
        std::io::ErrorKind::PermissionDenied,
        "storage disabled",
    )))
}

#[async_trait]
impl Backend for UnavailableStorage {
    async fn read(&self, _key: &EntryKey) -> BackendResult<Option<CachedResponse>> {
        Err(disabled())
    }

    async fn write(&self, _key: &EntryKey, _value: CachedResponse) -> BackendResult<()> {
        Err(BackendError::QuotaExceeded)
    }

    async fn remove(&self, _key: &EntryKey) -> BackendResult<DeleteStatus> {
        Err(disabled())
    }

    async fn entries(&self, _namespace: &str) -> BackendResult<Vec<EntryMeta>> {
        Err(disabled())
    }

    async fn namespaces(&self) -> BackendResult<Vec<SmolStr>> {
        Err(disabled())
    }

    async fn drop_namespace(&self, _namespace: &str) -> BackendResult<DeleteStatus> {
        Err(disabled())
    }
}

#[async_trait]
impl KeyValueStore for UnavailableStorage {
    async fn get(&self, _key: &str) -> BackendResult<Option<String>> {
        Err(disabled())
    }

    async fn set(&self, _key: &str, _value: String) -> BackendResult<()> {
        Err(BackendError::QuotaExceeded)
    }

    async fn remove(&self, _key: &str) -> BackendResult<DeleteStatus> {
        Err(disabled())
    }
}

pub fn images_cache() -> RuntimeCache {
    RuntimeCache::new("images", 1)
        .with_max_entries(3)
        .with_max_age(Duration::from_secs(30 * 24 * 3600))
}

pub fn metadata_cache() -> RuntimeCache {
    RuntimeCache::new("tmdb-api", 1)
        .with_max_entries(500)
        .with_max_age(Duration::from_secs(7 * 24 * 3600))
}

pub fn table() -> StrategyTable {
    StrategyTable::builder()
        .app_shell("/index.html")
        .rule(
            Rule::new(
                "images",
                DestinationMatcher::new(Destination::Image),
                Strategy::CacheFirst(images_cache()),
            )
            .cacheable(CacheableResponse::default().with_opaque()),
        )
        .rule(Rule::new(
            "metadata",
            Host::new("api.themoviedb.org"),
            Strategy::StaleWhileRevalidate(metadata_cache()),
        ))
        .build()
}

pub struct Harness {
    pub worker: Orchestrator<Arc<MockFetcher>>,
    pub network: Arc<MockFetcher>,
    pub backend: Arc<MokaBackend>,
}

/// A worker over `table()` with a network serving the shell and `app.js`.
pub fn harness() -> Harness {
    harness_with(MockFetcher::new(), Arc::new(MokaBackend::builder().max_entries(10_000).build()))
}

pub fn harness_with(network: Arc<MockFetcher>, backend: Arc<MokaBackend>) -> Harness {
    network.ok("https://marquee.app/index.html", "<html>shell</html>");
    network.ok("https://marquee.app/assets/app.js", "console.log(1)");
    let worker = Orchestrator::builder(
        table(),
        PrecacheManifest::new("rev1", ["/assets/app.js"]),
    )
    .backend(backend.clone())
    .network(network.clone())
    .config(WorkerConfig::default().with_scope(SCOPE))
    .build();
    Harness {
        worker,
        network,
        backend,
    }
}

/// Installs and activates the worker.
pub async fn ready() -> Harness {
    let harness = harness();
    harness.worker.install().await;
    harness.worker.activate().await;
    harness
}
