//! Concurrency-bounded asset preloading with live progress.
//!
//! A run owns a deduplicated URL set and a fixed number of workers pulling
//! from a shared queue. Starting another run, or tearing down, bumps the run
//! generation; completions from an older generation are discarded so a
//! superseded run never moves the progress of the current one.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use bounded_integer::bounded_integer;
use marquee_core::{Fetch, FetchRequest};
use tokio::sync::watch;
use tracing::{debug, trace};

use crate::config::WorkerConfig;
use crate::orchestrator::Orchestrator;

bounded_integer! {
    /// Fetches in flight at once during a preload run (1-64).
    #[repr(u8)]
    pub struct PreloadConcurrency { 1..=64 }
}

impl Default for PreloadConcurrency {
    fn default() -> Self {
        Self::new_saturating(6)
    }
}

/// Settled tasks of the current run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub loaded: usize,
    pub total: usize,
}

impl Progress {
    pub fn done(&self) -> bool {
        self.loaded >= self.total
    }

    /// Fraction settled, `1.0` for an empty run.
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.loaded as f64 / self.total as f64
        }
    }
}

/// Trims, drops empty values and removes case-insensitive duplicates.
///
/// The first spelling of a URL wins and input order is kept.
pub fn dedupe<I, S>(urls: I) -> Vec<String>
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for url in urls.into_iter().flatten() {
        let url = url.as_ref().trim();
        if url.is_empty() {
            continue;
        }
        if seen.insert(url.to_lowercase()) {
            out.push(url.to_owned());
        }
    }
    out
}

struct Shared<F> {
    loader: F,
    config: WorkerConfig,
    generation: AtomicU64,
    progress: watch::Sender<Progress>,
    current: Mutex<HashSet<String>>,
}

/// Preloads URL lists through a [`Fetch`] implementation.
///
/// Cloning is cheap; clones observe and drive the same runs.
pub struct Preloader<F> {
    shared: Arc<Shared<F>>,
}

impl<F> Clone for Preloader<F> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<F> Preloader<F>
where
    F: Fetch + 'static,
{
    /// A preloader fetching absolute URLs through `loader`.
    pub fn new(loader: F) -> Self {
        Self::with_config(loader, WorkerConfig::default())
    }

    /// A preloader resolving relative URLs against the scope of `config`.
    pub fn with_config(loader: F, config: WorkerConfig) -> Self {
        let (progress, _) = watch::channel(Progress::default());
        Self {
            shared: Arc::new(Shared {
                loader,
                config,
                generation: AtomicU64::new(0),
                progress,
                current: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// Starts preloading `urls`, superseding any earlier run.
    ///
    /// The list is deduplicated first. The same set as the current run keeps
    /// that run going. Returns the number of tasks of the run.
    pub fn run<I, S>(&self, urls: I, concurrency: PreloadConcurrency) -> usize
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        let urls = dedupe(urls);
        let set: HashSet<String> = urls.iter().map(|url| url.to_lowercase()).collect();
        {
            let mut current = self
                .shared
                .current
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if !set.is_empty() && *current == set {
                debug!(total = urls.len(), "same url set, keeping current run");
                return urls.len();
            }
            *current = set;
        }

        let generation = self.shared.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let total = urls.len();
        self.shared.progress.send_replace(Progress { loaded: 0, total });
        debug!(generation, total, "preload run started");
        if total == 0 {
            return 0;
        }

        let queue = Arc::new(Mutex::new(VecDeque::from(urls)));
        let workers = usize::from(concurrency.get()).min(total);
        for _ in 0..workers {
            let shared = Arc::clone(&self.shared);
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { work(shared, queue, generation).await });
        }
        total
    }

    /// Invalidates the current run. Its pending completions are ignored.
    pub fn teardown(&self) {
        let generation = self.shared.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.shared
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        debug!(generation, "preload run torn down");
    }

    pub fn progress(&self) -> Progress {
        *self.shared.progress.borrow()
    }

    /// Live progress updates.
    pub fn subscribe(&self) -> watch::Receiver<Progress> {
        self.shared.progress.subscribe()
    }

    /// Resolves once at least `threshold` of the current run has settled.
    pub async fn wait_ready(&self, threshold: f64) -> Progress {
        let mut receiver = self.subscribe();
        match receiver
            .wait_for(|progress| progress.ratio() >= threshold)
            .await
        {
            Ok(progress) => *progress,
            Err(_) => self.progress(),
        }
    }
}

impl<F> Orchestrator<F>
where
    F: Fetch + 'static,
{
    /// A preloader warming caches through this worker, within its scope.
    pub fn preloader(&self) -> Preloader<Self> {
        Preloader::with_config(self.clone(), self.config().clone())
    }
}

async fn work<F: Fetch>(shared: Arc<Shared<F>>, queue: Arc<Mutex<VecDeque<String>>>, generation: u64) {
    loop {
        if shared.generation.load(Ordering::Acquire) != generation {
            return;
        }
        let next = queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        let Some(url) = next else {
            return;
        };

        match shared.config.resolve(&url) {
            Some(uri) => {
                if let Err(error) = shared.loader.fetch(FetchRequest::get(uri)).await {
                    trace!(%url, %error, "preload failed");
                }
            }
            None => trace!(%url, "preload url does not parse"),
        }

        shared.progress.send_if_modified(|progress| {
            if shared.generation.load(Ordering::Acquire) != generation {
                return false;
            }
            progress.loaded += 1;
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupe_trims_and_ignores_case() {
        let urls = dedupe([
            Some(" https://a.test/x.jpg "),
            Some("HTTPS://A.TEST/X.JPG"),
            None,
            Some(""),
            Some("https://b.test/y.jpg"),
        ]);
        assert_eq!(urls, ["https://a.test/x.jpg", "https://b.test/y.jpg"]);
    }

    #[test]
    fn empty_progress_is_done() {
        let progress = Progress::default();
        assert!(progress.done());
        assert_eq!(progress.ratio(), 1.0);
        assert!(!Progress { loaded: 1, total: 2 }.done());
    }
}
