#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Worker settings: namespace prefix, scope and background task policy.
pub mod config;

/// Error types surfaced by the worker.
///
/// Defines [`CacheError`], the only error [`Orchestrator::handle`] returns.
/// Storage failures are recovered as misses and never reach it.
pub mod error;

/// Metrics collection for cache observability.
///
/// When the `metrics` feature is enabled, this module provides counters for
/// namespace hits and misses, network fetches, precache failures, evictions,
/// priority stores and revalidations.
pub mod metrics;

/// Bounded view over one cache namespace: lazy expiry and oldest-first eviction.
pub mod namespace;

/// Background task offloading for revalidation and priority caching.
pub mod offload;

/// The interception worker.
pub mod orchestrator;

/// Precache manifest.
pub mod precache;

/// Bounded-window preloading of poster and backdrop URLs with live progress.
pub mod preload;

/// Priority cache protocol between the page and the worker.
pub mod priority;

/// Session-scoped storage tiers.
pub mod session;

/// The cache strategy table.
pub mod strategy;

pub use config::{PrecacheConcurrency, PriorityConfig, WorkerConfig};
pub use error::CacheError;
pub use namespace::Namespace;
pub use orchestrator::{ActivateReport, InstallReport, Orchestrator, WorkerState};
pub use precache::PrecacheManifest;
pub use preload::{PreloadConcurrency, Preloader, Progress};
pub use priority::{PriorityCacheRequest, PriorityChannel, PriorityReport, WorkerMessage};
pub use session::{Role, SessionScope, StorageSelector, Tier, resolve_tier};
pub use strategy::{CacheableResponse, Route, Rule, RuntimeCache, Strategy, StrategyTable};

pub use marquee_backend::{Backend, KeyValueStore};
pub use marquee_core::{Fetch, FetchError, FetchRequest, FetchResponse};
