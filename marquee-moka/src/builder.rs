//! Builder for configuring [`MokaBackend`].

use marquee_core::{CachedResponse, EntryKey, StoreLabel};
use moka::future::{Cache, CacheBuilder};
use moka::policy::EvictionPolicy;

use crate::backend::MokaBackend;

/// Marker type: capacity has not been configured yet.
///
/// Call [`max_entries()`](MokaBackendBuilder::max_entries) or
/// [`max_bytes()`](MokaBackendBuilder::max_bytes) before `build()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapacity;

/// Marker type: the backend holds at most `n` entries across all namespaces.
#[derive(Debug, Clone, Copy)]
pub struct EntryCapacity(pub(crate) u64);

/// Marker type: the backend holds at most `n` bytes (approximate) across all
/// namespaces.
#[derive(Debug, Clone, Copy)]
pub struct ByteCapacity(pub(crate) u64);

/// Builder for a [`MokaBackend`].
///
/// Capacity here is a global memory guard. Per-namespace entry limits are
/// enforced by the worker on top of it, so the guard should be set well above
/// the sum of those limits.
///
/// ```
/// use marquee_moka::MokaBackend;
///
/// let backend = MokaBackend::builder()
///     .label("worker")
///     .max_bytes(64 * 1024 * 1024)
///     .build();
/// ```
#[derive(Debug)]
pub struct MokaBackendBuilder<Cap> {
    capacity: Cap,
    label: StoreLabel,
    eviction_policy: Option<EvictionPolicy>,
}

impl MokaBackendBuilder<NoCapacity> {
    /// Creates a builder with no capacity configured.
    pub fn new() -> Self {
        Self {
            capacity: NoCapacity,
            label: StoreLabel::new_static("moka"),
            eviction_policy: None,
        }
    }

    /// Sets the maximum number of entries.
    pub fn max_entries(self, capacity: u64) -> MokaBackendBuilder<EntryCapacity> {
        MokaBackendBuilder {
            capacity: EntryCapacity(capacity),
            label: self.label,
            eviction_policy: self.eviction_policy,
        }
    }

    /// Sets the memory budget in bytes, weighed by
    /// [`EntryKey::memory_size`] plus [`CachedResponse::memory_size`].
    pub fn max_bytes(self, bytes: u64) -> MokaBackendBuilder<ByteCapacity> {
        MokaBackendBuilder {
            capacity: ByteCapacity(bytes),
            label: self.label,
            eviction_policy: self.eviction_policy,
        }
    }
}

impl Default for MokaBackendBuilder<NoCapacity> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Cap> MokaBackendBuilder<Cap> {
    /// Sets the label used in logs and metrics. Defaults to `"moka"`.
    pub fn label(mut self, label: impl Into<StoreLabel>) -> Self {
        self.label = label.into();
        self
    }

    /// Overrides the eviction policy.
    ///
    /// Defaults to [`EvictionPolicy::lru()`]. TinyLFU may refuse to admit a
    /// freshly precached entry, which would make an install look successful
    /// while the entry is already gone.
    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = Some(policy);
        self
    }
}

impl MokaBackendBuilder<EntryCapacity> {
    /// Builds the backend with entry-count capacity.
    pub fn build(self) -> MokaBackend {
        let policy = self.eviction_policy.unwrap_or_else(EvictionPolicy::lru);
        let cache: Cache<EntryKey, CachedResponse> = CacheBuilder::new(self.capacity.0)
            .eviction_policy(policy)
            .build();
        MokaBackend::from_cache(cache, self.label)
    }
}

impl MokaBackendBuilder<ByteCapacity> {
    /// Builds the backend with byte-weighted capacity.
    pub fn build(self) -> MokaBackend {
        let policy = self.eviction_policy.unwrap_or_else(EvictionPolicy::lru);
        let cache: Cache<EntryKey, CachedResponse> = CacheBuilder::new(self.capacity.0)
            .weigher(byte_weigher)
            .eviction_policy(policy)
            .build();
        MokaBackend::from_cache(cache, self.label)
    }
}

fn byte_weigher(key: &EntryKey, value: &CachedResponse) -> u32 {
    (key.memory_size() + value.memory_size()).min(u32::MAX as usize) as u32
}
