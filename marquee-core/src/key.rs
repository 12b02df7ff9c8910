//! Namespace-qualified entry keys.
//!
//! An [`EntryKey`] pairs a namespace name with a request key. Its string form
//! is `{namespace}|{request}`, which is what flat key-value backends persist:
//!
//! ```
//! use marquee_core::EntryKey;
//!
//! let key = EntryKey::new("marquee-images-v1", "https://image.tmdb.org/a.jpg");
//! assert_eq!(key.to_string(), "marquee-images-v1|https://image.tmdb.org/a.jpg");
//! assert_eq!(EntryKey::parse(&key.to_string()), Some(key));
//! ```
//!
//! [`EntryKey`] uses `Arc` internally, so cloning a key for background tasks
//! only bumps a reference count.

use smol_str::SmolStr;
use std::fmt;
use std::sync::Arc;

const SEPARATOR: char = '|';

#[derive(Debug, Eq, PartialEq, Hash)]
struct EntryKeyInner {
    namespace: SmolStr,
    request: SmolStr,
}

/// Key of one entry inside one cache namespace.
#[derive(Clone, Debug, Eq, Hash)]
pub struct EntryKey {
    inner: Arc<EntryKeyInner>,
}

impl PartialEq for EntryKey {
    fn eq(&self, other: &Self) -> bool {
        // Fast path: same Arc pointer
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner == other.inner
    }
}

impl EntryKey {
    /// Creates a key for `request` inside `namespace`.
    pub fn new(namespace: impl Into<SmolStr>, request: impl Into<SmolStr>) -> Self {
        Self {
            inner: Arc::new(EntryKeyInner {
                namespace: namespace.into(),
                request: request.into(),
            }),
        }
    }

    /// Parses the `{namespace}|{request}` form.
    ///
    /// Namespace names never contain the separator; request keys may.
    pub fn parse(raw: &str) -> Option<Self> {
        let (namespace, request) = raw.split_once(SEPARATOR)?;
        if namespace.is_empty() {
            return None;
        }
        Some(Self::new(namespace, request))
    }

    /// The namespace name.
    pub fn namespace(&self) -> &str {
        &self.inner.namespace
    }

    /// The request key inside the namespace.
    pub fn request(&self) -> &str {
        &self.inner.request
    }

    /// Estimated memory usage of this key in bytes.
    pub fn memory_size(&self) -> usize {
        use std::mem::size_of;

        // SmolStr keeps up to 23 bytes inline
        let heap = |len: usize| len.saturating_sub(23);
        2 * size_of::<usize>()
            + size_of::<EntryKeyInner>()
            + heap(self.inner.namespace.len())
            + heap(self.inner.request.len())
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.inner.namespace, SEPARATOR, self.inner.request)
    }
}
