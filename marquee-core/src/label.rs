//! Store label type for identifying storage backends.
//!
//! `StoreLabel` is a newtype wrapper around `SmolStr` used in logs, metrics
//! labels and debug output to tell the tiers apart.

use smol_str::SmolStr;
use std::fmt;

/// A label identifying a storage backend or tier.
///
/// # Example
/// ```
/// use marquee_core::StoreLabel;
///
/// let label = StoreLabel::new("feoxdb");
/// let scoped = label.compose(&StoreLabel::new("persistent"));
/// assert_eq!(scoped.as_str(), "feoxdb.persistent");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StoreLabel(SmolStr);

impl StoreLabel {
    /// Creates a new label.
    #[inline]
    pub fn new(s: impl Into<SmolStr>) -> Self {
        Self(s.into())
    }

    /// Creates a label from a static string (no allocation).
    #[inline]
    pub const fn new_static(s: &'static str) -> Self {
        Self(SmolStr::new_static(s))
    }

    /// Returns the label as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Composes two labels with a dot separator: "self.other".
    #[inline]
    pub fn compose(&self, other: &StoreLabel) -> Self {
        Self(SmolStr::from(format!("{}.{}", self.0, other.0)))
    }
}

impl fmt::Display for StoreLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for StoreLabel {
    #[inline]
    fn from(s: &str) -> Self {
        Self(SmolStr::new(s))
    }
}

impl From<String> for StoreLabel {
    #[inline]
    fn from(s: String) -> Self {
        Self(SmolStr::from(s))
    }
}

impl AsRef<str> for StoreLabel {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}
