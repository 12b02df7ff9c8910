//! Build-time list of assets installed before the worker takes control.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Hashed build artifacts plus the root document.
///
/// The revision names the precache namespace, so a new build lands in a
/// fresh namespace and activation drops the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecacheManifest {
    revision: SmolStr,
    urls: Vec<String>,
}

impl PrecacheManifest {
    /// A manifest for build `revision`. Duplicate URLs are dropped.
    pub fn new<I, S>(revision: impl Into<SmolStr>, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut manifest = Self {
            revision: revision.into(),
            urls: Vec::new(),
        };
        for url in urls {
            manifest.push(url);
        }
        manifest
    }

    /// Adds `url` unless already listed.
    pub fn push(&mut self, url: impl Into<String>) {
        let url = url.into();
        if !self.urls.contains(&url) {
            self.urls.push(url);
        }
    }

    pub fn revision(&self) -> &str {
        &self.revision
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Physical namespace name: `{prefix}-precache-{revision}`.
    pub fn namespace(&self, prefix: &str) -> SmolStr {
        SmolStr::new(format!("{prefix}-precache-{}", self.revision))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_are_dropped() {
        let manifest = PrecacheManifest::new("abc123", ["/index.html", "/app.js", "/index.html"]);
        assert_eq!(manifest.urls(), ["/index.html", "/app.js"]);
        assert_eq!(manifest.namespace("marquee"), "marquee-precache-abc123");
    }
}
