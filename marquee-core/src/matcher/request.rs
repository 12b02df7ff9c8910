//! Matchers over request properties.

use regex::Regex;
use smol_str::SmolStr;

use super::RequestMatcher;
use crate::FetchRequest;
use crate::request;

/// Matches top-level document navigations.
#[derive(Debug, Clone, Copy, Default)]
pub struct Navigation;

impl RequestMatcher for Navigation {
    fn matches(&self, request: &FetchRequest) -> bool {
        request.is_navigation()
    }
}

/// Matches requests with the given destination.
#[derive(Debug, Clone, Copy)]
pub struct Destination {
    destination: request::Destination,
}

impl Destination {
    /// Matches requests whose destination is `destination`.
    pub fn new(destination: request::Destination) -> Self {
        Self { destination }
    }
}

impl RequestMatcher for Destination {
    fn matches(&self, request: &FetchRequest) -> bool {
        request.destination() == self.destination
    }
}

/// Matches requests with the given method.
#[derive(Debug, Clone)]
pub struct Method {
    method: http::Method,
}

impl Method {
    /// Matches requests issued with `method`.
    pub fn new(method: http::Method) -> Self {
        Self { method }
    }
}

impl RequestMatcher for Method {
    fn matches(&self, request: &FetchRequest) -> bool {
        *request.method() == self.method
    }
}

/// Matches the request host, case-insensitively.
///
/// A pattern starting with `*.` matches any subdomain of the rest, but not
/// the bare domain itself:
///
/// ```
/// use marquee_core::{FetchRequest, Host, RequestMatcher};
///
/// let backend = Host::new("*.supabase.co");
/// assert!(backend.matches(&FetchRequest::get("https://xyz.supabase.co/rest/v1/x".parse()?)));
/// assert!(!backend.matches(&FetchRequest::get("https://supabase.co/".parse()?)));
/// # Ok::<(), http::uri::InvalidUri>(())
/// ```
#[derive(Debug, Clone)]
pub struct Host {
    pattern: HostPattern,
}

#[derive(Debug, Clone)]
enum HostPattern {
    Exact(SmolStr),
    Subdomain(SmolStr),
}

impl Host {
    /// Creates a host matcher from `pattern`.
    pub fn new(pattern: &str) -> Self {
        let pattern = pattern.to_ascii_lowercase();
        let pattern = match pattern.strip_prefix("*.") {
            Some(suffix) => HostPattern::Subdomain(SmolStr::new(format!(".{suffix}"))),
            None => HostPattern::Exact(SmolStr::new(pattern)),
        };
        Self { pattern }
    }
}

impl RequestMatcher for Host {
    fn matches(&self, request: &FetchRequest) -> bool {
        let Some(host) = request.uri().host() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        match &self.pattern {
            HostPattern::Exact(expected) => host == expected.as_str(),
            HostPattern::Subdomain(suffix) => {
                host.len() > suffix.len() && host.ends_with(suffix.as_str())
            }
        }
    }
}

/// Matches requests whose path starts with a prefix.
#[derive(Debug, Clone)]
pub struct PathPrefix {
    prefix: SmolStr,
}

impl PathPrefix {
    /// Matches paths beginning with `prefix`.
    pub fn new(prefix: impl Into<SmolStr>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl RequestMatcher for PathPrefix {
    fn matches(&self, request: &FetchRequest) -> bool {
        request.uri().path().starts_with(self.prefix.as_str())
    }
}

/// Matches the request path against a regular expression.
#[derive(Debug, Clone)]
pub struct Path {
    pattern: Regex,
}

impl Path {
    /// Matches paths accepted by `pattern`.
    pub fn new(pattern: Regex) -> Self {
        Self { pattern }
    }

    /// Compiles `pattern` and matches paths it accepts.
    pub fn parse(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self::new)
    }
}

impl RequestMatcher for Path {
    fn matches(&self, request: &FetchRequest) -> bool {
        self.pattern.is_match(request.uri().path())
    }
}
