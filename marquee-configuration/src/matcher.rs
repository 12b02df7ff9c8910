//! Request matcher configuration.

use marquee_core::{
    Any, BoxMatcher, Destination, DestinationMatcher, Host, MatcherExt, MethodMatcher,
    Navigation, Path, PathPrefix,
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Request destination as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestinationConfig {
    Document,
    Image,
    Script,
    Style,
    Font,
    Empty,
}

impl From<DestinationConfig> for Destination {
    fn from(value: DestinationConfig) -> Self {
        match value {
            DestinationConfig::Document => Destination::Document,
            DestinationConfig::Image => Destination::Image,
            DestinationConfig::Script => Destination::Script,
            DestinationConfig::Style => Destination::Style,
            DestinationConfig::Font => Destination::Font,
            DestinationConfig::Empty => Destination::Empty,
        }
    }
}

/// A request matcher.
///
/// Externally tagged, one key per matcher:
/// ```yaml
/// match:
///   And:
///     - Host: "*.supabase.co"
///     - PathPrefix: /storage/v1/
///     - Not:
///         Path: '\.mp4$'
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Matcher {
    /// Every request.
    Any,
    /// Top-level document navigations.
    Navigate,
    Destination(DestinationConfig),
    /// Host, `*.` prefix for subdomains.
    Host(String),
    PathPrefix(String),
    /// Regular expression over the path.
    Path(String),
    Method(String),
    And(Vec<Matcher>),
    Or(Vec<Matcher>),
    Not(Box<Matcher>),
}

impl Matcher {
    pub fn into_matcher(self) -> Result<BoxMatcher, ConfigError> {
        match self {
            Matcher::Any => Ok(Any.boxed()),
            Matcher::Navigate => Ok(Navigation.boxed()),
            Matcher::Destination(destination) => {
                Ok(DestinationMatcher::new(destination.into()).boxed())
            }
            Matcher::Host(pattern) => Ok(Host::new(&pattern).boxed()),
            Matcher::PathPrefix(prefix) => Ok(PathPrefix::new(prefix).boxed()),
            Matcher::Path(pattern) => Ok(Path::parse(&pattern)?.boxed()),
            Matcher::Method(method) => {
                let method = http::Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                    .map_err(|_| ConfigError::InvalidMethod(method))?;
                Ok(MethodMatcher::new(method).boxed())
            }
            Matcher::And(matchers) => matchers
                .into_iter()
                .map(Matcher::into_matcher)
                .reduce(|acc, next| Ok(acc?.and(next?).boxed()))
                .ok_or(ConfigError::EmptyMatcherList("And"))?,
            Matcher::Or(matchers) => matchers
                .into_iter()
                .map(Matcher::into_matcher)
                .reduce(|acc, next| Ok(acc?.or(next?).boxed()))
                .ok_or(ConfigError::EmptyMatcherList("Or"))?,
            Matcher::Not(inner) => Ok(inner.into_matcher()?.not().boxed()),
        }
    }
}
