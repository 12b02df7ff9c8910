use std::fmt;

use http::Method;
use marquee_core::{BoxMatcher, FetchRequest, RequestMatcher};
use smol_str::SmolStr;
use tracing::debug;

use super::{CacheableResponse, RuntimeCache, Strategy};

/// One entry of the strategy table.
pub struct Rule {
    name: SmolStr,
    matcher: BoxMatcher,
    strategy: Strategy,
    cacheable: CacheableResponse,
}

impl Rule {
    /// A rule storing only `200` responses.
    pub fn new<M>(name: impl Into<SmolStr>, matcher: M, strategy: Strategy) -> Self
    where
        M: RequestMatcher + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            matcher: Box::new(matcher),
            strategy,
            cacheable: CacheableResponse::default(),
        }
    }

    /// Replaces the cacheable response filter.
    pub fn cacheable(mut self, cacheable: CacheableResponse) -> Self {
        self.cacheable = cacheable;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn cacheable_response(&self) -> &CacheableResponse {
        &self.cacheable
    }

    pub fn matches(&self, request: &FetchRequest) -> bool {
        self.matcher.matches(request)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("strategy", &self.strategy)
            .field("cacheable", &self.cacheable)
            .finish_non_exhaustive()
    }
}

/// The offline application shell served to every navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppShell {
    url: String,
}

impl AppShell {
    /// The precached document at `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Where a request goes.
#[derive(Debug, Clone, Copy)]
pub enum Route<'a> {
    /// A navigation, answered with the application shell.
    AppShell(&'a AppShell),
    /// The first rule matching the request.
    Rule(&'a Rule),
    /// No rule applies; the network answers untouched.
    Passthrough,
}

/// Ordered rules plus the navigation fallback.
///
/// ```
/// use std::time::Duration;
/// use marquee::strategy::{Route, RuntimeCache, Rule, Strategy, StrategyTable};
/// use marquee_core::{FetchRequest, Host};
///
/// let table = StrategyTable::builder()
///     .app_shell("/index.html")
///     .rule(Rule::new(
///         "metadata",
///         Host::new("api.themoviedb.org"),
///         Strategy::StaleWhileRevalidate(
///             RuntimeCache::new("tmdb-api", 1)
///                 .with_max_entries(500)
///                 .with_max_age(Duration::from_secs(7 * 24 * 3600)),
///         ),
///     ))
///     .build();
///
/// let navigation = FetchRequest::navigate("https://marquee.app/movie/42".parse()?);
/// assert!(matches!(table.route(&navigation), Route::AppShell(_)));
/// # Ok::<(), http::uri::InvalidUri>(())
/// ```
#[derive(Debug)]
pub struct StrategyTable {
    shell: AppShell,
    rules: Vec<Rule>,
}

impl StrategyTable {
    /// Starts a table without an application shell.
    pub fn builder() -> StrategyTableBuilder<NoShell> {
        StrategyTableBuilder {
            shell: NoShell,
            rules: Vec::new(),
        }
    }

    pub fn app_shell(&self) -> &AppShell {
        &self.shell
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Runtime namespaces declared by the rules, in declaration order.
    pub fn runtime_caches(&self) -> impl Iterator<Item = &RuntimeCache> {
        self.rules
            .iter()
            .filter_map(|rule| rule.strategy.runtime_cache())
    }

    /// Picks the route of `request`.
    ///
    /// Navigations always get the shell. Non-`GET` requests pass through.
    /// Otherwise the first matching rule wins.
    pub fn route(&self, request: &FetchRequest) -> Route<'_> {
        if request.is_navigation() {
            return Route::AppShell(&self.shell);
        }
        if request.method() != Method::GET {
            return Route::Passthrough;
        }
        match self.rules.iter().find(|rule| rule.matches(request)) {
            Some(rule) => {
                debug!(rule = %rule.name, uri = %request.uri(), "request matched rule");
                Route::Rule(rule)
            }
            None => Route::Passthrough,
        }
    }
}

/// Marker for a builder whose application shell is not set yet.
///
/// When you see `NoShell` in a compiler error, call
/// [`app_shell`](StrategyTableBuilder::app_shell) before `build`.
#[derive(Debug, Clone, Copy)]
pub struct NoShell;

/// Builder for [`StrategyTable`].
#[derive(Debug)]
pub struct StrategyTableBuilder<S> {
    shell: S,
    rules: Vec<Rule>,
}

impl<S> StrategyTableBuilder<S> {
    /// Sets the application shell served to navigations.
    pub fn app_shell(self, url: impl Into<String>) -> StrategyTableBuilder<AppShell> {
        StrategyTableBuilder {
            shell: AppShell::new(url),
            rules: self.rules,
        }
    }

    /// Appends a rule. Earlier rules take precedence.
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }
}

impl StrategyTableBuilder<AppShell> {
    pub fn build(self) -> StrategyTable {
        StrategyTable {
            shell: self.shell,
            rules: self.rules,
        }
    }
}
