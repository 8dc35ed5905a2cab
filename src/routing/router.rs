//! Route registration and lookup facades.
//!
//! # Responsibilities
//! - Validate patterns and methods before they reach the tree
//! - Normalize request paths (query/fragment, optional trailing slash)
//! - Consult the hot-path cache, then the tree
//! - Record lookup statistics and metrics
//!
//! # Design Decisions
//! - `Router`: one snapshot behind a `parking_lot::RwLock`; inserts take the
//!   write lock and mutate in place, lookups share the read lock
//! - `SharedRouter`: immutable snapshots behind `ArcSwap`; writers serialize
//!   on the declared route list, rebuild, and publish with a single store,
//!   so readers never block and never see a half-built tree
//! - A failed registration leaves the published routes untouched

use std::sync::Arc;

use arc_swap::ArcSwap;
use http::Method;
use parking_lot::{Mutex, RwLock};

use crate::config::RouteTableConfig;
use crate::observability::metrics;
use crate::routing::analyzer::AnalysisReport;
use crate::routing::error::RouteError;
use crate::routing::params::OwnedParams;
use crate::routing::pattern::Pattern;
use crate::routing::snapshot::{RouteSnapshot, RouterOptions};
use crate::routing::stats::RouterStats;
use crate::routing::tree::{Match, MatchOutcome};

/// Owned lookup result, detached from any lock or snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch<H> {
    pub outcome: MatchOutcome,
    pub handler: Option<H>,
    pub params: OwnedParams,
    /// Pattern of the matched (or method-mismatched) endpoint.
    pub pattern: Option<String>,
    /// Methods served for the path, filled for `MethodNotAllowed` only.
    pub allowed: Vec<Method>,
}

impl<H: Clone> From<Match<'_, H>> for RouteMatch<H> {
    fn from(m: Match<'_, H>) -> Self {
        let allowed = match m.outcome() {
            MatchOutcome::MethodNotAllowed => m.allowed_methods().to_vec(),
            _ => Vec::new(),
        };
        Self {
            outcome: m.outcome(),
            handler: m.handler().cloned(),
            pattern: m.pattern().map(str::to_string),
            allowed,
            params: m.into_params().into(),
        }
    }
}

impl<H> RouteMatch<H> {
    pub fn is_matched(&self) -> bool {
        self.outcome == MatchOutcome::Matched
    }
}

/// Parse a method token; lowercase input is accepted.
pub fn parse_method(method: &str) -> Result<Method, RouteError> {
    Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| RouteError::InvalidMethod(method.to_string()))
}

/// Reduce a request path to the form patterns are matched against.
///
/// Returns `None` for paths that cannot match any pattern.
pub fn normalize_path(path: &str, ignore_trailing_slash: bool) -> Option<&str> {
    if !path.starts_with('/') {
        return None;
    }
    let path = match path.find(['?', '#']) {
        Some(end) => &path[..end],
        None => path,
    };
    if ignore_trailing_slash && path.len() > 1 {
        let trimmed = path.trim_end_matches('/');
        return Some(if trimmed.is_empty() { "/" } else { trimmed });
    }
    Some(path)
}

fn resolve<'a, H>(
    snapshot: &'a RouteSnapshot<H>,
    stats: &RouterStats,
    method: &Method,
    path: &'a str,
) -> Match<'a, H> {
    let Some(path) = normalize_path(path, snapshot.options().matching.ignore_trailing_slash) else {
        stats.record(MatchOutcome::PathNotFound, None, None);
        return Match::not_found();
    };
    let (m, cache) = snapshot.lookup_traced(method, path);
    stats.record(m.outcome(), cache, m.pattern());
    m
}

/// Router with in-place registration under a read/write lock.
#[derive(Debug)]
pub struct Router<H> {
    inner: RwLock<RouteSnapshot<H>>,
    stats: RouterStats,
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> Router<H> {
    pub fn new() -> Self {
        Self::with_options(RouterOptions::default())
    }

    pub fn with_options(options: RouterOptions) -> Self {
        let stats = RouterStats::new(options.matching.track_route_hits);
        Self {
            inner: RwLock::new(RouteSnapshot::empty(options)),
            stats,
        }
    }

    /// Register `handler` for `method` on `pattern`.
    ///
    /// The hot-path cache keeps serving its existing entries; call
    /// [`Router::optimize`] once registration is done to re-rank.
    pub fn insert(&self, method: Method, pattern: &str, handler: H) -> Result<(), RouteError> {
        let pattern = Pattern::parse(pattern)?;
        let mut snapshot = self.inner.write();
        snapshot.tree_mut().insert(method.clone(), &pattern, handler)?;
        tracing::debug!(method = %method, pattern = %pattern, "Route registered");
        metrics::record_route_count(snapshot.len());
        Ok(())
    }

    /// Like [`Router::insert`] with the method given as a string.
    pub fn route(&self, method: &str, pattern: &str, handler: H) -> Result<(), RouteError> {
        self.insert(parse_method(method)?, pattern, handler)
    }

    /// Re-run the analyzer and rebuild the hot-path cache.
    pub fn optimize(&self) {
        let mut snapshot = self.inner.write();
        snapshot.reoptimize();
        tracing::info!(
            routes = snapshot.len(),
            cached = snapshot.cache().len(),
            version = snapshot.version(),
            "Router optimized"
        );
    }

    /// Resolve without copying: `f` sees the borrowed match under the read
    /// lock.
    pub fn with_match<R>(&self, method: &Method, path: &str, f: impl FnOnce(Match<'_, H>) -> R) -> R {
        let snapshot = self.inner.read();
        f(resolve(&snapshot, &self.stats, method, path))
    }

    /// Every registered (method, pattern) pair.
    pub fn routes(&self) -> Vec<(Method, String)> {
        let snapshot = self.inner.read();
        snapshot
            .tree()
            .routes()
            .map(|(m, p)| (m.clone(), p.to_string()))
            .collect()
    }

    pub fn report(&self) -> AnalysisReport {
        self.inner.read().report().clone()
    }

    pub fn stats(&self) -> &RouterStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<H: Clone> Router<H> {
    pub fn lookup(&self, method: &Method, path: &str) -> RouteMatch<H> {
        self.with_match(method, path, |m| RouteMatch::from(m))
    }
}

#[derive(Debug, Clone)]
struct RouteEntry<H> {
    method: Method,
    pattern: Pattern,
    handler: H,
}

#[derive(Debug)]
struct WriterState<H> {
    routes: Vec<RouteEntry<H>>,
    options: RouterOptions,
}

/// Router with lock-free lookups over atomically swapped snapshots.
#[derive(Debug)]
pub struct SharedRouter<H> {
    current: ArcSwap<RouteSnapshot<H>>,
    writer: Mutex<WriterState<H>>,
    stats: RouterStats,
}

impl<H: Clone> Default for SharedRouter<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Clone> SharedRouter<H> {
    pub fn new() -> Self {
        Self::with_options(RouterOptions::default())
    }

    pub fn with_options(options: RouterOptions) -> Self {
        Self {
            current: ArcSwap::from_pointee(RouteSnapshot::empty(options.clone())),
            stats: RouterStats::new(options.matching.track_route_hits),
            writer: Mutex::new(WriterState {
                routes: Vec::new(),
                options,
            }),
        }
    }

    /// Register one route and publish a rebuilt snapshot.
    ///
    /// Every call rebuilds the tree and re-runs the analyzer over the whole
    /// route set. Load startup tables with [`SharedRouter::replace_all`].
    pub fn insert(&self, method: Method, pattern: &str, handler: H) -> Result<(), RouteError> {
        let pattern = Pattern::parse(pattern)?;
        let mut writer = self.writer.lock();

        let mut routes = writer.routes.clone();
        routes.push(RouteEntry {
            method,
            pattern,
            handler,
        });
        self.publish(&mut writer, routes, None)
    }

    /// Like [`SharedRouter::insert`] with the method given as a string.
    pub fn route(&self, method: &str, pattern: &str, handler: H) -> Result<(), RouteError> {
        self.insert(parse_method(method)?, pattern, handler)
    }

    /// Replace the whole route set in one publish. On error nothing changes.
    pub fn replace_all<I, P>(&self, routes: I) -> Result<(), RouteError>
    where
        I: IntoIterator<Item = (Method, P, H)>,
        P: AsRef<str>,
    {
        let routes = parse_entries(routes)?;
        let mut writer = self.writer.lock();
        self.publish(&mut writer, routes, None)
    }

    /// Replace routes and options together.
    ///
    /// A changed `matching.track_route_hits` takes effect on the shared
    /// [`RouterStats`]; turning it off drops the collected per-route hits.
    pub fn reconfigure<I, P>(&self, options: RouterOptions, routes: I) -> Result<(), RouteError>
    where
        I: IntoIterator<Item = (Method, P, H)>,
        P: AsRef<str>,
    {
        let routes = parse_entries(routes)?;
        let mut writer = self.writer.lock();
        self.publish(&mut writer, routes, Some(options))
    }

    fn publish(
        &self,
        writer: &mut WriterState<H>,
        routes: Vec<RouteEntry<H>>,
        options: Option<RouterOptions>,
    ) -> Result<(), RouteError> {
        let options = options.unwrap_or_else(|| writer.options.clone());
        let version = self.current.load().version() + 1;
        let snapshot = RouteSnapshot::build(
            routes
                .iter()
                .map(|r| (r.method.clone(), r.pattern.clone(), r.handler.clone())),
            options.clone(),
            version,
        )?;

        tracing::info!(
            version,
            routes = snapshot.len(),
            cached = snapshot.cache().len(),
            "Publishing route snapshot"
        );
        metrics::record_route_count(snapshot.len());
        metrics::record_snapshot_swap();

        self.current.store(Arc::new(snapshot));
        if options.matching.track_route_hits != self.stats.tracks_route_hits() {
            tracing::info!(enabled = options.matching.track_route_hits, "Per-route hit tracking switched");
            self.stats.set_route_tracking(options.matching.track_route_hits);
        }
        writer.routes = routes;
        writer.options = options;
        Ok(())
    }

    pub fn lookup(&self, method: &Method, path: &str) -> RouteMatch<H> {
        let snapshot = self.current.load();
        resolve(&snapshot, &self.stats, method, path).into()
    }

    /// Resolve without copying against the current snapshot.
    pub fn with_match<R>(&self, method: &Method, path: &str, f: impl FnOnce(Match<'_, H>) -> R) -> R {
        let snapshot = self.current.load();
        f(resolve(&snapshot, &self.stats, method, path))
    }

    /// The currently published snapshot; stays valid across later swaps.
    pub fn snapshot(&self) -> Arc<RouteSnapshot<H>> {
        self.current.load_full()
    }

    pub fn routes(&self) -> Vec<(Method, String)> {
        self.writer
            .lock()
            .routes
            .iter()
            .map(|r| (r.method.clone(), r.pattern.to_string()))
            .collect()
    }

    pub fn version(&self) -> u64 {
        self.current.load().version()
    }

    pub fn stats(&self) -> &RouterStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SharedRouter<String> {
    /// Build a router whose handlers are the configured route names.
    pub fn from_config(config: &RouteTableConfig) -> Result<Self, RouteError> {
        let router = Self::with_options(RouterOptions::from(config));
        router.reload(config)?;
        Ok(router)
    }

    /// Swap in the routes and options of a freshly loaded config.
    pub fn reload(&self, config: &RouteTableConfig) -> Result<(), RouteError> {
        self.reconfigure(RouterOptions::from(config), table_routes(config)?)
    }
}

/// Expand config routes into (method, pattern, name) triples.
pub fn table_routes(config: &RouteTableConfig) -> Result<Vec<(Method, String, String)>, RouteError> {
    let mut routes = Vec::new();
    for route in &config.routes {
        for method in &route.methods {
            routes.push((parse_method(method)?, route.pattern.clone(), route.name.clone()));
        }
    }
    Ok(routes)
}

fn parse_entries<I, P, H>(routes: I) -> Result<Vec<RouteEntry<H>>, RouteError>
where
    I: IntoIterator<Item = (Method, P, H)>,
    P: AsRef<str>,
{
    routes
        .into_iter()
        .map(|(method, pattern, handler)| {
            Ok(RouteEntry {
                method,
                pattern: Pattern::parse(pattern.as_ref())?,
                handler,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnalyzerConfig, MatchingConfig};

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/users?id=1", false), Some("/users"));
        assert_eq!(normalize_path("/users#top", false), Some("/users"));
        assert_eq!(normalize_path("/users/", false), Some("/users/"));
        assert_eq!(normalize_path("/users//", true), Some("/users"));
        assert_eq!(normalize_path("/", true), Some("/"));
        assert_eq!(normalize_path("//", true), Some("/"));
        assert_eq!(normalize_path("users", false), None);
        assert_eq!(normalize_path("", false), None);
    }

    #[test]
    fn test_parse_method() {
        assert_eq!(parse_method("get").unwrap(), Method::GET);
        assert_eq!(parse_method("PATCH").unwrap(), Method::PATCH);
        assert_eq!(parse_method("").unwrap_err(), RouteError::InvalidMethod(String::new()));
        assert!(parse_method("GE T").is_err());
    }

    #[test]
    fn test_router_insert_and_lookup() {
        let router = Router::new();
        router.insert(Method::GET, "/users/:id", 1).unwrap();
        router.route("post", "/users", 2).unwrap();

        let m = router.lookup(&Method::GET, "/users/42?expand=true");
        assert!(m.is_matched());
        assert_eq!(m.handler, Some(1));
        assert_eq!(m.params.get("id"), Some("42"));
        assert_eq!(m.pattern.as_deref(), Some("/users/:id"));

        let m = router.lookup(&Method::GET, "/users");
        assert_eq!(m.outcome, MatchOutcome::MethodNotAllowed);
        assert_eq!(m.allowed, vec![Method::POST]);

        assert_eq!(router.len(), 2);
        assert_eq!(router.stats().snapshot().lookups, 2);
    }

    #[test]
    fn test_router_optimize_fills_cache() {
        let router = Router::new();
        router.insert(Method::GET, "/health", "health").unwrap();
        router.insert(Method::GET, "/users/:id", "user").unwrap();
        assert!(router.report().hot_paths.is_empty());

        router.optimize();
        assert_eq!(router.report().hot_paths.len(), 2);

        let m = router.lookup(&Method::GET, "/health");
        assert_eq!(m.handler, Some("health"));
        let snap = router.stats().snapshot();
        assert_eq!(snap.cache_hits, 1);
    }

    #[test]
    fn test_router_trailing_slash_option() {
        let router = Router::with_options(RouterOptions {
            matching: MatchingConfig {
                ignore_trailing_slash: true,
                ..MatchingConfig::default()
            },
            ..RouterOptions::default()
        });
        router.insert(Method::GET, "/users", ()).unwrap();
        assert!(router.lookup(&Method::GET, "/users/").is_matched());

        let strict = Router::new();
        strict.insert(Method::GET, "/users", ()).unwrap();
        assert_eq!(strict.lookup(&Method::GET, "/users/").outcome, MatchOutcome::PathNotFound);
    }

    #[test]
    fn test_router_rejects_bad_input() {
        let router: Router<()> = Router::new();
        assert!(matches!(
            router.insert(Method::GET, "users", ()),
            Err(RouteError::InvalidPattern { .. })
        ));
        assert!(matches!(
            router.route("BAD METHOD", "/users", ()),
            Err(RouteError::InvalidMethod(_))
        ));
        assert!(router.is_empty());
    }

    #[test]
    fn test_shared_router_publishes_versions() {
        let router = SharedRouter::new();
        assert_eq!(router.version(), 0);

        router.insert(Method::GET, "/a", "a".to_string()).unwrap();
        router.insert(Method::GET, "/b/:id", "b".to_string()).unwrap();
        assert_eq!(router.version(), 2);
        assert_eq!(router.len(), 2);

        let m = router.lookup(&Method::GET, "/b/9");
        assert_eq!(m.handler.as_deref(), Some("b"));
        assert_eq!(m.params.get("id"), Some("9"));
    }

    #[test]
    fn test_shared_router_failed_insert_keeps_snapshot() {
        let router = SharedRouter::new();
        router.insert(Method::GET, "/a/:id", 1).unwrap();
        let before = router.snapshot();

        let err = router.insert(Method::GET, "/a/:id", 2).unwrap_err();
        assert!(matches!(err, RouteError::DuplicateRoute { .. }));
        assert!(Arc::ptr_eq(&before, &router.snapshot()));
        assert_eq!(router.lookup(&Method::GET, "/a/1").handler, Some(1));
        assert_eq!(router.routes().len(), 1);
    }

    #[test]
    fn test_shared_router_replace_all() {
        let router = SharedRouter::new();
        router.insert(Method::GET, "/old", "old").unwrap();

        router
            .replace_all(vec![(Method::GET, "/new", "new"), (Method::PUT, "/new", "put")])
            .unwrap();

        assert_eq!(router.lookup(&Method::GET, "/old").outcome, MatchOutcome::PathNotFound);
        assert_eq!(router.lookup(&Method::PUT, "/new").handler, Some("put"));
        assert_eq!(router.len(), 2);

        let err = router.replace_all(vec![(Method::GET, "/x//y", "bad")]).unwrap_err();
        assert!(matches!(err, RouteError::InvalidPattern { .. }));
        assert_eq!(router.len(), 2);
    }

    #[test]
    fn test_old_snapshot_survives_swap() {
        let router = SharedRouter::new();
        router.insert(Method::GET, "/v1", 1).unwrap();
        let old = router.snapshot();

        router.replace_all(vec![(Method::GET, "/v2", 2)]).unwrap();

        assert_eq!(old.lookup(&Method::GET, "/v1").handler(), Some(&1));
        assert_eq!(router.lookup(&Method::GET, "/v1").outcome, MatchOutcome::PathNotFound);
    }

    #[test]
    fn test_shared_router_from_config() {
        let config: RouteTableConfig = toml::from_str(
            r#"
            [analyzer]
            cache_capacity = 4

            [[routes]]
            name = "list-users"
            pattern = "/api/users"

            [[routes]]
            name = "user"
            methods = ["GET", "DELETE"]
            pattern = "/api/users/:id"
            "#,
        )
        .unwrap();

        let router = SharedRouter::from_config(&config).unwrap();
        assert_eq!(router.len(), 3);
        assert_eq!(router.snapshot().options().analyzer.cache_capacity, 4);
        assert_eq!(
            router.lookup(&Method::DELETE, "/api/users/5").handler.as_deref(),
            Some("user")
        );

        let mut updated = config.clone();
        updated.analyzer = AnalyzerConfig {
            enabled: false,
            ..AnalyzerConfig::default()
        };
        updated.routes.truncate(1);
        router.reload(&updated).unwrap();
        assert_eq!(router.len(), 1);
        assert!(router.snapshot().cache().is_empty());
    }

    #[test]
    fn test_reload_switches_route_hit_tracking() {
        let mut config: RouteTableConfig = toml::from_str(
            r#"
            [[routes]]
            name = "health"
            pattern = "/health"
            "#,
        )
        .unwrap();
        let router = SharedRouter::from_config(&config).unwrap();
        router.lookup(&Method::GET, "/health");
        assert!(router.stats().top_routes(1).is_empty());

        config.matching = MatchingConfig {
            track_route_hits: true,
            ..MatchingConfig::default()
        };
        router.reload(&config).unwrap();
        router.lookup(&Method::GET, "/health");
        assert_eq!(router.stats().top_routes(1), vec![("/health".to_string(), 1)]);

        config.matching.track_route_hits = false;
        router.reload(&config).unwrap();
        assert!(!router.stats().tracks_route_hits());
        assert!(router.stats().top_routes(1).is_empty());
    }
}
