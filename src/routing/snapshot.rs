//! Immutable, fully built routing state.
//!
//! A snapshot bundles the tree, the analyzer report and the hot-path cache
//! derived from that exact tree, plus the options it was built with. Readers
//! always see these parts consistently because they are only ever replaced
//! together.

use http::Method;

use crate::config::{AnalyzerConfig, MatchingConfig, RouteTableConfig};
use crate::routing::analyzer::{AnalysisReport, RouteAnalyzer};
use crate::routing::cache::HotPathCache;
use crate::routing::error::RouteError;
use crate::routing::params::Params;
use crate::routing::pattern::Pattern;
use crate::routing::tree::{Match, MatchTree};

/// Build and lookup options shared by both router flavours.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouterOptions {
    pub analyzer: AnalyzerConfig,
    pub matching: MatchingConfig,
}

impl From<&RouteTableConfig> for RouterOptions {
    fn from(config: &RouteTableConfig) -> Self {
        Self {
            analyzer: config.analyzer.clone(),
            matching: config.matching.clone(),
        }
    }
}

#[derive(Debug)]
pub struct RouteSnapshot<H> {
    tree: MatchTree<H>,
    cache: HotPathCache,
    report: AnalysisReport,
    options: RouterOptions,
    version: u64,
}

impl<H> RouteSnapshot<H> {
    pub fn empty(options: RouterOptions) -> Self {
        Self::optimized(MatchTree::new(), options, 0)
    }

    /// Insert every route, then analyze and populate the cache.
    pub fn build<I>(routes: I, options: RouterOptions, version: u64) -> Result<Self, RouteError>
    where
        I: IntoIterator<Item = (Method, Pattern, H)>,
    {
        let mut tree = MatchTree::new();
        for (method, pattern, handler) in routes {
            tree.insert(method, &pattern, handler)?;
        }
        Ok(Self::optimized(tree, options, version))
    }

    pub(crate) fn optimized(tree: MatchTree<H>, options: RouterOptions, version: u64) -> Self {
        let (report, cache) = if options.analyzer.enabled {
            let analyzer = RouteAnalyzer::new(options.analyzer.clone());
            let report = analyzer.analyze(tree.routes());
            let cache = HotPathCache::build(&tree, &report.hot_paths, options.analyzer.cache_capacity);
            (report, cache)
        } else {
            (AnalysisReport::default(), HotPathCache::default())
        };

        tracing::debug!(
            version,
            routes = tree.len(),
            hot_paths = report.hot_paths.len(),
            cached = cache.len(),
            "Route snapshot built"
        );

        Self {
            tree,
            cache,
            report,
            options,
            version,
        }
    }

    /// Re-run analysis over the current tree.
    pub(crate) fn reoptimize(&mut self) {
        let tree = std::mem::take(&mut self.tree);
        let options = self.options.clone();
        *self = Self::optimized(tree, options, self.version + 1);
    }

    pub(crate) fn tree_mut(&mut self) -> &mut MatchTree<H> {
        &mut self.tree
    }

    /// Cache first, tree on miss. Path must already be normalized.
    pub fn lookup<'a>(&'a self, method: &Method, path: &'a str) -> Match<'a, H> {
        self.lookup_traced(method, path).0
    }

    /// Like `lookup`, also reporting the cache result (`None` when the cache
    /// is empty).
    pub(crate) fn lookup_traced<'a>(&'a self, method: &Method, path: &'a str) -> (Match<'a, H>, Option<bool>) {
        if self.cache.is_empty() {
            return (self.tree.lookup(method, path), None);
        }

        if let Some(id) = self.cache.get(path) {
            let endpoint = self.tree.endpoint(id);
            if let Some(handler) = endpoint.get(method) {
                return (Match::matched(endpoint, handler, Params::new()), Some(true));
            }
        }
        (self.tree.lookup(method, path), Some(false))
    }

    pub fn tree(&self) -> &MatchTree<H> {
        &self.tree
    }

    pub fn cache(&self) -> &HotPathCache {
        &self.cache
    }

    pub fn report(&self) -> &AnalysisReport {
        &self.report
    }

    pub fn options(&self) -> &RouterOptions {
        &self.options
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}
