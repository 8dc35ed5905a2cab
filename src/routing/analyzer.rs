//! Build-time route analysis.
//!
//! # Responsibilities
//! - Tally common literal prefixes across the route set
//! - Classify each route by REST shape
//! - Score routes by expected access frequency and rank the hot ones
//!
//! # Design Decisions
//! - Runs once per snapshot build, never on the request path
//! - Output is advisory: only the hot-path list feeds the cache, and the
//!   cache re-validates every entry against the tree
//! - Wildcards count as parameters for classification and scoring

use std::collections::HashMap;

use http::Method;
use serde::Serialize;

use crate::config::AnalyzerConfig;
use crate::routing::pattern::Pattern;

/// REST shape of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternCategory {
    /// No parameters, shallow (`/api/users`).
    Collection,
    /// Parameterized, shallow (`/api/users/:id`).
    Resource,
    /// Deeper than four segments.
    NestedResource,
    /// Anything else (`/api/v1/users/export`).
    Action,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrefixCount {
    pub prefix: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteProfile {
    pub method: String,
    pub pattern: String,
    pub category: PatternCategory,
    pub score: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HotPath {
    pub method: String,
    pub pattern: String,
    pub score: i32,
}

/// Everything the analyzer learned about one route set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    /// Most frequent common prefixes, count descending.
    pub prefixes: Vec<PrefixCount>,
    /// One entry per route, registration order.
    pub routes: Vec<RouteProfile>,
    /// Routes at or above the threshold, score descending, uncapped.
    pub hot_paths: Vec<HotPath>,
}

impl AnalysisReport {
    pub fn category_counts(&self) -> HashMap<PatternCategory, usize> {
        let mut counts = HashMap::new();
        for route in &self.routes {
            *counts.entry(route.category).or_default() += 1;
        }
        counts
    }
}

/// Route set analyzer.
#[derive(Debug, Clone, Default)]
pub struct RouteAnalyzer {
    config: AnalyzerConfig,
}

impl RouteAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze `routes`, given in registration order.
    pub fn analyze<'a, I>(&self, routes: I) -> AnalysisReport
    where
        I: IntoIterator<Item = (&'a Method, &'a Pattern)>,
    {
        let routes: Vec<(&Method, &Pattern)> = routes.into_iter().collect();

        let profiles: Vec<RouteProfile> = routes
            .iter()
            .map(|(method, pattern)| RouteProfile {
                method: method.to_string(),
                pattern: pattern.to_string(),
                category: classify(pattern),
                score: access_score(method, pattern),
            })
            .collect();

        let mut hot: Vec<&RouteProfile> = profiles
            .iter()
            .filter(|p| p.score >= self.config.hot_path_threshold)
            .collect();
        // Stable sort keeps registration order among equal scores.
        hot.sort_by(|a, b| b.score.cmp(&a.score));
        // Uncapped; capacity applies to admitted cache entries only.
        let hot_paths = hot
            .into_iter()
            .map(|p| HotPath {
                method: p.method.clone(),
                pattern: p.pattern.clone(),
                score: p.score,
            })
            .collect();

        let patterns: Vec<&str> = routes.iter().map(|(_, p)| p.as_str()).collect();
        let prefixes = top_prefixes(&patterns, self.config.min_prefix_len, self.config.top_prefixes);

        AnalysisReport {
            prefixes,
            routes: profiles,
            hot_paths,
        }
    }
}

/// Classify a pattern by depth (`/` count) and parameter presence.
pub fn classify(pattern: &Pattern) -> PatternCategory {
    let depth = pattern.depth();
    let has_params = pattern.param_count() > 0;

    if !has_params && depth <= 3 {
        PatternCategory::Collection
    } else if has_params && depth <= 4 {
        PatternCategory::Resource
    } else if depth > 4 {
        PatternCategory::NestedResource
    } else {
        PatternCategory::Action
    }
}

/// Heuristic access likelihood; higher means hotter.
pub fn access_score(method: &Method, pattern: &Pattern) -> i32 {
    let depth = pattern.depth() as i32;
    let has_params = pattern.param_count() > 0;

    let mut score = 100 - 10 * depth;
    if !has_params {
        score += 20;
    }
    if *method == Method::GET {
        score += 15;
    }
    if has_params {
        score -= 5;
    }
    score
}

fn top_prefixes(patterns: &[&str], min_len: usize, top: usize) -> Vec<PrefixCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for (i, a) in patterns.iter().enumerate() {
        for b in &patterns[i + 1..] {
            let prefix = longest_common_prefix(a, b);
            if prefix.len() >= min_len {
                *counts.entry(prefix).or_default() += 1;
            }
        }
    }

    let mut ranked: Vec<PrefixCount> = counts
        .into_iter()
        .map(|(prefix, count)| PrefixCount {
            prefix: prefix.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.prefix.cmp(&b.prefix)));
    ranked.truncate(top);
    ranked
}

fn longest_common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let mut n = a
        .bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x == y)
        .count();
    while !a.is_char_boundary(n) {
        n -= 1;
    }
    &a[..n]
}
