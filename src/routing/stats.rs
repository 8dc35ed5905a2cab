//! Per-router lookup statistics.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use dashmap::DashMap;
use serde::Serialize;

use crate::observability::metrics;
use crate::routing::tree::MatchOutcome;

/// Lookup counters shared by all readers of one router.
#[derive(Debug, Default)]
pub struct RouterStats {
    lookups: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    not_found: AtomicU64,
    method_not_allowed: AtomicU64,
    track_route_hits: AtomicBool,
    /// Pattern → hits, filled only while per-route tracking is on.
    route_hits: DashMap<String, u64>,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub lookups: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub not_found: u64,
    pub method_not_allowed: u64,
    /// Hits over cache lookups, 0.0 when the cache was never consulted.
    pub hit_rate: f64,
}

impl RouterStats {
    pub fn new(track_route_hits: bool) -> Self {
        Self {
            track_route_hits: AtomicBool::new(track_route_hits),
            ..Self::default()
        }
    }

    pub fn tracks_route_hits(&self) -> bool {
        self.track_route_hits.load(Ordering::Relaxed)
    }

    /// Switch per-route tracking; turning it off drops the collected hits.
    pub fn set_route_tracking(&self, enabled: bool) {
        let was = self.track_route_hits.swap(enabled, Ordering::Relaxed);
        if was && !enabled {
            self.route_hits.clear();
        }
    }

    /// Record one lookup. `cache` is `None` when no cache was consulted.
    pub fn record(&self, outcome: MatchOutcome, cache: Option<bool>, pattern: Option<&str>) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        match outcome {
            MatchOutcome::Matched => {
                if let Some(pattern) = pattern.filter(|_| self.tracks_route_hits()) {
                    let bumped = self.route_hits.get_mut(pattern).map(|mut n| *n += 1).is_some();
                    if !bumped {
                        *self.route_hits.entry(pattern.to_string()).or_insert(0) += 1;
                    }
                }
            }
            MatchOutcome::PathNotFound => {
                self.not_found.fetch_add(1, Ordering::Relaxed);
            }
            MatchOutcome::MethodNotAllowed => {
                self.method_not_allowed.fetch_add(1, Ordering::Relaxed);
            }
        }
        if let Some(hit) = cache {
            let counter = if hit { &self.cache_hits } else { &self.cache_misses };
            counter.fetch_add(1, Ordering::Relaxed);
            metrics::record_hot_cache(hit);
        }
        metrics::record_lookup(outcome);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let cache_hits = self.cache_hits.load(Ordering::Relaxed);
        let cache_misses = self.cache_misses.load(Ordering::Relaxed);
        let consulted = cache_hits + cache_misses;
        StatsSnapshot {
            lookups: self.lookups.load(Ordering::Relaxed),
            cache_hits,
            cache_misses,
            not_found: self.not_found.load(Ordering::Relaxed),
            method_not_allowed: self.method_not_allowed.load(Ordering::Relaxed),
            hit_rate: if consulted == 0 {
                0.0
            } else {
                cache_hits as f64 / consulted as f64
            },
        }
    }

    /// The `n` most matched patterns, hits descending then pattern.
    /// Empty unless per-route tracking is on.
    pub fn top_routes(&self, n: usize) -> Vec<(String, u64)> {
        let mut ranked: Vec<(String, u64)> = self
            .route_hits
            .iter()
            .map(|r| (r.key().clone(), *r.value()))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }

    pub fn reset(&self) {
        for counter in [
            &self.lookups,
            &self.cache_hits,
            &self.cache_misses,
            &self.not_found,
            &self.method_not_allowed,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        self.route_hits.clear();
    }
}
