//! Hot-path cache.
//!
//! Exact request path → pre-resolved endpoint, populated from the analyzer's
//! hot-path list after the tree is built. Only fully literal patterns are
//! admitted, and only once the tree resolves them through literal edges, so
//! a cached endpoint is always the one a full traversal would reach first.

use hashbrown::HashMap;

use crate::routing::analyzer::HotPath;
use crate::routing::node::EndpointId;
use crate::routing::pattern::Pattern;
use crate::routing::tree::MatchTree;

#[derive(Debug, Clone, Default)]
pub struct HotPathCache {
    entries: HashMap<Box<str>, EndpointId>,
    capacity: usize,
}

impl HotPathCache {
    /// Populate from `hot_paths` in rank order, stopping at `capacity`.
    pub fn build<H>(tree: &MatchTree<H>, hot_paths: &[HotPath], capacity: usize) -> Self {
        let mut entries = HashMap::with_capacity(capacity.min(hot_paths.len()));

        for hot in hot_paths {
            if entries.len() >= capacity {
                break;
            }
            if entries.contains_key(hot.pattern.as_str()) {
                continue;
            }
            let literal = Pattern::parse(&hot.pattern).map(|p| p.is_literal()).unwrap_or(false);
            if !literal {
                tracing::debug!(pattern = %hot.pattern, "hot path has parameters, not cached");
                continue;
            }
            match tree.resolve_literal(&hot.pattern) {
                Some(id) => {
                    entries.insert(hot.pattern.clone().into_boxed_str(), id);
                }
                None => {
                    tracing::debug!(pattern = %hot.pattern, "hot path does not resolve, not cached");
                }
            }
        }

        Self { entries, capacity }
    }

    #[inline]
    pub fn get(&self, path: &str) -> Option<EndpointId> {
        self.entries.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Cached paths, unordered.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| &**k)
    }
}
