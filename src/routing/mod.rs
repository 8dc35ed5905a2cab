//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route registration:
//!     (method, pattern, handler)
//!     → pattern.rs (parse & validate)
//!     → tree.rs (insert, split nodes)
//!     → analyzer.rs (prefixes, categories, hot paths)
//!     → cache.rs (literal hot paths → endpoints)
//!     → snapshot.rs (tree + report + cache, immutable)
//!
//! Request lookup:
//!     (method, path)
//!     → router.rs (normalize path)
//!     → cache.rs (exact path, O(1))
//!     → tree.rs (descent with backtracking) on miss
//!     → Matched / PathNotFound / MethodNotAllowed
//! ```
//!
//! # Design Decisions
//! - Literal > parameter > wildcard at every branch
//! - The analyzer and cache are performance hints only; the tree alone
//!   decides every outcome
//! - No regex and no allocation on the lookup path beyond the owned result

pub mod analyzer;
pub mod cache;
mod children;
pub mod error;
mod node;
pub mod params;
pub mod pattern;
pub mod router;
pub mod snapshot;
pub mod stats;
pub mod tree;

pub use analyzer::{AnalysisReport, HotPath, PatternCategory, RouteAnalyzer};
pub use cache::HotPathCache;
pub use children::ChildStorage;
pub use error::RouteError;
pub use node::EndpointId;
pub use params::{OwnedParams, Param, Params};
pub use pattern::Pattern;
pub use router::{normalize_path, parse_method, RouteMatch, Router, SharedRouter};
pub use snapshot::{RouteSnapshot, RouterOptions};
pub use stats::{RouterStats, StatsSnapshot};
pub use tree::{Endpoint, Match, MatchOutcome, MatchTree, TreeStats};
