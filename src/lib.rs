//! HTTP route matching engine.
//!
//! A compressed prefix tree over method+path patterns with named parameters
//! and trailing wildcards, plus a build-time analyzer that pre-resolves hot
//! literal paths into an O(1) cache.

pub mod config;
pub mod observability;
pub mod routing;

pub use config::schema::RouteTableConfig;
pub use routing::{MatchOutcome, RouteError, RouteMatch, Router, SharedRouter};
