//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! routing (lookups, snapshot publishes)
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → stdout (tracing fmt layer)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Log level from config, overridable through the environment
//! - Metrics are cheap (atomic increments) and no-ops until a recorder is
//!   installed
//! - Per-router counters live in `routing::stats` so tests can read them
//!   without a global recorder

pub mod logging;
pub mod metrics;
