//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject bad methods and patterns before they reach a router
//! - Detect conflicting routes by registering them into a scratch tree
//! - Validate value ranges (cache capacity, log level, metrics address)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouteTableConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::RouteTableConfig;
use crate::routing::{parse_method, MatchTree, Pattern, RouteError};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("route #{index} has an empty name")]
    EmptyRouteName { index: usize },

    #[error("route '{route}' declares no methods")]
    NoMethods { route: String },

    #[error("route '{route}': {source}")]
    Route { route: String, source: RouteError },

    #[error("analyzer.cache_capacity must be > 0 when the analyzer is enabled")]
    ZeroCacheCapacity,

    #[error("invalid log level '{0}'")]
    InvalidLogLevel(String),

    #[error("invalid metrics address '{0}'")]
    InvalidMetricsAddress(String),
}

/// Check every semantic constraint, collecting all failures.
pub fn validate_config(config: &RouteTableConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut scratch: MatchTree<()> = MatchTree::new();

    for (index, route) in config.routes.iter().enumerate() {
        if route.name.trim().is_empty() {
            errors.push(ValidationError::EmptyRouteName { index });
        }
        if route.methods.is_empty() {
            errors.push(ValidationError::NoMethods {
                route: route.name.clone(),
            });
        }

        let route_error = |source| ValidationError::Route {
            route: route.name.clone(),
            source,
        };

        let pattern = match Pattern::parse(&route.pattern) {
            Ok(pattern) => pattern,
            Err(e) => {
                errors.push(route_error(e));
                continue;
            }
        };

        for method in &route.methods {
            let registered = parse_method(method).and_then(|m| scratch.insert(m, &pattern, ()));
            if let Err(e) = registered {
                errors.push(route_error(e));
            }
        }
    }

    if config.analyzer.enabled && config.analyzer.cache_capacity == 0 {
        errors.push(ValidationError::ZeroCacheCapacity);
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
