//! Registration-time error definitions.
//!
//! Traffic-time outcomes (not found, method not allowed) are ordinary
//! values carried by [`MatchOutcome`](crate::routing::MatchOutcome), never
//! errors.

use thiserror::Error;

/// Errors that can occur while registering a route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// Pattern syntax is malformed.
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: &'static str },

    /// The same parameter name appears twice in one pattern.
    #[error("Duplicate parameter name '{name}' in pattern '{pattern}'")]
    DuplicateParameterName { pattern: String, name: String },

    /// The (method, pattern) pair already has a handler.
    #[error("Route {method} {pattern} is already registered")]
    DuplicateRoute { method: String, pattern: String },

    /// Another pattern declared a different parameter name at the same position.
    #[error("Parameter '{name}' in '{pattern}' conflicts with existing parameter '{existing}'")]
    ParameterConflict {
        pattern: String,
        name: String,
        existing: String,
    },

    /// The method string is not a valid HTTP method token.
    #[error("Invalid HTTP method: {0:?}")]
    InvalidMethod(String),
}

impl RouteError {
    pub(crate) fn invalid(pattern: &str, reason: &'static str) -> Self {
        RouteError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        }
    }
}
