//! Configuration schema definitions.
//!
//! This module defines the route table file format. All types derive Serde
//! traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration: the declared routes plus engine tuning.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct RouteTableConfig {
    /// Route declarations, in registration order.
    pub routes: Vec<RouteConfig>,

    /// Build-time analysis and hot-path cache settings.
    pub analyzer: AnalyzerConfig,

    /// Request path handling.
    pub matching: MatchingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// One pattern served for one or more methods.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RouteConfig {
    /// Route identifier, used as the handler value by the CLI.
    pub name: String,

    /// HTTP methods (e.g. `["GET", "HEAD"]`).
    #[serde(default = "default_methods")]
    pub methods: Vec<String>,

    /// Route pattern (e.g. `/users/:id`).
    pub pattern: String,
}

fn default_methods() -> Vec<String> {
    vec!["GET".to_string()]
}

/// Route analyzer settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Run the analyzer and populate the hot-path cache.
    pub enabled: bool,

    /// Minimum access score for a route to count as hot.
    pub hot_path_threshold: i32,

    /// Maximum hot-path cache entries.
    pub cache_capacity: usize,

    /// Shortest common prefix worth reporting.
    pub min_prefix_len: usize,

    /// Number of common prefixes reported.
    pub top_prefixes: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            hot_path_threshold: 70,
            cache_capacity: 32,
            min_prefix_len: 4,
            top_prefixes: 3,
        }
    }
}

/// Request path handling.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct MatchingConfig {
    /// Treat `/users/` like `/users`.
    pub ignore_trailing_slash: bool,

    /// Count hits per matched pattern.
    pub track_route_hits: bool,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: RouteTableConfig = toml::from_str(
            r#"
            [[routes]]
            name = "users"
            pattern = "/users"
            "#,
        )
        .unwrap();

        assert_eq!(config.routes.len(), 1);
        assert_eq!(config.routes[0].methods, vec!["GET"]);
        assert_eq!(config.analyzer, AnalyzerConfig::default());
        assert!(!config.matching.ignore_trailing_slash);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_full_config() {
        let config: RouteTableConfig = toml::from_str(
            r#"
            [analyzer]
            hot_path_threshold = 80
            cache_capacity = 8

            [matching]
            ignore_trailing_slash = true

            [[routes]]
            name = "user"
            methods = ["GET", "PUT"]
            pattern = "/users/:id"
            "#,
        )
        .unwrap();

        assert_eq!(config.analyzer.hot_path_threshold, 80);
        assert_eq!(config.analyzer.cache_capacity, 8);
        assert_eq!(config.analyzer.min_prefix_len, 4);
        assert!(config.matching.ignore_trailing_slash);
        assert_eq!(config.routes[0].methods, vec!["GET", "PUT"]);
    }
}
