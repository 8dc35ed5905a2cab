//! Shared utilities for integration tests.

use std::io::Write;

use http::Method;
use pact_router::routing::{Router, SharedRouter};
use tempfile::NamedTempFile;

/// A REST-ish route set exercising literals, params and wildcards.
#[allow(dead_code)]
pub const API_ROUTES: &[(&str, &str)] = &[
    ("GET", "/"),
    ("GET", "/health"),
    ("GET", "/api/v1/users"),
    ("POST", "/api/v1/users"),
    ("GET", "/api/v1/users/:id"),
    ("PUT", "/api/v1/users/:id"),
    ("DELETE", "/api/v1/users/:id"),
    ("GET", "/api/v1/users/:id/posts"),
    ("GET", "/api/v1/users/:id/posts/:post_id"),
    ("GET", "/api/v1/users/export"),
    ("GET", "/api/v1/posts"),
    ("GET", "/api/v1/posts/:id/comments"),
    ("GET", "/static/*path"),
    ("GET", "/files/*"),
];

#[allow(dead_code)]
pub fn method(name: &str) -> Method {
    Method::from_bytes(name.as_bytes()).unwrap()
}

/// Handler value used by the helpers: "METHOD pattern".
#[allow(dead_code)]
pub fn handler_for(method: &str, pattern: &str) -> String {
    format!("{method} {pattern}")
}

/// Router over `routes`, optimized so the hot-path cache is populated.
#[allow(dead_code)]
pub fn router_with(routes: &[(&str, &str)]) -> Router<String> {
    let router = Router::new();
    for (m, p) in routes {
        router.insert(method(m), p, handler_for(m, p)).unwrap();
    }
    router.optimize();
    router
}

#[allow(dead_code)]
pub fn shared_router_with(routes: &[(&str, &str)]) -> SharedRouter<String> {
    let router = SharedRouter::new();
    router
        .replace_all(routes.iter().map(|(m, p)| (method(m), *p, handler_for(m, p))))
        .unwrap();
    router
}

/// Write `content` to a fresh temp file that lives as long as the handle.
#[allow(dead_code)]
pub fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}
