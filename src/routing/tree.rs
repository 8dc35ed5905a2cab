//! Matching tree.
//!
//! # Responsibilities
//! - Insert (method, pattern, handler) with node splitting
//! - Resolve (method, path) to a handler and captured parameters
//! - Distinguish "no pattern matched" from "pattern matched, method did not"
//!
//! # Design Decisions
//! - Handler tables live in an endpoint arena; nodes refer to them by index,
//!   so splitting a node never invalidates an endpoint reference
//! - Literal > parameter > wildcard at every branch, with backtracking when
//!   a preferred branch dead-ends deeper down
//! - A path that reaches an endpoint lacking the method is only a 405
//!   candidate; a lower-priority branch serving the method still wins

use std::collections::HashMap;

use http::Method;
use serde::Serialize;
use smallvec::SmallVec;

use crate::routing::children::ChildStorage;
use crate::routing::error::RouteError;
use crate::routing::node::{common_prefix, EndpointId, Node};
use crate::routing::params::Params;
use crate::routing::pattern::{Pattern, Token};

/// Result classification of a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    Matched,
    PathNotFound,
    MethodNotAllowed,
}

impl MatchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchOutcome::Matched => "matched",
            MatchOutcome::PathNotFound => "path_not_found",
            MatchOutcome::MethodNotAllowed => "method_not_allowed",
        }
    }
}

/// Per-method handler table of one tree position.
#[derive(Debug)]
pub struct Endpoint<H> {
    pattern: Pattern,
    handlers: SmallVec<[(Method, H); 4]>,
}

impl<H> Endpoint<H> {
    fn new(pattern: Pattern) -> Self {
        Self {
            pattern,
            handlers: SmallVec::new(),
        }
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    #[inline]
    pub fn get(&self, method: &Method) -> Option<&H> {
        self.handlers.iter().find(|(m, _)| m == method).map(|(_, h)| h)
    }

    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.handlers.iter().map(|(m, _)| m)
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Outcome of a lookup, borrowing from the tree and the request path.
#[derive(Debug)]
pub struct Match<'a, H> {
    outcome: MatchOutcome,
    endpoint: Option<&'a Endpoint<H>>,
    handler: Option<&'a H>,
    params: Params<'a>,
    allowed: Vec<Method>,
}

impl<'a, H> Match<'a, H> {
    pub(crate) fn matched(endpoint: &'a Endpoint<H>, handler: &'a H, params: Params<'a>) -> Self {
        Self {
            outcome: MatchOutcome::Matched,
            endpoint: Some(endpoint),
            handler: Some(handler),
            params,
            allowed: Vec::new(),
        }
    }

    pub(crate) fn method_not_allowed(endpoint: &'a Endpoint<H>, allowed: Vec<Method>) -> Self {
        Self {
            outcome: MatchOutcome::MethodNotAllowed,
            endpoint: Some(endpoint),
            handler: None,
            params: Params::new(),
            allowed,
        }
    }

    pub(crate) fn not_found() -> Self {
        Self {
            outcome: MatchOutcome::PathNotFound,
            endpoint: None,
            handler: None,
            params: Params::new(),
            allowed: Vec::new(),
        }
    }

    pub fn outcome(&self) -> MatchOutcome {
        self.outcome
    }

    pub fn handler(&self) -> Option<&'a H> {
        self.handler
    }

    pub fn params(&self) -> &Params<'a> {
        &self.params
    }

    pub fn into_params(self) -> Params<'a> {
        self.params
    }

    /// Pattern of the resolved endpoint (matched or method-mismatched).
    pub fn pattern(&self) -> Option<&'a str> {
        self.endpoint.map(|e| e.pattern().as_str())
    }

    /// Every method served for the requested path, across all patterns
    /// that fully match it, for an `Allow` header. Empty unless the outcome
    /// is `MethodNotAllowed`.
    pub fn allowed_methods(&self) -> &[Method] {
        &self.allowed
    }
}

/// Structural statistics of a tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TreeStats {
    pub nodes: usize,
    pub endpoints: usize,
    pub routes: usize,
    /// Nodes with literal children, by storage strategy.
    pub child_storage: HashMap<ChildStorage, usize>,
}

/// Compressed prefix tree over route patterns.
#[derive(Debug)]
pub struct MatchTree<H> {
    root: Node,
    endpoints: Vec<Endpoint<H>>,
    routes: usize,
}

impl<H> Default for MatchTree<H> {
    fn default() -> Self {
        Self::new()
    }
}

struct Search<'m> {
    method: &'m Method,
    /// First endpoint reached that lacks the method.
    fallback: Option<EndpointId>,
    /// Union of methods of every endpoint reached with the path consumed.
    allowed: Vec<Method>,
}

impl<H> MatchTree<H> {
    pub fn new() -> Self {
        Self {
            root: Node::literal(b"/".to_vec()),
            endpoints: Vec::new(),
            routes: 0,
        }
    }

    /// Number of registered (method, pattern) pairs.
    pub fn len(&self) -> usize {
        self.routes
    }

    pub fn is_empty(&self) -> bool {
        self.routes == 0
    }

    /// Register `handler` for `method` on `pattern`.
    pub fn insert(&mut self, method: Method, pattern: &Pattern, handler: H) -> Result<EndpointId, RouteError> {
        let (lit, rest) = match pattern.tokens().split_first() {
            Some((Token::Literal(lit), rest)) if lit.starts_with('/') => (&lit.as_bytes()[1..], rest),
            _ => return Err(RouteError::invalid(pattern.as_str(), "must start with '/'")),
        };

        self.root.priority += 1;
        let node = insert_at(&mut self.root, lit, rest, pattern)?;

        let id = match node.endpoint {
            Some(id) => id,
            None => {
                let id = EndpointId(self.endpoints.len() as u32);
                self.endpoints.push(Endpoint::new(pattern.clone()));
                node.endpoint = Some(id);
                id
            }
        };

        let endpoint = &mut self.endpoints[id.index()];
        if endpoint.get(&method).is_some() {
            return Err(RouteError::DuplicateRoute {
                method: method.to_string(),
                pattern: pattern.to_string(),
            });
        }
        endpoint.handlers.push((method, handler));
        self.routes += 1;
        Ok(id)
    }

    /// Resolve `path` for `method`.
    pub fn lookup<'a>(&'a self, method: &Method, path: &'a str) -> Match<'a, H> {
        if !path.starts_with('/') {
            return Match::not_found();
        }

        let mut params = Params::new();
        let mut search = Search {
            method,
            fallback: None,
            allowed: Vec::new(),
        };

        match self.descend(&self.root, path, 1, &mut params, &mut search) {
            Some(id) => {
                let endpoint = &self.endpoints[id.index()];
                match endpoint.get(method) {
                    Some(handler) => Match::matched(endpoint, handler, params),
                    None => Match::not_found(),
                }
            }
            None => match search.fallback {
                Some(id) => Match::method_not_allowed(&self.endpoints[id.index()], search.allowed),
                None => Match::not_found(),
            },
        }
    }

    /// Follow literal edges only; resolves fully literal request paths.
    pub fn resolve_literal(&self, path: &str) -> Option<EndpointId> {
        let bytes = path.as_bytes();
        if bytes.first() != Some(&b'/') {
            return None;
        }

        let mut node = &self.root;
        let mut pos = 1;
        while pos < bytes.len() {
            let child = node.children.find(bytes[pos])?;
            if !bytes[pos..].starts_with(&child.fragment) {
                return None;
            }
            pos += child.fragment.len();
            node = child;
        }
        node.endpoint
    }

    pub fn endpoint(&self, id: EndpointId) -> &Endpoint<H> {
        &self.endpoints[id.index()]
    }

    pub fn endpoints(&self) -> impl Iterator<Item = &Endpoint<H>> {
        self.endpoints.iter()
    }

    /// Every registered (method, pattern) pair.
    pub fn routes(&self) -> impl Iterator<Item = (&Method, &Pattern)> {
        self.endpoints
            .iter()
            .flat_map(|e| e.methods().map(move |m| (m, e.pattern())))
    }

    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats {
            nodes: self.root.count(),
            endpoints: self.endpoints.len(),
            routes: self.routes,
            child_storage: HashMap::new(),
        };
        self.root.walk(&mut |node| {
            if !node.children.is_empty() {
                *stats.child_storage.entry(node.children.storage()).or_default() += 1;
            }
        });
        stats
    }

    /// `pos` is the offset just past `node`'s fragment.
    fn descend<'a>(
        &'a self,
        node: &'a Node,
        path: &'a str,
        pos: usize,
        params: &mut Params<'a>,
        search: &mut Search<'_>,
    ) -> Option<EndpointId> {
        let bytes = path.as_bytes();
        if pos == bytes.len() {
            return node.endpoint.and_then(|id| self.accept(id, search));
        }

        if let Some(child) = node.children.find(bytes[pos]) {
            if bytes[pos..].starts_with(&child.fragment) {
                let found = self.descend(child, path, pos + child.fragment.len(), params, search);
                if found.is_some() {
                    return found;
                }
            }
        }

        if let Some(param) = &node.param {
            let end = bytes[pos..]
                .iter()
                .position(|&b| b == b'/')
                .map_or(bytes.len(), |i| pos + i);
            if end > pos {
                let mark = params.len();
                params.push(param.param_name(), &path[pos..end]);
                let found = self.descend(param, path, end, params, search);
                if found.is_some() {
                    return found;
                }
                params.truncate(mark);
            }
        }

        if let Some(wildcard) = &node.wildcard {
            debug_assert!(
                wildcard.children.is_empty() && wildcard.param.is_none() && wildcard.wildcard.is_none(),
                "wildcard node with children"
            );
            if let Some(id) = wildcard.endpoint.and_then(|id| self.accept(id, search)) {
                params.push(wildcard.param_name(), &path[pos..]);
                return Some(id);
            }
        }

        None
    }

    fn accept(&self, id: EndpointId, search: &mut Search<'_>) -> Option<EndpointId> {
        let endpoint = &self.endpoints[id.index()];
        if endpoint.get(search.method).is_some() {
            return Some(id);
        }
        if endpoint.is_empty() {
            return None;
        }
        if search.fallback.is_none() {
            search.fallback = Some(id);
        }
        for method in endpoint.methods() {
            if !search.allowed.contains(method) {
                search.allowed.push(method.clone());
            }
        }
        None
    }
}

/// Walk or extend the tree below `node` for the literal run `lit` followed
/// by `rest`, returning the target node.
fn insert_at<'n>(node: &'n mut Node, lit: &[u8], rest: &[Token], pattern: &Pattern) -> Result<&'n mut Node, RouteError> {
    if !lit.is_empty() {
        let child = node
            .children
            .bump_or_insert(lit[0], || Node::literal(lit.to_vec()));

        let n = common_prefix(&child.fragment, lit);
        if n < child.fragment.len() {
            child.split(n);
        }
        return insert_at(child, &lit[n..], rest, pattern);
    }

    match rest.split_first() {
        None => Ok(node),
        Some((Token::Literal(lit), rest)) => insert_at(node, lit.as_bytes(), rest, pattern),
        Some((Token::Param(name), rest)) => {
            let child = node.param.get_or_insert_with(|| Box::new(Node::param(name)));
            check_name(child, name, pattern)?;
            child.priority += 1;
            let (lit, rest) = match rest.split_first() {
                Some((Token::Literal(lit), rest)) => (lit.as_bytes(), rest),
                _ => (&[][..], rest),
            };
            insert_at(child, lit, rest, pattern)
        }
        Some((Token::Wildcard(name), rest)) => {
            debug_assert!(rest.is_empty(), "wildcard must terminate the pattern");
            let child = node.wildcard.get_or_insert_with(|| Box::new(Node::wildcard(name)));
            check_name(child, name, pattern)?;
            child.priority += 1;
            Ok(&mut **child)
        }
    }
}

fn check_name(node: &Node, name: &str, pattern: &Pattern) -> Result<(), RouteError> {
    if node.param_name() == name {
        return Ok(());
    }
    Err(RouteError::ParameterConflict {
        pattern: pattern.to_string(),
        name: name.to_string(),
        existing: node.param_name().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(routes: &[(&str, &str)]) -> MatchTree<String> {
        let mut tree = MatchTree::new();
        for (method, pattern) in routes {
            let method = Method::from_bytes(method.as_bytes()).unwrap();
            let handler = format!("{method} {pattern}");
            tree.insert(method, &Pattern::parse(pattern).unwrap(), handler).unwrap();
        }
        tree
    }

    fn resolve(tree: &MatchTree<String>, method: &str, path: &str) -> (MatchOutcome, Option<String>, Vec<(String, String)>) {
        let method = Method::from_bytes(method.as_bytes()).unwrap();
        let m = tree.lookup(&method, path);
        (m.outcome(), m.handler().cloned(), m.params().to_owned_pairs())
    }

    fn pairs(list: &[(&str, &str)]) -> Vec<(String, String)> {
        list.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_literal_routes_with_splitting() {
        let t = tree(&[
            ("GET", "/users"),
            ("GET", "/user"),
            ("GET", "/uploads"),
            ("GET", "/"),
        ]);

        for path in ["/users", "/user", "/uploads", "/"] {
            let (outcome, handler, _) = resolve(&t, "GET", path);
            assert_eq!(outcome, MatchOutcome::Matched, "{path}");
            assert_eq!(handler.unwrap(), format!("GET {path}"));
        }
        assert_eq!(resolve(&t, "GET", "/use").0, MatchOutcome::PathNotFound);
        assert_eq!(resolve(&t, "GET", "/usersx").0, MatchOutcome::PathNotFound);
    }

    #[test]
    fn test_param_capture() {
        let t = tree(&[("GET", "/users/:id/posts/:post_id")]);
        let (outcome, _, params) = resolve(&t, "GET", "/users/123/posts/abc");
        assert_eq!(outcome, MatchOutcome::Matched);
        assert_eq!(params, pairs(&[("id", "123"), ("post_id", "abc")]));
    }

    #[test]
    fn test_param_requires_non_empty_segment() {
        let t = tree(&[("GET", "/users/:id")]);
        assert_eq!(resolve(&t, "GET", "/users/").0, MatchOutcome::PathNotFound);
        assert_eq!(resolve(&t, "GET", "/users").0, MatchOutcome::PathNotFound);
    }

    #[test]
    fn test_wildcard_capture() {
        let t = tree(&[("GET", "/files/*")]);
        let (outcome, _, params) = resolve(&t, "GET", "/files/a/b/c");
        assert_eq!(outcome, MatchOutcome::Matched);
        assert_eq!(params, pairs(&[("*", "a/b/c")]));

        assert_eq!(resolve(&t, "GET", "/files").0, MatchOutcome::PathNotFound);
        assert_eq!(resolve(&t, "GET", "/files/").0, MatchOutcome::PathNotFound);
    }

    #[test]
    fn test_priority_literal_param_wildcard() {
        let t = tree(&[
            ("GET", "/users/new"),
            ("GET", "/users/:id"),
            ("GET", "/users/*rest"),
        ]);

        assert_eq!(resolve(&t, "GET", "/users/new").1.unwrap(), "GET /users/new");
        assert_eq!(resolve(&t, "GET", "/users/42").1.unwrap(), "GET /users/:id");
        let (_, handler, params) = resolve(&t, "GET", "/users/42/edit");
        assert_eq!(handler.unwrap(), "GET /users/*rest");
        assert_eq!(params, pairs(&[("rest", "42/edit")]));
    }

    #[test]
    fn test_backtracks_out_of_dead_literal_branch() {
        let t = tree(&[("GET", "/users/new/profile"), ("GET", "/users/:id/settings")]);
        let (outcome, handler, params) = resolve(&t, "GET", "/users/new/settings");
        assert_eq!(outcome, MatchOutcome::Matched);
        assert_eq!(handler.unwrap(), "GET /users/:id/settings");
        assert_eq!(params, pairs(&[("id", "new")]));
    }

    #[test]
    fn test_method_not_allowed_vs_not_found() {
        let t = tree(&[("GET", "/api/v1/users/:id")]);
        let method = Method::POST;
        let m = t.lookup(&method, "/api/v1/users/42");
        assert_eq!(m.outcome(), MatchOutcome::MethodNotAllowed);
        assert!(m.params().is_empty());
        assert_eq!(m.allowed_methods(), &[Method::GET]);
        assert_eq!(m.pattern(), Some("/api/v1/users/:id"));

        assert_eq!(resolve(&t, "GET", "/api/v1/orders/42").0, MatchOutcome::PathNotFound);
    }

    #[test]
    fn test_lower_priority_branch_serves_missing_method() {
        let t = tree(&[("GET", "/users/new"), ("POST", "/users/:id")]);
        let (outcome, handler, params) = resolve(&t, "POST", "/users/new");
        assert_eq!(outcome, MatchOutcome::Matched);
        assert_eq!(handler.unwrap(), "POST /users/:id");
        assert_eq!(params, pairs(&[("id", "new")]));

        let m = t.lookup(&Method::DELETE, "/users/new");
        assert_eq!(m.outcome(), MatchOutcome::MethodNotAllowed);
        assert_eq!(m.pattern(), Some("/users/new"));
        assert_eq!(m.allowed_methods(), &[Method::GET, Method::POST]);
    }

    #[test]
    fn test_allowed_methods_span_param_and_wildcard_branches() {
        let t = tree(&[
            ("GET", "/files/readme"),
            ("PUT", "/files/:name"),
            ("DELETE", "/files/*rest"),
            ("GET", "/files/:name"),
        ]);
        let m = t.lookup(&Method::PATCH, "/files/readme");
        assert_eq!(m.outcome(), MatchOutcome::MethodNotAllowed);
        assert_eq!(m.allowed_methods(), &[Method::GET, Method::PUT, Method::DELETE]);
        assert!(m.params().is_empty());
    }

    #[test]
    fn test_duplicate_route_keeps_first() {
        let mut t = tree(&[("GET", "/a/:id")]);
        let err = t
            .insert(Method::GET, &Pattern::parse("/a/:id").unwrap(), "second".into())
            .unwrap_err();
        assert!(matches!(err, RouteError::DuplicateRoute { .. }));
        assert_eq!(resolve(&t, "GET", "/a/1").1.unwrap(), "GET /a/:id");
        assert_eq!(t.len(), 1);

        t.insert(Method::PUT, &Pattern::parse("/a/:id").unwrap(), "put".into())
            .unwrap();
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_param_name_conflict() {
        let mut t = tree(&[("GET", "/a/:id")]);
        let err = t
            .insert(Method::GET, &Pattern::parse("/a/:name/b").unwrap(), String::new())
            .unwrap_err();
        assert_eq!(
            err,
            RouteError::ParameterConflict {
                pattern: "/a/:name/b".into(),
                name: "name".into(),
                existing: "id".into(),
            }
        );
    }

    #[test]
    fn test_resolve_literal_only_follows_literals() {
        let t = tree(&[("GET", "/health"), ("GET", "/users/:id")]);
        assert!(t.resolve_literal("/health").is_some());
        assert!(t.resolve_literal("/users/1").is_none());
        assert!(t.resolve_literal("/healt").is_none());
        assert!(t.resolve_literal("health").is_none());
    }

    #[test]
    fn test_rejects_relative_path() {
        let t = tree(&[("GET", "/")]);
        assert_eq!(resolve(&t, "GET", "").0, MatchOutcome::PathNotFound);
        assert_eq!(resolve(&t, "GET", "users").0, MatchOutcome::PathNotFound);
    }

    #[test]
    fn test_stats_report_storage() {
        let routes: Vec<(String, String)> = (b'a'..=b'z')
            .map(|b| ("GET".to_string(), format!("/{}", b as char)))
            .collect();
        let refs: Vec<(&str, &str)> = routes.iter().map(|(m, p)| (m.as_str(), p.as_str())).collect();
        let t = tree(&refs);

        let stats = t.stats();
        assert_eq!(stats.routes, 26);
        assert_eq!(stats.endpoints, 26);
        assert_eq!(stats.nodes, 27);
        assert_eq!(stats.child_storage.get(&ChildStorage::Map), Some(&1));
    }
}
