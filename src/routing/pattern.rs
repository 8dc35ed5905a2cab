//! Route pattern parsing and validation.
//!
//! # Syntax
//! - Must start with `/`; only the root pattern `/` may end with `/`
//! - No empty segments (`//`)
//! - `:name` declares a single-segment parameter
//! - `*` or `*name` declares a trailing wildcard (final segment only);
//!   an anonymous wildcard binds under the name `*`
//! - Parameter names are unique within a pattern
//!
//! A parsed pattern is a sequence of tokens in which every parameter or
//! wildcard is preceded by a literal run ending in `/`.

use std::fmt;

use smallvec::SmallVec;

use crate::routing::error::RouteError;

/// Name bound by a wildcard declared as a bare `*`.
pub const ANONYMOUS_WILDCARD: &str = "*";

/// One parsed unit of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Literal bytes, slashes included.
    Literal(String),
    /// `:name`
    Param(String),
    /// `*name`, always last.
    Wildcard(String),
}

/// A validated route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    raw: String,
    tokens: SmallVec<[Token; 4]>,
}

impl Pattern {
    /// Parse and validate a pattern string.
    pub fn parse(raw: &str) -> Result<Self, RouteError> {
        if !raw.starts_with('/') {
            return Err(RouteError::invalid(raw, "must start with '/'"));
        }
        if raw.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(RouteError::invalid(raw, "must not contain whitespace or control characters"));
        }
        if raw == "/" {
            return Ok(Self {
                raw: raw.to_string(),
                tokens: SmallVec::from_iter([Token::Literal("/".to_string())]),
            });
        }
        if raw.ends_with('/') {
            return Err(RouteError::invalid(raw, "must not end with '/'"));
        }

        let segments: Vec<&str> = raw[1..].split('/').collect();
        let last = segments.len() - 1;
        let mut tokens = SmallVec::new();
        let mut names: SmallVec<[&str; 4]> = SmallVec::new();
        let mut literal = String::from("/");

        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                literal.push('/');
            }
            if segment.is_empty() {
                return Err(RouteError::invalid(raw, "empty segment"));
            }

            let name = if let Some(name) = segment.strip_prefix(':') {
                if name.is_empty() {
                    return Err(RouteError::invalid(raw, "parameter name must not be empty"));
                }
                name
            } else if let Some(name) = segment.strip_prefix('*') {
                if i != last {
                    return Err(RouteError::invalid(raw, "wildcard must be the final segment"));
                }
                if name.is_empty() { ANONYMOUS_WILDCARD } else { name }
            } else {
                if segment.contains([':', '*']) {
                    return Err(RouteError::invalid(
                        raw,
                        "':' and '*' are only allowed at the start of a segment",
                    ));
                }
                literal.push_str(segment);
                continue;
            };

            if name.contains([':', '*']) {
                return Err(RouteError::invalid(
                    raw,
                    "':' and '*' are only allowed at the start of a segment",
                ));
            }
            if names.contains(&name) {
                return Err(RouteError::DuplicateParameterName {
                    pattern: raw.to_string(),
                    name: name.to_string(),
                });
            }
            names.push(name);

            tokens.push(Token::Literal(std::mem::take(&mut literal)));
            if segment.starts_with(':') {
                tokens.push(Token::Param(name.to_string()));
            } else {
                tokens.push(Token::Wildcard(name.to_string()));
            }
        }

        if !literal.is_empty() {
            tokens.push(Token::Literal(literal));
        }

        Ok(Self {
            raw: raw.to_string(),
            tokens,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// True when the pattern has no parameters or wildcard.
    pub fn is_literal(&self) -> bool {
        self.tokens.iter().all(|t| matches!(t, Token::Literal(_)))
    }

    /// Number of parameters, wildcard included.
    pub fn param_count(&self) -> usize {
        self.tokens
            .iter()
            .filter(|t| !matches!(t, Token::Literal(_)))
            .count()
    }

    pub fn has_wildcard(&self) -> bool {
        matches!(self.tokens.last(), Some(Token::Wildcard(_)))
    }

    /// Number of `/` characters in the pattern.
    pub fn depth(&self) -> usize {
        self.raw.bytes().filter(|&b| b == b'/').count()
    }

    /// Parameter names in left-to-right order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter_map(|t| match t {
            Token::Param(name) | Token::Wildcard(name) => Some(name.as_str()),
            Token::Literal(_) => None,
        })
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
