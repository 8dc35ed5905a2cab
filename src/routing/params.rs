//! Parameter list produced by a single lookup.

use std::ops::Index;

use smallvec::SmallVec;

/// A single captured parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param<'a> {
    pub key: &'a str,
    pub value: &'a str,
}

/// Ordered (name, value) pairs in path-segment order.
///
/// Names borrow from the matching tree and values from the request path,
/// so collecting parameters never allocates for typical route shapes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params<'a> {
    inner: SmallVec<[Param<'a>; 4]>,
}

impl<'a> Params<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value bound to `key`, first occurrence wins.
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.inner.iter().find(|p| p.key == key).map(|p| p.value)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Param<'a>> {
        self.inner.iter()
    }

    /// Copy the pairs out so they can outlive the tree and path.
    pub fn to_owned_pairs(&self) -> Vec<(String, String)> {
        self.inner
            .iter()
            .map(|p| (p.key.to_string(), p.value.to_string()))
            .collect()
    }

    pub(crate) fn push(&mut self, key: &'a str, value: &'a str) {
        self.inner.push(Param { key, value });
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.inner.truncate(len);
    }
}

impl<'a> Index<usize> for Params<'a> {
    type Output = Param<'a>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.inner[index]
    }
}

/// Owned parameter list handed out by the router facade.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnedParams(Vec<(String, String)>);

impl OwnedParams {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl From<Params<'_>> for OwnedParams {
    fn from(params: Params<'_>) -> Self {
        OwnedParams(params.to_owned_pairs())
    }
}
