//! Radix tree node.

use crate::routing::children::ChildSet;

/// Index of a handler table in the tree's endpoint arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EndpointId(pub(crate) u32);

impl EndpointId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NodeKind {
    Literal,
    Param(Box<str>),
    Wildcard(Box<str>),
}

/// A shared path fragment.
///
/// Literal nodes own a non-empty byte fragment. Parameter and wildcard nodes
/// carry no fragment; they capture path bytes at lookup time instead.
#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) fragment: Vec<u8>,
    pub(crate) kind: NodeKind,
    pub(crate) endpoint: Option<EndpointId>,
    pub(crate) children: ChildSet,
    pub(crate) param: Option<Box<Node>>,
    pub(crate) wildcard: Option<Box<Node>>,
    pub(crate) priority: u32,
}

impl Node {
    pub(crate) fn literal(fragment: Vec<u8>) -> Self {
        Self::with_kind(fragment, NodeKind::Literal)
    }

    pub(crate) fn param(name: &str) -> Self {
        Self::with_kind(Vec::new(), NodeKind::Param(name.into()))
    }

    pub(crate) fn wildcard(name: &str) -> Self {
        Self::with_kind(Vec::new(), NodeKind::Wildcard(name.into()))
    }

    fn with_kind(fragment: Vec<u8>, kind: NodeKind) -> Self {
        Self {
            fragment,
            kind,
            endpoint: None,
            children: ChildSet::default(),
            param: None,
            wildcard: None,
            priority: 0,
        }
    }

    /// First byte of a literal fragment.
    #[inline]
    pub(crate) fn label(&self) -> u8 {
        debug_assert!(!self.fragment.is_empty(), "literal node with empty fragment");
        self.fragment[0]
    }

    /// Name bound by a parameter or wildcard node.
    pub(crate) fn param_name(&self) -> &str {
        match &self.kind {
            NodeKind::Param(name) | NodeKind::Wildcard(name) => name,
            NodeKind::Literal => "",
        }
    }

    /// Shorten the fragment to `at` bytes, moving the suffix together with
    /// everything hanging off this node into a single new literal child.
    pub(crate) fn split(&mut self, at: usize) {
        debug_assert!(at > 0 && at < self.fragment.len(), "split point outside fragment");

        let suffix = self.fragment.split_off(at);
        let child = Node {
            fragment: suffix,
            kind: NodeKind::Literal,
            endpoint: self.endpoint.take(),
            children: std::mem::take(&mut self.children),
            param: self.param.take(),
            wildcard: self.wildcard.take(),
            priority: self.priority,
        };
        self.children = ChildSet::single(child);
    }

    /// Nodes in this subtree, self included.
    pub(crate) fn count(&self) -> usize {
        1 + self.children.iter().map(Node::count).sum::<usize>()
            + self.param.as_ref().map_or(0, |n| n.count())
            + self.wildcard.as_ref().map_or(0, |n| n.count())
    }

    /// Depth-first visit of every node in this subtree.
    pub(crate) fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Node)) {
        f(self);
        for child in self.children.iter() {
            child.walk(f);
        }
        if let Some(param) = &self.param {
            param.walk(f);
        }
        if let Some(wildcard) = &self.wildcard {
            wildcard.walk(f);
        }
    }
}

/// Length of the longest common prefix of two byte strings.
#[inline]
pub(crate) fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}
