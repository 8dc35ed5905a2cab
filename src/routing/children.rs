//! Adaptive storage for literal children.
//!
//! The representation is picked by fan-out and switched transparently on
//! growth:
//! - `Inline`: up to 2 children, linear scan
//! - `Array`: up to 16 children, first-byte index scanned linearly
//! - `Map`: hash table keyed by first byte
//!
//! Inline and array storage keep children ordered by descending priority so
//! hotter subtrees are tried first. Callers see `find`, `insert` and
//! `bump_or_insert`.

use hashbrown::HashMap;
use serde::Serialize;
use smallvec::SmallVec;

use crate::routing::node::Node;

pub(crate) const INLINE_CAPACITY: usize = 2;
pub(crate) const ARRAY_CAPACITY: usize = 16;

/// Storage strategy currently used by a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildStorage {
    Inline,
    Array,
    Map,
}

#[derive(Debug)]
pub(crate) enum ChildSet {
    Inline(SmallVec<[Box<Node>; INLINE_CAPACITY]>),
    Array {
        labels: SmallVec<[u8; ARRAY_CAPACITY]>,
        nodes: Vec<Box<Node>>,
    },
    Map(HashMap<u8, Box<Node>>),
}

impl Default for ChildSet {
    fn default() -> Self {
        ChildSet::Inline(SmallVec::new())
    }
}

impl ChildSet {
    pub(crate) fn single(node: Node) -> Self {
        let mut inline = SmallVec::new();
        inline.push(Box::new(node));
        ChildSet::Inline(inline)
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            ChildSet::Inline(nodes) => nodes.len(),
            ChildSet::Array { nodes, .. } => nodes.len(),
            ChildSet::Map(map) => map.len(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn storage(&self) -> ChildStorage {
        match self {
            ChildSet::Inline(_) => ChildStorage::Inline,
            ChildSet::Array { .. } => ChildStorage::Array,
            ChildSet::Map(_) => ChildStorage::Map,
        }
    }

    #[inline]
    pub(crate) fn find(&self, label: u8) -> Option<&Node> {
        match self {
            ChildSet::Inline(nodes) => nodes.iter().find(|n| n.label() == label).map(|n| &**n),
            ChildSet::Array { labels, nodes } => {
                labels.iter().position(|&l| l == label).map(|i| &*nodes[i])
            }
            ChildSet::Map(map) => map.get(&label).map(|n| &**n),
        }
    }

    /// Increment the priority of the child under `label`, creating it with
    /// `make` when absent, move it ahead of colder siblings and return it.
    pub(crate) fn bump_or_insert(&mut self, label: u8, make: impl FnOnce() -> Node) -> &mut Node {
        let slot = match self {
            ChildSet::Inline(nodes) => nodes.iter().position(|n| n.label() == label),
            ChildSet::Array { labels, .. } => labels.iter().position(|&l| l == label),
            ChildSet::Map(map) => map.contains_key(&label).then_some(0),
        };
        let Some(mut i) = slot else {
            let mut node = make();
            debug_assert_eq!(node.label(), label, "child filed under a foreign label");
            node.priority += 1;
            return self.insert(node);
        };

        match self {
            ChildSet::Inline(nodes) => {
                nodes[i].priority += 1;
                while i > 0 && nodes[i - 1].priority < nodes[i].priority {
                    nodes.swap(i - 1, i);
                    i -= 1;
                }
                &mut *nodes[i]
            }
            ChildSet::Array { labels, nodes } => {
                nodes[i].priority += 1;
                while i > 0 && nodes[i - 1].priority < nodes[i].priority {
                    nodes.swap(i - 1, i);
                    labels.swap(i - 1, i);
                    i -= 1;
                }
                &mut *nodes[i]
            }
            ChildSet::Map(map) => {
                let node = map.entry(label).or_insert_with(|| Box::new(make()));
                node.priority += 1;
                &mut **node
            }
        }
    }

    /// Add a child whose first byte is not yet present.
    pub(crate) fn insert(&mut self, node: Node) -> &mut Node {
        let label = node.label();
        debug_assert!(self.find(label).is_none(), "sibling literal children share a first byte");
        self.grow_if_full();

        let node = Box::new(node);
        match self {
            ChildSet::Inline(nodes) => {
                let i = insert_by_priority(nodes, &node);
                nodes.insert(i, node);
                &mut *nodes[i]
            }
            ChildSet::Array { labels, nodes } => {
                let i = insert_by_priority(nodes, &node);
                labels.insert(i, label);
                nodes.insert(i, node);
                &mut *nodes[i]
            }
            ChildSet::Map(map) => &mut **map.entry(label).or_insert(node),
        }
    }

    pub(crate) fn iter(&self) -> Box<dyn Iterator<Item = &Node> + '_> {
        match self {
            ChildSet::Inline(nodes) => Box::new(nodes.iter().map(|n| &**n)),
            ChildSet::Array { nodes, .. } => Box::new(nodes.iter().map(|n| &**n)),
            ChildSet::Map(map) => Box::new(map.values().map(|n| &**n)),
        }
    }

    fn grow_if_full(&mut self) {
        match self {
            ChildSet::Inline(nodes) if nodes.len() >= INLINE_CAPACITY => {
                let nodes: Vec<Box<Node>> = nodes.drain(..).collect();
                let labels = nodes.iter().map(|n| n.label()).collect();
                *self = ChildSet::Array { labels, nodes };
            }
            ChildSet::Array { nodes, .. } if nodes.len() >= ARRAY_CAPACITY => {
                let map = nodes.drain(..).map(|n| (n.label(), n)).collect();
                *self = ChildSet::Map(map);
            }
            _ => {}
        }
    }
}

fn insert_by_priority(nodes: &[Box<Node>], node: &Node) -> usize {
    nodes
        .iter()
        .position(|n| n.priority < node.priority)
        .unwrap_or(nodes.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child(fragment: &str) -> Node {
        Node::literal(fragment.as_bytes().to_vec())
    }

    #[test]
    fn test_grows_through_representations() {
        let mut set = ChildSet::default();
        assert_eq!(set.storage(), ChildStorage::Inline);

        for (i, b) in (b'a'..=b'z').enumerate() {
            set.insert(child(&(b as char).to_string()));
            let expected = match i + 1 {
                n if n <= INLINE_CAPACITY => ChildStorage::Inline,
                n if n <= ARRAY_CAPACITY => ChildStorage::Array,
                _ => ChildStorage::Map,
            };
            assert_eq!(set.storage(), expected, "after {} children", i + 1);
        }

        assert_eq!(set.len(), 26);
        for b in b'a'..=b'z' {
            assert_eq!(set.find(b).map(Node::label), Some(b));
        }
        assert!(set.find(b'0').is_none());
    }

    #[test]
    fn test_bump_moves_hot_child_first() {
        let mut set = ChildSet::default();
        set.insert(child("users"));
        set.insert(child("orders"));
        set.insert(child("posts"));

        set.bump_or_insert(b'p', || child("posts"));
        set.bump_or_insert(b'p', || child("posts"));
        let order: Vec<u8> = set.iter().map(Node::label).collect();
        assert_eq!(order[0], b'p');
        assert!(set.find(b'u').is_some());
        assert!(set.find(b'o').is_some());
    }

    #[test]
    fn test_bump_or_insert_creates_missing_child() {
        let mut set = ChildSet::single(child("a"));
        let created = set.bump_or_insert(b'z', || child("zed"));
        assert_eq!(created.fragment, b"zed");
        assert_eq!(created.priority, 1);

        let order: Vec<u8> = set.iter().map(Node::label).collect();
        assert_eq!(order, vec![b'z', b'a']);

        set.bump_or_insert(b'z', || unreachable!("existing child must be reused"));
        assert_eq!(set.len(), 2);
        assert_eq!(set.find(b'z').map(|n| n.priority), Some(2));
    }

    #[test]
    fn test_bump_or_insert_in_map_storage() {
        let mut set = ChildSet::default();
        for b in b'a'..=b'z' {
            set.insert(child(&(b as char).to_string()));
        }
        assert_eq!(set.storage(), ChildStorage::Map);

        set.bump_or_insert(b'q', || unreachable!("existing child must be reused"));
        assert_eq!(set.find(b'q').map(|n| n.priority), Some(1));
        set.bump_or_insert(b'0', || child("0"));
        assert_eq!(set.len(), 27);
    }
}
