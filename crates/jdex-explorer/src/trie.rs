//! Path-segment trie over cached explorer nodes.
//!
//! The trie is what turns an arbitrary filesystem path from a file event into
//! the minimal already-materialized tree node that must be told "your
//! children changed". Interior nodes created while inserting are structural
//! placeholders with no value; only the exact path of a cached node carries
//! one.

use std::collections::HashMap;
use std::path::{Component, Path};

use crate::nodes::ExplorerNode;

/// A single trie node: one path segment, an optional cached explorer node,
/// and a segment-keyed child map.
pub struct TrieNode {
    key: Option<String>,
    value: Option<ExplorerNode>,
    children: HashMap<String, TrieNode>,
}

impl TrieNode {
    fn new(key: Option<String>, value: Option<ExplorerNode>) -> Self {
        Self {
            key,
            value,
            children: HashMap::new(),
        }
    }

    /// The path segment this node represents; `None` for the root.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    #[must_use]
    pub fn value(&self) -> Option<&ExplorerNode> {
        self.value.as_ref()
    }

    /// Discard the entire child mapping, keeping this node's own value.
    pub fn remove_children(&mut self) {
        self.children.clear();
    }
}

impl Default for TrieNode {
    fn default() -> Self {
        TrieNode::new(None, None)
    }
}

/// Trie keyed by successive path segments.
#[derive(Default)]
pub struct Trie {
    root: TrieNode,
}

impl Trie {
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: TrieNode::default(),
        }
    }

    /// Insert a node at its filesystem path, overwriting any prior value at
    /// that exact path. Nodes without a filesystem path are ignored.
    pub fn insert(&mut self, node: ExplorerNode) {
        let Some(path) = node.as_data().and_then(|data| data.fs_path()) else {
            return;
        };

        let mut current = &mut self.root;
        for segment in segments(&path) {
            current = current
                .children
                .entry(segment.clone())
                .or_insert_with(|| TrieNode::new(Some(segment), None));
        }
        current.value = Some(node);
    }

    /// Exact-path walk; `None` as soon as a required segment is missing.
    #[must_use]
    pub fn find(&self, path: &Path) -> Option<&TrieNode> {
        let mut current = &self.root;
        for segment in segments(path) {
            current = current.children.get(&segment)?;
        }
        Some(current)
    }

    pub fn find_mut(&mut self, path: &Path) -> Option<&mut TrieNode> {
        let mut current = &mut self.root;
        for segment in segments(path) {
            current = current.children.get_mut(&segment)?;
        }
        Some(current)
    }

    /// Parent of the deepest cached node on the path.
    ///
    /// This answers "which already-materialized tree node is the closest
    /// ancestor whose children list must include or exclude the changed
    /// path": the node whose expansion cache needs invalidation when a file
    /// is created or deleted under it. `None` when no ancestor was ever
    /// cached; the caller falls back to a full refresh.
    #[must_use]
    pub fn find_parent_explorer_node(&self, path: &Path) -> Option<ExplorerNode> {
        let mut current = &self.root;
        let mut deepest: Option<&ExplorerNode> = None;

        for segment in segments(path) {
            match current.children.get(&segment) {
                Some(child) => current = child,
                None => break,
            }
            if let Some(value) = current.value() {
                deepest = Some(value);
            }
        }

        deepest.and_then(ExplorerNode::get_parent)
    }

    /// Discard the entire tree.
    pub fn clear_all(&mut self) {
        self.root.remove_children();
    }
}

fn segments(path: &Path) -> impl Iterator<Item = String> + '_ {
    path.components().filter_map(|component| match component {
        Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
        _ => None,
    })
}
