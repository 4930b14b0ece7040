//! Dual-tier cache of materialized explorer nodes.
//!
//! The mutable tier is a path trie over nodes whose URI resolves inside an
//! open workspace folder; those are subject to file-system invalidation. The
//! read-only tier is a flat map for archive members (`jdt` scheme), which no
//! file event can change. Tier selection is a pure function of the URI; a
//! given path lives in at most one tier.
//!
//! Every operation is a total function: a path with no cache entry is a
//! silent no-op, never an error. The cache is best-effort and always safe to
//! miss.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use jdex_workspace::paths::{decoded_path, url_to_path};
use jdex_workspace::WorkspaceFolders;
use tracing::trace;
use url::Url;

use crate::nodes::ExplorerNode;
use crate::trie::Trie;

const ARCHIVE_SCHEME: &str = "jdt";

/// Cache of previously materialized tree nodes, indexed by location.
pub struct NodeCache {
    folders: Arc<WorkspaceFolders>,
    mutable: Mutex<Trie>,
    readonly: Mutex<HashMap<PathBuf, ExplorerNode>>,
}

impl NodeCache {
    #[must_use]
    pub fn new(folders: Arc<WorkspaceFolders>) -> Self {
        Self {
            folders,
            mutable: Mutex::new(Trie::new()),
            readonly: Mutex::new(HashMap::new()),
        }
    }

    /// Exact lookup of a cached node, routed by URI tier.
    #[must_use]
    pub fn data_node(&self, uri: &Url) -> Option<ExplorerNode> {
        if self.in_workspace(uri) {
            let path = url_to_path(uri)?;
            self.trie().find(&path).and_then(|node| node.value().cloned())
        } else if is_archive_member(uri) {
            let key = decoded_path(uri)?;
            self.flat().get(&key).cloned()
        } else {
            None
        }
    }

    /// Nearest cached ancestor of a workspace path; the node whose expansion
    /// must be recomputed when something under it is created or deleted.
    ///
    /// Archive members are immutable and never need ancestor invalidation,
    /// so non-workspace URIs always resolve to `None`.
    #[must_use]
    pub fn find_parent_explorer_node(&self, uri: &Url) -> Option<ExplorerNode> {
        if !self.in_workspace(uri) {
            return None;
        }
        let path = url_to_path(uri)?;
        self.trie().find_parent_explorer_node(&path)
    }

    /// Cache a node produced by an expansion. Variants that carry no
    /// cacheable path are silently ignored.
    pub fn save_node(&self, node: &ExplorerNode) {
        let Some(data) = node.as_data() else {
            return;
        };
        let Some(uri) = data.uri() else {
            return;
        };

        if self.in_workspace(uri) {
            self.trie().insert(node.clone());
        } else if is_archive_member(uri) {
            if let Some(key) = decoded_path(uri) {
                self.flat().insert(key, node.clone());
            }
        }
    }

    pub fn save_nodes(&self, nodes: &[ExplorerNode]) {
        for node in nodes {
            self.save_node(node);
        }
    }

    /// The core invalidation primitive.
    ///
    /// With no node, clears both tiers entirely (a full, root-triggered
    /// refresh). With a workspace node, discards its trie subtree and the
    /// node's own expansion cache; the trie and the node's `children` field
    /// are separate caches of the same fact and both must go. Read-only and
    /// uncached nodes are no-ops.
    pub fn remove_mutable_node_children(&self, node: Option<&ExplorerNode>) {
        let Some(node) = node else {
            self.clear_all();
            return;
        };
        let Some(data) = node.as_data() else {
            return;
        };
        let Some(uri) = data.uri() else {
            return;
        };
        if !self.in_workspace(uri) {
            return;
        }
        let Some(path) = url_to_path(uri) else {
            return;
        };

        let mut trie = self.trie();
        let Some(trie_node) = trie.find_mut(&path) else {
            return;
        };
        trie_node.remove_children();
        if let Some(cached) = trie_node.value() {
            if let Some(cached_data) = cached.as_data() {
                cached_data.clear_children_cache();
            }
        }
        trace!(path = %path.display(), "invalidated cached subtree");
    }

    fn clear_all(&self) {
        self.trie().clear_all();
        self.flat().clear();
        trace!("cleared both cache tiers");
    }

    fn in_workspace(&self, uri: &Url) -> bool {
        self.folders.contains_url(uri)
    }

    fn trie(&self) -> MutexGuard<'_, Trie> {
        self.mutable.lock().expect("mutable cache lock poisoned")
    }

    fn flat(&self) -> MutexGuard<'_, HashMap<PathBuf, ExplorerNode>> {
        self.readonly.lock().expect("readonly cache lock poisoned")
    }
}

fn is_archive_member(uri: &Url) -> bool {
    uri.scheme() == ARCHIVE_SCHEME
}

#[cfg(test)]
mod tests {
    use super::*;
    use jdex_project::{NodeData, NodeKind};

    fn cache() -> NodeCache {
        NodeCache::new(Arc::new(WorkspaceFolders::new(vec![PathBuf::from("/ws")])))
    }

    fn node(uri: &str, kind: NodeKind) -> ExplorerNode {
        let name = uri.rsplit('/').next().unwrap_or(uri).to_string();
        ExplorerNode::from_data(NodeData::new(name, Some(uri.to_string()), kind), None)
    }

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    #[test]
    fn workspace_node_routes_to_mutable_tier() {
        let cache = cache();
        let pkg = node("file:///ws/proj/src/pkg", NodeKind::Package);
        cache.save_node(&pkg);

        assert_eq!(cache.data_node(&url("file:///ws/proj/src/pkg")), Some(pkg));
    }

    #[test]
    fn archive_member_routes_to_readonly_tier() {
        let cache = cache();
        let member = node("jdt://contents/rt.jar/java.util/List.class", NodeKind::File);
        cache.save_node(&member);

        assert_eq!(
            cache.data_node(&url("jdt://contents/rt.jar/java.util/List.class")),
            Some(member.clone())
        );
        // Never reachable through the nearest-ancestor query.
        assert!(cache
            .find_parent_explorer_node(&url("jdt://contents/rt.jar/java.util/List.class"))
            .is_none());
    }

    #[test]
    fn file_outside_workspace_is_not_cached() {
        let cache = cache();
        let outside = node("file:///elsewhere/Main.java", NodeKind::File);
        cache.save_node(&outside);
        assert!(cache.data_node(&url("file:///elsewhere/Main.java")).is_none());
    }

    #[test]
    fn placeholder_nodes_are_ignored() {
        let cache = cache();
        cache.save_nodes(&[ExplorerNode::LightWeight]);
        // No panic, nothing cached; lookups still miss.
        assert!(cache.data_node(&url("file:///ws/anything")).is_none());
    }

    #[test]
    fn parent_lookup_delegates_to_trie() {
        let cache = cache();
        let src = node("file:///ws/proj/src", NodeKind::PackageRoot);
        let pkg = ExplorerNode::from_data(
            NodeData::new(
                "pkg",
                Some("file:///ws/proj/src/pkg".to_string()),
                NodeKind::Package,
            ),
            Some(src.clone()),
        );
        cache.save_nodes(&[src.clone(), pkg]);

        let parent = cache
            .find_parent_explorer_node(&url("file:///ws/proj/src/pkg/A.java"))
            .unwrap();
        assert_eq!(parent, src);
    }

    #[test]
    fn invalidation_removes_subtree_and_expansion_cache() {
        let cache = cache();
        let pkg = node("file:///ws/proj/src/pkg", NodeKind::Package);
        pkg.as_data().unwrap().set_children(vec![]);
        let c1 = node("file:///ws/proj/src/pkg/A.java", NodeKind::File);
        let c2 = node("file:///ws/proj/src/pkg/B.java", NodeKind::File);
        cache.save_nodes(&[pkg.clone(), c1, c2]);

        cache.remove_mutable_node_children(Some(&pkg));

        assert!(cache.data_node(&url("file:///ws/proj/src/pkg/A.java")).is_none());
        assert!(cache.data_node(&url("file:///ws/proj/src/pkg/B.java")).is_none());
        // The node itself stays findable, but its expansion cache is gone.
        assert_eq!(cache.data_node(&url("file:///ws/proj/src/pkg")), Some(pkg.clone()));
        assert!(!pkg.as_data().unwrap().has_cached_children());
    }

    #[test]
    fn untargeted_invalidation_clears_both_tiers() {
        let cache = cache();
        cache.save_nodes(&[
            node("file:///ws/proj/src/pkg", NodeKind::Package),
            node("jdt://contents/rt.jar/java.util/List.class", NodeKind::File),
        ]);

        cache.remove_mutable_node_children(None);

        assert!(cache.data_node(&url("file:///ws/proj/src/pkg")).is_none());
        assert!(cache
            .data_node(&url("jdt://contents/rt.jar/java.util/List.class"))
            .is_none());
    }

    #[test]
    fn invalidating_readonly_or_uncached_nodes_is_a_no_op() {
        let cache = cache();
        let member = node("jdt://contents/rt.jar/java.util/List.class", NodeKind::File);
        cache.save_node(&member);

        // Read-only nodes are never invalidated this way.
        cache.remove_mutable_node_children(Some(&member));
        assert!(cache
            .data_node(&url("jdt://contents/rt.jar/java.util/List.class"))
            .is_some());

        // A workspace node that was never cached is a silent no-op.
        let ghost = node("file:///ws/proj/src/ghost", NodeKind::Folder);
        cache.remove_mutable_node_children(Some(&ghost));

        // So is the placeholder.
        cache.remove_mutable_node_children(Some(&ExplorerNode::LightWeight));
    }
}
