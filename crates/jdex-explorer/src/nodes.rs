//! Explorer tree nodes.
//!
//! [`ExplorerNode`] is a tagged union over the node variants the tree can
//! show. The data-backed variants share [`DataNode`], which pairs a parsed
//! URI with the server-reported [`NodeData`] record; that record's `children`
//! field is the expansion cache cleared by structural invalidation.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use jdex_project::{NodeData, NodeKind, ProjectClient};
use jdex_workspace::paths::url_to_path;
use url::Url;

use crate::error::ExplorerError;

/// A single node of the explorer tree.
#[derive(Clone)]
pub enum ExplorerNode {
    /// One open workspace folder (multi-folder workspaces only)
    Workspace(Arc<DataNode>),
    /// A Java project
    Project(Arc<DataNode>),
    /// Any other resource-backed node (package root, package, source, file)
    Data(Arc<DataNode>),
    /// Placeholder shown while the language server cannot answer queries
    LightWeight,
}

/// Shared state of a resource-backed tree node.
pub struct DataNode {
    /// Parsed from the descriptor once at construction; `None` when the
    /// server reported no resource identifier (synthetic containers)
    uri: Option<Url>,
    data: Mutex<NodeData>,
    /// Back-reference only; children are never owned through this field
    parent: Option<ExplorerNode>,
}

impl ExplorerNode {
    /// Materialize a node from a server descriptor.
    #[must_use]
    pub fn from_data(data: NodeData, parent: Option<ExplorerNode>) -> Self {
        let kind = data.kind;
        let uri = data.uri.as_deref().and_then(|raw| Url::parse(raw).ok());
        let node = Arc::new(DataNode {
            uri,
            data: Mutex::new(data),
            parent,
        });
        match kind {
            NodeKind::Workspace => ExplorerNode::Workspace(node),
            NodeKind::Project => ExplorerNode::Project(node),
            _ => ExplorerNode::Data(node),
        }
    }

    /// The backing [`DataNode`], for every variant that has one.
    #[must_use]
    pub fn as_data(&self) -> Option<&Arc<DataNode>> {
        match self {
            ExplorerNode::Workspace(node)
            | ExplorerNode::Project(node)
            | ExplorerNode::Data(node) => Some(node),
            ExplorerNode::LightWeight => None,
        }
    }

    /// Back-reference to the node this one was materialized under.
    #[must_use]
    pub fn get_parent(&self) -> Option<ExplorerNode> {
        self.as_data().and_then(|node| node.parent.clone())
    }

    #[must_use]
    pub fn uri(&self) -> Option<&Url> {
        self.as_data().and_then(|node| node.uri())
    }

    /// Expand this node, lazily.
    ///
    /// Uses the cached expansion when one exists; otherwise queries the
    /// language server and records the result as the new expansion cache.
    /// Idempotent between invalidations. The placeholder variant has no
    /// children.
    pub async fn get_children(
        &self,
        client: &dyn ProjectClient,
    ) -> Result<Vec<ExplorerNode>, ExplorerError> {
        let Some(data_node) = self.as_data() else {
            return Ok(Vec::new());
        };

        let cached = data_node.lock().children.clone();
        let children = match cached {
            Some(children) => children,
            None => {
                let snapshot = data_node.data();
                let fetched = client.children(&snapshot).await?;
                data_node.set_children(fetched.clone());
                fetched
            }
        };

        Ok(children
            .into_iter()
            .map(|child| ExplorerNode::from_data(child, Some(self.clone())))
            .collect())
    }
}

impl DataNode {
    #[must_use]
    pub fn uri(&self) -> Option<&Url> {
        self.uri.as_ref()
    }

    /// Filesystem location, for nodes backed by a `file://` resource.
    #[must_use]
    pub fn fs_path(&self) -> Option<PathBuf> {
        self.uri.as_ref().and_then(url_to_path)
    }

    /// Snapshot of the metadata record.
    #[must_use]
    pub fn data(&self) -> NodeData {
        self.lock().clone()
    }

    #[must_use]
    pub fn name(&self) -> String {
        self.lock().name.clone()
    }

    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.lock().kind
    }

    /// Record a successful expansion.
    pub fn set_children(&self, children: Vec<NodeData>) {
        self.lock().children = Some(children);
    }

    /// Discard the expansion cache, forcing a re-expansion on the next
    /// children query.
    pub fn clear_children_cache(&self) {
        self.lock().children = None;
    }

    /// Whether an expansion is currently cached.
    #[must_use]
    pub fn has_cached_children(&self) -> bool {
        self.lock().children.is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, NodeData> {
        self.data.lock().expect("node data lock poisoned")
    }
}

impl PartialEq for ExplorerNode {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ExplorerNode::LightWeight, ExplorerNode::LightWeight) => true,
            (ExplorerNode::Workspace(a), ExplorerNode::Workspace(b))
            | (ExplorerNode::Project(a), ExplorerNode::Project(b))
            | (ExplorerNode::Data(a), ExplorerNode::Data(b)) => match (a.uri(), b.uri()) {
                (Some(left), Some(right)) => left == right,
                _ => Arc::ptr_eq(a, b),
            },
            _ => false,
        }
    }
}

impl fmt::Debug for ExplorerNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExplorerNode::Workspace(node) => write!(f, "Workspace({})", node.name()),
            ExplorerNode::Project(node) => write!(f, "Project({})", node.name()),
            ExplorerNode::Data(node) => write!(f, "Data({})", node.name()),
            ExplorerNode::LightWeight => write!(f, "LightWeight"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingClient {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ProjectClient for CountingClient {
        async fn projects(&self, _workspace_root: &Url) -> Result<Vec<NodeData>> {
            Ok(Vec::new())
        }

        async fn children(&self, _of: &NodeData) -> Result<Vec<NodeData>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![NodeData::new(
                "com.example",
                Some("file:///ws/demo/src/com/example".to_string()),
                NodeKind::Package,
            )])
        }
    }

    fn package_root() -> ExplorerNode {
        ExplorerNode::from_data(
            NodeData::new("src", Some("file:///ws/demo/src".to_string()), NodeKind::PackageRoot),
            None,
        )
    }

    #[test]
    fn variant_tag_follows_kind() {
        let project = ExplorerNode::from_data(
            NodeData::new("demo", Some("file:///ws/demo".to_string()), NodeKind::Project),
            None,
        );
        assert!(matches!(project, ExplorerNode::Project(_)));
        assert!(matches!(package_root(), ExplorerNode::Data(_)));
    }

    #[test]
    fn fs_path_only_for_file_uris() {
        let source = package_root();
        assert_eq!(
            source.as_data().unwrap().fs_path(),
            Some(PathBuf::from("/ws/demo/src"))
        );

        let archive = ExplorerNode::from_data(
            NodeData::new(
                "List.class",
                Some("jdt://contents/rt.jar/java.util/List.class".to_string()),
                NodeKind::File,
            ),
            None,
        );
        assert!(archive.as_data().unwrap().fs_path().is_none());
    }

    #[tokio::test]
    async fn expansion_is_cached_until_invalidated() {
        let client = CountingClient {
            calls: AtomicUsize::new(0),
        };
        let node = package_root();

        let first = node.get_children(&client).await.unwrap();
        let second = node.get_children(&client).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);

        node.as_data().unwrap().clear_children_cache();
        node.get_children(&client).await.unwrap();
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn children_carry_parent_back_reference() {
        let client = CountingClient {
            calls: AtomicUsize::new(0),
        };
        let node = package_root();
        let children = node.get_children(&client).await.unwrap();
        assert_eq!(children[0].get_parent(), Some(node));
    }

    #[tokio::test]
    async fn placeholder_has_no_children() {
        let client = CountingClient {
            calls: AtomicUsize::new(0),
        };
        let children = ExplorerNode::LightWeight.get_children(&client).await.unwrap();
        assert!(children.is_empty());
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn equality_is_by_uri() {
        let a = package_root();
        let b = package_root();
        assert_eq!(a, b);
        assert_ne!(a, ExplorerNode::LightWeight);
    }
}
