//! Node descriptors exchanged with the language server.

use serde::{Deserialize, Serialize};

/// Structural classification of a node descriptor.
///
/// [`NodeKind`] mirrors the vocabulary the language server uses when listing
/// projects and expanding containers. The explorer routes nodes by kind when
/// materializing tree nodes; it never inspects file contents itself.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    /// An open workspace folder (only used when multiple folders are open)
    Workspace,
    /// A Java project
    Project,
    /// A classpath container (JRE, referenced libraries, ...)
    Container,
    /// A package root (source folder or archive)
    PackageRoot,
    /// A Java package
    Package,
    /// A primary type inside a compilation unit
    Primary,
    /// A plain folder
    Folder,
    /// A plain file
    File,
}

/// Metadata record for a single explorer node, as reported by the server.
///
/// `children` is the expansion cache: `None` until the node has been expanded,
/// then the exact result of the last successful expansion. Structural
/// invalidation clears this field rather than discarding the node, which is
/// what forces a re-expansion on the next children query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    /// Display name
    pub name: String,
    /// Absolute resource identifier; absent for synthetic containers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Project-relative path, when the server reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub kind: NodeKind,
    /// Cached result of the last expansion; `None` = not yet expanded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<NodeData>>,
}

impl NodeData {
    /// Create an unexpanded descriptor with just a name, uri and kind.
    #[must_use]
    pub fn new(name: impl Into<String>, uri: Option<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            uri,
            path: None,
            kind,
            children: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_wire_descriptor() {
        let json = r#"{
            "name": "com.example.app",
            "uri": "file:///ws/demo/src/main/java/com/example/app",
            "kind": "package"
        }"#;
        let data: NodeData = serde_json::from_str(json).unwrap();
        assert_eq!(data.kind, NodeKind::Package);
        assert_eq!(data.name, "com.example.app");
        assert!(data.children.is_none());
    }

    #[test]
    fn deserializes_nested_children() {
        let json = r#"{
            "name": "demo",
            "uri": "file:///ws/demo",
            "kind": "project",
            "children": [
                {"name": "src", "uri": "file:///ws/demo/src", "kind": "packageRoot"}
            ]
        }"#;
        let data: NodeData = serde_json::from_str(json).unwrap();
        let children = data.children.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].kind, NodeKind::PackageRoot);
    }

    #[test]
    fn container_without_uri() {
        let json = r#"{"name": "Referenced Libraries", "kind": "container"}"#;
        let data: NodeData = serde_json::from_str(json).unwrap();
        assert!(data.uri.is_none());
        assert_eq!(data.kind, NodeKind::Container);
    }
}
