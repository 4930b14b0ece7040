//! Structural query interface to the language server.

use anyhow::Result;
use async_trait::async_trait;
use url::Url;

use crate::node::NodeData;

/// Structural queries the explorer needs from the language server.
///
/// Implementations wrap whatever transport the host uses to reach the server.
/// Both queries are read-only and may be retried freely; the explorer treats a
/// failure as a failed expansion, not as corruption.
#[async_trait]
pub trait ProjectClient: Send + Sync {
    /// List the projects rooted under an open workspace folder, in the order
    /// the server reports them.
    async fn projects(&self, workspace_root: &Url) -> Result<Vec<NodeData>>;

    /// List the children of a previously reported node, in display order.
    async fn children(&self, of: &NodeData) -> Result<Vec<NodeData>>;
}
