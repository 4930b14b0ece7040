//! Incremental explorer tree for a Java workspace.
//!
//! The tree is lazily populated from the language server and kept consistent
//! with the file system through an incremental cache: a path-segment trie for
//! workspace nodes plus a flat map for read-only archive members. File events
//! are mapped through the cache to the minimal set of nodes whose expansion
//! must be recomputed, and refreshes are coalesced with a trailing-edge
//! debounce before a single change notification reaches the display layer.

mod cache;
mod error;
mod explorer;
mod nodes;
mod provider;
mod sync;
mod trie;

pub use cache::NodeCache;
pub use error::ExplorerError;
pub use explorer::Explorer;
pub use nodes::{DataNode, ExplorerNode};
pub use provider::{ChangeEvent, DependencyDataProvider, RefreshHandle};
pub use sync::SyncHandler;
pub use trie::{Trie, TrieNode};
