//! Host/workspace boundary for the explorer.
//!
//! This crate wraps everything the explorer consumes from the host editor
//! environment: URL/path conversion, the set of open workspace folders, and
//! the file system watcher that produces change/create/delete events.

mod folders;
pub mod paths;
mod watcher;

pub use folders::{FolderChange, WorkspaceFolders};
pub use watcher::{ExplorerWatcher, WatchConfig, WatchEvent};
