//! The ordered set of open workspace folders.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tokio::sync::broadcast;
use tracing::debug;
use url::Url;

use crate::paths::url_to_path;

/// A change to the open-folder set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FolderChange {
    pub added: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
}

/// Ordered set of open workspace folders, with membership queries and a
/// change broadcast.
///
/// Folder membership is what routes a node into the mutable cache tier:
/// resources under an open folder are subject to file-system invalidation,
/// everything else is not. The host replaces the whole folder list when the
/// user adds or removes folders.
pub struct WorkspaceFolders {
    inner: RwLock<Vec<PathBuf>>,
    tx: broadcast::Sender<FolderChange>,
}

impl WorkspaceFolders {
    #[must_use]
    pub fn new(folders: Vec<PathBuf>) -> Self {
        let (tx, _rx) = broadcast::channel(16);
        Self {
            inner: RwLock::new(folders),
            tx,
        }
    }

    /// Snapshot of the open folders, in the order the host reports them.
    ///
    /// # Panics
    /// Panics if the folder lock was poisoned by a panicking writer.
    #[must_use]
    pub fn folders(&self) -> Vec<PathBuf> {
        self.inner.read().expect("folder lock poisoned").clone()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().expect("folder lock poisoned").is_empty()
    }

    /// The open folder containing `path`, if any.
    #[must_use]
    pub fn folder_of(&self, path: &Path) -> Option<PathBuf> {
        self.inner
            .read()
            .expect("folder lock poisoned")
            .iter()
            .find(|folder| path.starts_with(folder))
            .cloned()
    }

    /// Whether a `file://` URL resolves inside an open folder.
    #[must_use]
    pub fn contains_url(&self, url: &Url) -> bool {
        url_to_path(url).is_some_and(|path| self.folder_of(&path).is_some())
    }

    /// Replace the folder list, broadcasting the difference to subscribers.
    pub fn set_folders(&self, folders: Vec<PathBuf>) {
        let change = {
            let mut inner = self.inner.write().expect("folder lock poisoned");
            let added: Vec<PathBuf> = folders
                .iter()
                .filter(|f| !inner.contains(f))
                .cloned()
                .collect();
            let removed: Vec<PathBuf> = inner
                .iter()
                .filter(|f| !folders.contains(f))
                .cloned()
                .collect();
            *inner = folders;
            FolderChange { added, removed }
        };

        if change.added.is_empty() && change.removed.is_empty() {
            return;
        }
        debug!(added = change.added.len(), removed = change.removed.len(), "workspace folders changed");
        // Send fails only when nobody is subscribed, which is fine.
        let _ = self.tx.send(change);
    }

    /// Subscribe to folder changes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<FolderChange> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_of_finds_enclosing_folder() {
        let folders = WorkspaceFolders::new(vec![PathBuf::from("/ws/alpha"), PathBuf::from("/ws/beta")]);
        assert_eq!(
            folders.folder_of(Path::new("/ws/beta/src/Main.java")),
            Some(PathBuf::from("/ws/beta"))
        );
        assert_eq!(folders.folder_of(Path::new("/elsewhere/Main.java")), None);
    }

    #[test]
    fn contains_url_requires_file_scheme() {
        let folders = WorkspaceFolders::new(vec![PathBuf::from("/ws/alpha")]);
        let inside = Url::parse("file:///ws/alpha/src/Main.java").unwrap();
        let archive = Url::parse("jdt://contents/rt.jar/java.util/List.class").unwrap();
        assert!(folders.contains_url(&inside));
        assert!(!folders.contains_url(&archive));
    }

    #[tokio::test]
    async fn set_folders_broadcasts_difference() {
        let folders = WorkspaceFolders::new(vec![PathBuf::from("/ws/alpha")]);
        let mut rx = folders.subscribe();

        folders.set_folders(vec![PathBuf::from("/ws/beta")]);
        let change = rx.recv().await.unwrap();
        assert_eq!(change.added, vec![PathBuf::from("/ws/beta")]);
        assert_eq!(change.removed, vec![PathBuf::from("/ws/alpha")]);
    }

    #[tokio::test]
    async fn set_folders_with_no_difference_is_silent() {
        let folders = WorkspaceFolders::new(vec![PathBuf::from("/ws/alpha")]);
        let mut rx = folders.subscribe();

        folders.set_folders(vec![PathBuf::from("/ws/alpha")]);
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }
}
