//! Tree data provider: root set, debounced refresh, change notifications.
//!
//! All refresh requests flow through a single trailing-edge debounce task:
//! every request records the latest target and resets one pending timer, and
//! when the timer settles the cache is invalidated once and a single change
//! notification is emitted. A burst of file events therefore costs one
//! invalidation, at the price of the broadest recently-requested scope.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use jdex_project::{NodeData, NodeKind, ProjectClient, ServerMode, ServerStatus};
use jdex_workspace::paths::path_to_url;
use jdex_workspace::WorkspaceFolders;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::cache::NodeCache;
use crate::error::ExplorerError;
use crate::nodes::ExplorerNode;

/// A change notification for the display layer. `None` means the whole tree
/// changed.
pub type ChangeEvent = Option<ExplorerNode>;

enum TriggerMsg {
    Request { target: Option<ExplorerNode> },
    Flush,
    SetDelay(Duration),
}

/// Cheap, cloneable way to request refreshes, handed to the sync handler.
#[derive(Clone)]
pub struct RefreshHandle {
    tx: mpsc::UnboundedSender<TriggerMsg>,
}

impl RefreshHandle {
    /// Enqueue a refresh for `target` (`None` = whole tree). With
    /// `debounce` false the pending trigger is flushed immediately, which is
    /// what a user-invoked manual refresh does.
    pub fn request(&self, debounce: bool, target: Option<ExplorerNode>) {
        trace!(?target, debounce, "refresh requested");
        let _ = self.tx.send(TriggerMsg::Request { target });
        if !debounce {
            let _ = self.tx.send(TriggerMsg::Flush);
        }
    }

    /// Reinstall the debounce timer with a new settle delay. Cancels any
    /// pending trigger; delay changes are rare administrative actions, not
    /// concurrent with event bursts.
    pub fn set_delay(&self, delay: Duration) {
        let _ = self.tx.send(TriggerMsg::SetDelay(delay));
    }

    /// A handle whose requests go nowhere.
    #[cfg(test)]
    pub(crate) fn disconnected() -> Self {
        let (tx, _rx) = mpsc::unbounded_channel();
        Self { tx }
    }
}

struct Shared {
    cache: Arc<NodeCache>,
    roots: Mutex<Option<Vec<ExplorerNode>>>,
    changes: broadcast::Sender<ChangeEvent>,
}

impl Shared {
    /// The debounce-settled action: invalidate, then notify once.
    fn do_refresh(&self, target: Option<ExplorerNode>) {
        debug!(?target, "refreshing");
        self.cache.remove_mutable_node_children(target.as_ref());
        if target.is_none() {
            *self.roots.lock().expect("root set lock poisoned") = None;
        }
        // Send fails only when the display layer is not listening.
        let _ = self.changes.send(target);
    }
}

/// The explorer's tree controller.
///
/// Owns the root-node set, answers child-expansion queries against the
/// language server, and drives cache invalidation through the debounce
/// trigger. The display layer consumes [`DependencyDataProvider::subscribe`]
/// and re-queries children lazily after each change notification.
pub struct DependencyDataProvider {
    shared: Arc<Shared>,
    folders: Arc<WorkspaceFolders>,
    client: Arc<dyn ProjectClient>,
    mode: watch::Receiver<ServerMode>,
    handle: RefreshHandle,
}

impl DependencyDataProvider {
    #[must_use]
    pub fn new(
        cache: Arc<NodeCache>,
        folders: Arc<WorkspaceFolders>,
        client: Arc<dyn ProjectClient>,
        status: &ServerStatus,
        refresh_delay: Duration,
    ) -> Self {
        let (changes, _) = broadcast::channel(64);
        let shared = Arc::new(Shared {
            cache,
            roots: Mutex::new(None),
            changes,
        });

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(debounce_loop(Arc::clone(&shared), rx, refresh_delay));

        Self {
            shared,
            folders,
            client,
            mode: status.subscribe(),
            handle: RefreshHandle { tx },
        }
    }

    /// Request a refresh; see [`RefreshHandle::request`].
    pub fn refresh(&self, debounce: bool, node: Option<ExplorerNode>) {
        self.handle.request(debounce, node);
    }

    /// Reconfigure the debounce settle delay at runtime.
    pub fn set_refresh_delay(&self, delay: Duration) {
        self.handle.set_delay(delay);
    }

    /// Handle for other components (the sync handler) to request refreshes.
    #[must_use]
    pub fn refresh_handle(&self) -> RefreshHandle {
        self.handle.clone()
    }

    /// Subscribe to change notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.shared.changes.subscribe()
    }

    /// The lazy-tree children query.
    ///
    /// While the server is switching modes this suspends until the next mode
    /// transition; other events keep being processed meanwhile. If the server
    /// then still cannot answer structural queries, a single placeholder node
    /// is returned. With no element (or with roots not yet computed) the root
    /// set is computed and cached; otherwise the element is expanded and each
    /// returned child saved into the cache.
    pub async fn get_children(
        &self,
        element: Option<&ExplorerNode>,
    ) -> Result<Vec<ExplorerNode>, ExplorerError> {
        let mut mode = self.mode.clone();
        if mode.borrow().is_switching() {
            // Single-shot wait; a closed status channel leaves the last
            // known mode in place.
            let _ = mode.changed().await;
        }
        if !mode.borrow().is_standard() {
            return Ok(vec![ExplorerNode::LightWeight]);
        }

        let roots_computed = self
            .shared
            .roots
            .lock()
            .expect("root set lock poisoned")
            .is_some();

        match element {
            Some(element) if roots_computed => {
                let children = element.get_children(self.client.as_ref()).await?;
                self.shared.cache.save_nodes(&children);
                Ok(children)
            }
            _ => self.root_nodes().await,
        }
    }

    /// Back-reference to the parent node; relation only.
    #[must_use]
    pub fn get_parent(&self, element: &ExplorerNode) -> Option<ExplorerNode> {
        element.get_parent()
    }

    /// Compute and cache the root set.
    ///
    /// One workspace node per folder when several are open; one project node
    /// per server-reported project when exactly one is open. No open folder
    /// is a failure, not an empty tree.
    async fn root_nodes(&self) -> Result<Vec<ExplorerNode>, ExplorerError> {
        let folders = self.folders.folders();
        if folders.is_empty() {
            return Err(ExplorerError::NoWorkspaceFolder);
        }

        let roots: Vec<ExplorerNode> = if folders.len() > 1 {
            folders
                .iter()
                .map(|folder| {
                    ExplorerNode::from_data(
                        NodeData::new(
                            folder_name(folder),
                            path_to_url(folder).map(|url| url.to_string()),
                            NodeKind::Workspace,
                        ),
                        None,
                    )
                })
                .collect()
        } else {
            let root_url = path_to_url(&folders[0]).ok_or_else(|| {
                ExplorerError::Client(anyhow::anyhow!(
                    "workspace folder has no valid URL: {}",
                    folders[0].display()
                ))
            })?;
            let projects = self.client.projects(&root_url).await?;
            projects
                .into_iter()
                .map(|project| ExplorerNode::from_data(project, None))
                .collect()
        };

        debug!(count = roots.len(), "computed root nodes");
        *self.shared.roots.lock().expect("root set lock poisoned") = Some(roots.clone());
        Ok(roots)
    }
}

fn folder_name(folder: &Path) -> String {
    folder
        .file_name()
        .map_or_else(|| folder.display().to_string(), |name| name.to_string_lossy().into_owned())
}

/// The debounce trigger: one pending timer, latest target wins.
async fn debounce_loop(
    shared: Arc<Shared>,
    mut rx: mpsc::UnboundedReceiver<TriggerMsg>,
    mut delay: Duration,
) {
    let mut pending: Option<Option<ExplorerNode>> = None;
    let mut deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            msg = rx.recv() => match msg {
                Some(TriggerMsg::Request { target }) => {
                    // Trailing edge: every request resets the single timer
                    // and records the most recent target.
                    pending = Some(target);
                    deadline = Some(Instant::now() + delay);
                }
                Some(TriggerMsg::Flush) => {
                    deadline = None;
                    if let Some(target) = pending.take() {
                        shared.do_refresh(target);
                    }
                }
                Some(TriggerMsg::SetDelay(new_delay)) => {
                    delay = new_delay;
                    pending = None;
                    deadline = None;
                }
                None => break,
            },
            () = sleep_until_deadline(deadline), if deadline.is_some() => {
                deadline = None;
                if let Some(target) = pending.take() {
                    shared.do_refresh(target);
                }
            }
        }
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
