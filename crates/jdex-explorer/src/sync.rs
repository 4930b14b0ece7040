//! Synchronizes the explorer tree with file system changes.
//!
//! A content change only affects a node's own presentation, so it targets the
//! exact cached node for that path. A create or delete changes a parent's
//! child list, so it targets the nearest cached ancestor. Whenever the cache
//! has no relevant entry the request carries no target and falls back to a
//! full refresh; correctness comes from the safe fallback, precision is an
//! optimization.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use camino::Utf8PathBuf;
use jdex_conf::{Settings, SettingsHandle};
use jdex_workspace::paths::path_to_url;
use jdex_workspace::{ExplorerWatcher, WatchConfig, WatchEvent, WorkspaceFolders};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::NodeCache;
use crate::nodes::ExplorerNode;
use crate::provider::RefreshHandle;

/// Routes file events into debounced refresh requests.
///
/// Two states: disabled (no subscriptions) and enabled (folder-change
/// listener plus a watcher over the open folders). Both transitions are
/// idempotent. Disabling drops the subscriptions but does not cancel an
/// in-flight debounce timer; a stale refresh is harmless.
pub struct SyncHandler {
    cache: Arc<NodeCache>,
    folders: Arc<WorkspaceFolders>,
    settings: SettingsHandle,
    refresh: RefreshHandle,
    subscriptions: Option<Vec<JoinHandle<()>>>,
}

impl SyncHandler {
    #[must_use]
    pub fn new(
        cache: Arc<NodeCache>,
        folders: Arc<WorkspaceFolders>,
        settings: SettingsHandle,
        refresh: RefreshHandle,
    ) -> Self {
        Self {
            cache,
            folders,
            settings,
            refresh,
            subscriptions: None,
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.subscriptions.is_some()
    }

    /// Apply the `auto_refresh` setting: enable or disable watching.
    pub fn update_file_watcher(&mut self, auto_refresh: bool) -> Result<()> {
        if auto_refresh {
            self.enable()
        } else {
            self.disable();
            Ok(())
        }
    }

    fn enable(&mut self) -> Result<()> {
        if self.subscriptions.is_some() {
            return Ok(());
        }

        // Folders added or removed invalidate everything.
        let mut folder_rx = self.folders.subscribe();
        let refresh = self.refresh.clone();
        let folder_task = tokio::spawn(async move {
            while folder_rx.recv().await.is_ok() {
                refresh.request(true, None);
            }
        });

        let roots: Vec<Utf8PathBuf> = self
            .folders
            .folders()
            .into_iter()
            .filter_map(|folder| Utf8PathBuf::from_path_buf(folder).ok())
            .collect();
        let watcher = ExplorerWatcher::new(WatchConfig {
            roots,
            ..WatchConfig::default()
        })?;

        let cache = Arc::clone(&self.cache);
        let settings = self.settings.clone();
        let refresh = self.refresh.clone();
        let watch_task = tokio::spawn(async move {
            let mut tick = tokio::time::interval(Duration::from_millis(50));
            loop {
                tick.tick().await;
                for event in watcher.try_recv_events() {
                    route_event(&event, &cache, &settings.get(), &refresh);
                }
            }
        });

        debug!("file watch sync enabled");
        self.subscriptions = Some(vec![folder_task, watch_task]);
        Ok(())
    }

    /// Unregister and discard all subscriptions; idempotent.
    pub fn disable(&mut self) {
        if let Some(tasks) = self.subscriptions.take() {
            for task in tasks {
                task.abort();
            }
            debug!("file watch sync disabled");
        }
    }

    /// Route one watcher event. Normally driven by the enabled
    /// subscriptions; exposed so hosts with their own watch registration can
    /// feed events directly.
    pub fn handle_event(&self, event: &WatchEvent) {
        route_event(event, &self.cache, &self.settings.get(), &self.refresh);
    }
}

impl Drop for SyncHandler {
    fn drop(&mut self) {
        self.disable();
    }
}

fn route_event(
    event: &WatchEvent,
    cache: &NodeCache,
    settings: &Settings,
    refresh: &RefreshHandle,
) {
    if let Some(target) = classify_event(event, cache, settings) {
        refresh.request(true, target);
    }
}

/// Map an event to a refresh decision: `None` = ignore, `Some(target)` =
/// request a debounced refresh for `target` (`Some(None)` = untargeted).
fn classify_event(
    event: &WatchEvent,
    cache: &NodeCache,
    settings: &Settings,
) -> Option<Option<ExplorerNode>> {
    match event {
        WatchEvent::Modified(path) => {
            // Content changes can only reshape the tree through type
            // members, and only when members are displayed.
            if path.extension() != Some("java") || !settings.show_members {
                return None;
            }
            let target = path_to_url(path.as_std_path())
                .and_then(|url| cache.data_node(&url));
            Some(target)
        }
        WatchEvent::Created(path) | WatchEvent::Deleted(path) => {
            let target = path_to_url(path.as_std_path())
                .and_then(|url| cache.find_parent_explorer_node(&url));
            if target.is_none() {
                warn!(%path, "no cached ancestor, falling back to full refresh");
            }
            Some(target)
        }
    }
}
