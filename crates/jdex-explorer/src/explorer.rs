//! Startup assembly for the explorer subsystem.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use jdex_conf::SettingsHandle;
use jdex_project::{ProjectClient, ServerStatus};
use jdex_workspace::WorkspaceFolders;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::cache::NodeCache;
use crate::provider::DependencyDataProvider;
use crate::sync::SyncHandler;

/// Owns the cache, provider and sync handler for one session.
///
/// Constructed once at startup and torn down on shutdown; there is no global
/// state. Settings changes are applied live: a `refresh_delay_ms` change
/// reinstalls the debounce timer, an `auto_refresh` change enables or
/// disables file watching.
pub struct Explorer {
    provider: Arc<DependencyDataProvider>,
    sync: Arc<Mutex<SyncHandler>>,
    settings_task: JoinHandle<()>,
}

impl Explorer {
    #[must_use]
    pub fn new(
        folders: Arc<WorkspaceFolders>,
        client: Arc<dyn ProjectClient>,
        status: &ServerStatus,
        settings: SettingsHandle,
    ) -> Self {
        let initial = settings.get();
        let cache = Arc::new(NodeCache::new(Arc::clone(&folders)));
        let provider = Arc::new(DependencyDataProvider::new(
            Arc::clone(&cache),
            Arc::clone(&folders),
            client,
            status,
            Duration::from_millis(initial.refresh_delay_ms),
        ));

        let mut sync = SyncHandler::new(
            cache,
            folders,
            settings.clone(),
            provider.refresh_handle(),
        );
        if initial.auto_refresh {
            if let Err(error) = sync.update_file_watcher(true) {
                warn!(%error, "failed to enable file watching");
            }
        }
        let sync = Arc::new(Mutex::new(sync));

        let settings_task = Self::spawn_settings_listener(
            settings,
            initial,
            Arc::clone(&provider),
            Arc::clone(&sync),
        );

        Self {
            provider,
            sync,
            settings_task,
        }
    }

    fn spawn_settings_listener(
        settings: SettingsHandle,
        mut last: jdex_conf::Settings,
        provider: Arc<DependencyDataProvider>,
        sync: Arc<Mutex<SyncHandler>>,
    ) -> JoinHandle<()> {
        let mut rx = settings.subscribe();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let current = rx.borrow_and_update().clone();
                if current.refresh_delay_ms != last.refresh_delay_ms {
                    provider
                        .set_refresh_delay(Duration::from_millis(current.refresh_delay_ms));
                }
                if current.auto_refresh != last.auto_refresh {
                    let result = sync
                        .lock()
                        .expect("sync handler lock poisoned")
                        .update_file_watcher(current.auto_refresh);
                    if let Err(error) = result {
                        warn!(%error, "failed to apply auto_refresh change");
                    }
                }
                last = current;
            }
        })
    }

    #[must_use]
    pub fn provider(&self) -> &Arc<DependencyDataProvider> {
        &self.provider
    }

    /// Whether file watching is currently active.
    ///
    /// # Panics
    /// Panics if the sync handler lock was poisoned.
    #[must_use]
    pub fn is_watching(&self) -> bool {
        self.sync.lock().expect("sync handler lock poisoned").is_enabled()
    }
}

impl Drop for Explorer {
    fn drop(&mut self) {
        self.settings_task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use jdex_conf::Settings;
    use jdex_project::{NodeData, ServerMode};
    use std::path::PathBuf;
    use url::Url;

    struct EmptyClient;

    #[async_trait]
    impl ProjectClient for EmptyClient {
        async fn projects(&self, _workspace_root: &Url) -> Result<Vec<NodeData>> {
            Ok(Vec::new())
        }

        async fn children(&self, _of: &NodeData) -> Result<Vec<NodeData>> {
            Ok(Vec::new())
        }
    }

    fn settings(auto_refresh: bool) -> SettingsHandle {
        SettingsHandle::new(Settings {
            auto_refresh,
            ..Settings::default()
        })
    }

    #[tokio::test]
    async fn auto_refresh_off_leaves_watching_disabled() {
        let folders = Arc::new(WorkspaceFolders::new(vec![PathBuf::from("/nonexistent")]));
        let explorer = Explorer::new(
            folders,
            Arc::new(EmptyClient),
            &ServerStatus::new(ServerMode::Standard),
            settings(false),
        );
        assert!(!explorer.is_watching());
    }

    #[tokio::test]
    async fn auto_refresh_toggle_is_applied() {
        let dir = std::env::temp_dir();
        let folders = Arc::new(WorkspaceFolders::new(vec![dir]));
        let handle = settings(false);
        let explorer = Explorer::new(
            Arc::clone(&folders),
            Arc::new(EmptyClient),
            &ServerStatus::new(ServerMode::Standard),
            handle.clone(),
        );
        assert!(!explorer.is_watching());

        handle.replace(Settings {
            auto_refresh: true,
            ..Settings::default()
        });
        // Give the listener task a chance to run.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(explorer.is_watching());
    }
}
