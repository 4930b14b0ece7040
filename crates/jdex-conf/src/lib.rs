use std::path::Path;

use config::{Config, ConfigError as ExternalConfigError, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration build/deserialize error")]
    Config(#[from] ExternalConfigError),
}

/// Explorer settings.
///
/// Loaded from `jdex.toml` / `.jdex.toml` in the workspace root, layered over
/// an optional user-level config file. Project files take precedence over the
/// user file, and `jdex.toml` over `.jdex.toml`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Refresh the tree automatically when watched files change
    pub auto_refresh: bool,
    /// Show type members inside compilation units; when off, content-only
    /// changes to source files cannot affect the tree shape
    pub show_members: bool,
    /// Debounce settle delay for refresh requests, in milliseconds
    pub refresh_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_refresh: true,
            show_members: false,
            refresh_delay_ms: 2000,
        }
    }
}

impl Settings {
    pub fn new(workspace_root: &Path) -> Result<Self, ConfigError> {
        let user_config_file = ProjectDirs::from("com.github", "jdex", "jdex")
            .map(|proj_dirs| proj_dirs.config_dir().join("jdex.toml"));

        Self::load_from_paths(workspace_root, user_config_file.as_deref())
    }

    fn load_from_paths(
        workspace_root: &Path,
        user_config_path: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = user_config_path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }

        builder = builder.add_source(
            File::from(workspace_root.join(".jdex.toml"))
                .format(FileFormat::Toml)
                .required(false),
        );

        builder = builder.add_source(
            File::from(workspace_root.join("jdex.toml"))
                .format(FileFormat::Toml)
                .required(false),
        );

        let config = builder.build()?;
        let settings = config.try_deserialize()?;
        Ok(settings)
    }
}

/// Shared, hot-swappable settings.
///
/// The host replaces the whole [`Settings`] value when configuration changes;
/// consumers either read the current value or subscribe to be notified of
/// replacements. Subscribers receive a notification only when the value
/// actually changed.
#[derive(Clone)]
pub struct SettingsHandle {
    tx: std::sync::Arc<watch::Sender<Settings>>,
}

impl SettingsHandle {
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        let (tx, _rx) = watch::channel(settings);
        Self {
            tx: std::sync::Arc::new(tx),
        }
    }

    /// Snapshot of the current settings.
    #[must_use]
    pub fn get(&self) -> Settings {
        self.tx.borrow().clone()
    }

    /// Replace the current settings, notifying subscribers on change.
    pub fn replace(&self, settings: Settings) {
        if self.tx.send_if_modified(|current| {
            let changed = *current != settings;
            *current = settings;
            changed
        }) {
            debug!("settings updated");
        }
    }

    /// Subscribe to settings replacements.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Settings> {
        self.tx.subscribe()
    }
}

impl Default for SettingsHandle {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
