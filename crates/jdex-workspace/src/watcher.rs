//! File system watching for explorer synchronization.
//!
//! This module detects external changes to watched Java sources and source
//! roots. It uses cross-platform file watching with a short batching window so
//! bulk operations arrive as one batch of events.

use anyhow::{anyhow, Result};
use camino::Utf8PathBuf;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::{
    collections::HashMap,
    sync::mpsc,
    thread,
    time::{Duration, Instant},
};

/// Event types that can occur in the file system.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WatchEvent {
    /// A file was modified (content changed)
    Modified(Utf8PathBuf),
    /// A new file was created
    Created(Utf8PathBuf),
    /// A file was deleted
    Deleted(Utf8PathBuf),
}

impl WatchEvent {
    /// The path the event refers to.
    #[must_use]
    pub fn path(&self) -> &Utf8PathBuf {
        match self {
            WatchEvent::Modified(path) | WatchEvent::Created(path) | WatchEvent::Deleted(path) => {
                path
            }
        }
    }
}

/// Configuration for the file watcher.
///
/// [`WatchConfig`] controls what directories to watch and how to filter
/// events before they reach the explorer.
#[derive(Clone, Debug)]
pub struct WatchConfig {
    /// Whether file watching is enabled
    pub enabled: bool,
    /// Root directories to watch recursively
    pub roots: Vec<Utf8PathBuf>,
    /// Batching window in milliseconds (collect events for this duration before delivery)
    pub batch_ms: u64,
    /// File patterns to include (e.g., ["*.java", "src"])
    pub include_patterns: Vec<String>,
    /// File patterns to exclude (e.g., [".git", "target"])
    pub exclude_patterns: Vec<String>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            roots: Vec::new(),
            batch_ms: 50,
            // Java sources plus source-root structural paths, matching the
            // explorer's interest in tree-shape changes
            include_patterns: vec!["*.java".to_string(), "src".to_string()],
            exclude_patterns: vec![
                ".git".to_string(),
                "target".to_string(),
                "node_modules".to_string(),
                ".settings".to_string(),
            ],
        }
    }
}

/// File system watcher feeding the explorer's sync handler.
///
/// [`ExplorerWatcher`] monitors the configured roots and provides a channel
/// of batched events. Filtering and batching happen on a background thread;
/// dropping the watcher stops it.
pub struct ExplorerWatcher {
    /// The underlying file system watcher
    _watcher: RecommendedWatcher,
    /// Receiver for processed watch events
    rx: mpsc::Receiver<Vec<WatchEvent>>,
    /// Handle to the background processing thread
    _handle: thread::JoinHandle<()>,
}

impl ExplorerWatcher {
    /// Create a new file watcher with the given configuration.
    ///
    /// This starts watching the specified root directories and begins
    /// processing events in a background thread.
    pub fn new(config: WatchConfig) -> Result<Self> {
        if !config.enabled {
            return Err(anyhow!("File watching is disabled"));
        }

        let (event_tx, event_rx) = mpsc::channel();
        let (watch_tx, watch_rx) = mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                if let Ok(event) = res {
                    let _ = event_tx.send(event);
                }
            },
            Config::default(),
        )?;

        for root in &config.roots {
            let std_path = root.as_std_path();
            if std_path.exists() {
                watcher.watch(std_path, RecursiveMode::Recursive)?;
            }
        }

        let handle = thread::spawn(move || {
            Self::process_events(&event_rx, &watch_tx, &config);
        });

        Ok(Self {
            _watcher: watcher,
            rx: watch_rx,
            _handle: handle,
        })
    }

    /// Get the next batch of processed watch events.
    ///
    /// Non-blocking; returns an empty vector when nothing is pending.
    #[must_use]
    pub fn try_recv_events(&self) -> Vec<WatchEvent> {
        self.rx.try_recv().unwrap_or_default()
    }

    /// Background thread function for processing raw file system events.
    ///
    /// Handles filtering, per-path coalescing and batching before sending
    /// batches to the consumer.
    fn process_events(
        event_rx: &mpsc::Receiver<Event>,
        watch_tx: &mpsc::Sender<Vec<WatchEvent>>,
        config: &WatchConfig,
    ) {
        let mut pending_events: HashMap<Utf8PathBuf, WatchEvent> = HashMap::new();
        let mut last_batch_time = Instant::now();
        let batch_duration = Duration::from_millis(config.batch_ms);

        loop {
            match event_rx.recv_timeout(Duration::from_millis(25)) {
                Ok(event) => {
                    if let Some(watch_events) = Self::convert_notify_event(event, config) {
                        for watch_event in watch_events {
                            let path = watch_event.path().clone();
                            // Only keep the latest event for each path
                            pending_events.insert(path, watch_event);
                        }
                    }
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    // Timeout - check if we should flush pending events
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    break;
                }
            }

            if !pending_events.is_empty() && last_batch_time.elapsed() >= batch_duration {
                let events: Vec<WatchEvent> = pending_events.values().cloned().collect();
                if watch_tx.send(events).is_err() {
                    // Consumer disconnected, exit
                    break;
                }
                pending_events.clear();
                last_batch_time = Instant::now();
            }
        }
    }

    /// Convert a [`notify::Event`] into our [`WatchEvent`] format.
    fn convert_notify_event(event: Event, config: &WatchConfig) -> Option<Vec<WatchEvent>> {
        let mut watch_events = Vec::new();

        for path in event.paths {
            if let Ok(utf8_path) = Utf8PathBuf::try_from(path) {
                if Self::should_include_path(&utf8_path, config) {
                    match event.kind {
                        EventKind::Create(_) => watch_events.push(WatchEvent::Created(utf8_path)),
                        EventKind::Modify(_) => watch_events.push(WatchEvent::Modified(utf8_path)),
                        EventKind::Remove(_) => watch_events.push(WatchEvent::Deleted(utf8_path)),
                        _ => {}
                    }
                }
            }
        }

        if watch_events.is_empty() {
            None
        } else {
            Some(watch_events)
        }
    }

    fn should_include_path(path: &Utf8PathBuf, config: &WatchConfig) -> bool {
        let path_str = path.as_str();

        // Check exclude patterns first
        for pattern in &config.exclude_patterns {
            if path_str.contains(pattern) {
                return false;
            }
        }

        // If no include patterns, include everything (that's not excluded)
        if config.include_patterns.is_empty() {
            return true;
        }

        for pattern in &config.include_patterns {
            if let Some(extension) = pattern.strip_prefix("*.") {
                if path_str.ends_with(extension) {
                    return true;
                }
            } else if path_str.contains(pattern) {
                return true;
            }
        }

        false
    }
}

impl Drop for ExplorerWatcher {
    fn drop(&mut self) {
        // The background thread exits when the event channel is dropped
    }
}
