//! Configuration file watcher for hot reload.
//!
//! Watches the file's parent directory rather than the file itself: editors
//! commonly save by writing a temp file and renaming it over the original,
//! which silently ends a watch placed on the old inode.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::CheckerConfig;

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<CheckerConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for parsed configuration updates.
    /// Updates are not validated yet; the receiver layers its own overrides
    /// first.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<CheckerConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx;
        let path = self.path.clone();
        let file_name = path.file_name().map(|n| n.to_os_string());
        let directory = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        // Save operations emit several events; only forward real changes.
        let last_sent: Mutex<Option<CheckerConfig>> = Mutex::new(None);

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let event = match res {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::error!("Watch error: {:?}", e);
                        return;
                    }
                };

                let touches_file = event
                    .paths
                    .iter()
                    .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                if !touches_file || !(event.kind.is_modify() || event.kind.is_create()) {
                    return;
                }

                match load_config(&path) {
                    Ok(new_config) => {
                        let mut last = last_sent
                            .lock()
                            .unwrap_or_else(std::sync::PoisonError::into_inner);
                        if last.as_ref() == Some(&new_config) {
                            tracing::trace!("Config unchanged, skipping reload");
                            return;
                        }
                        tracing::info!(path = ?path, "Config file changed, reloading");
                        *last = Some(new_config.clone());
                        let _ = tx.send(new_config);
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to reload config: {}. Keeping current configuration.",
                            e
                        );
                    }
                }
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&directory, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}
