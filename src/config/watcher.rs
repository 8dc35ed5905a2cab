//! Route table watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::RouteTableConfig;

/// Watches the route table file and emits every valid new version.
pub struct RouteTableWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<RouteTableConfig>,
}

impl RouteTableWatcher {
    /// Create a watcher and the receiver that observes reloaded configs.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<RouteTableConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Re-read the file now. Invalid files are logged and skipped so the
    /// last good route table stays in force.
    pub fn reload(&self) -> bool {
        reload_into(&self.path, &self.update_tx)
    }

    /// Start watching on notify's background thread. Dropping the returned
    /// handle stops the watch.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!(path = ?path, "Route table change detected, reloading");
                        reload_into(&path, &tx);
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Route table watcher started");
        Ok(watcher)
    }
}

fn reload_into(path: &Path, tx: &mpsc::UnboundedSender<RouteTableConfig>) -> bool {
    match load_config(path) {
        Ok(config) => tx.send(config).is_ok(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to reload route table. Keeping current routes.");
            false
        }
    }
}
