//! Input file watcher for recompilation on change.

use std::path::{Path, PathBuf};
use std::time::Duration;
use notify::{Watcher, RecursiveMode, Event, RecommendedWatcher, Config};
use tokio::sync::mpsc;
use crate::config::loader::{load_inputs, CompilerInputs};

/// A watcher that monitors the configuration and site catalog for changes.
pub struct InputWatcher {
    config_path: PathBuf,
    sites_path: PathBuf,
    update_tx: mpsc::UnboundedSender<CompilerInputs>,
}

impl InputWatcher {
    /// Create a new InputWatcher.
    ///
    /// Returns the watcher and a receiver for validated inputs.
    pub fn new(config_path: &Path, sites_path: &Path) -> (Self, mpsc::UnboundedReceiver<CompilerInputs>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (Self {
            config_path: config_path.to_path_buf(),
            sites_path: sites_path.to_path_buf(),
            update_tx,
        }, update_rx)
    }

    /// Start watching both files in a background thread.
    ///
    /// The returned watcher must be kept alive for events to flow.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let config_path = self.config_path.clone();
        let sites_path = self.sites_path.clone();

        let mut watcher = RecommendedWatcher::new(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!(paths = ?event.paths, "Input change detected, reloading...");
                        match load_inputs(&config_path, &sites_path) {
                            Ok(inputs) => {
                                let _ = tx.send(inputs);
                            }
                            Err(e) => {
                                tracing::error!("Failed to reload inputs: {}. Keeping previous artifacts.", e);
                            }
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            }
        }, Config::default().with_poll_interval(Duration::from_secs(2)))?;

        watcher.watch(&self.config_path, RecursiveMode::NonRecursive)?;
        watcher.watch(&self.sites_path, RecursiveMode::NonRecursive)?;

        tracing::info!(config = ?self.config_path, sites = ?self.sites_path, "Input watcher started");
        Ok(watcher)
    }
}
