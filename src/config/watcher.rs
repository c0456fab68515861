//! Configuration file watcher for hot-reload support
//!
//! Reloaded configurations are published on a `watch` channel: receivers get
//! the latest value plus a change notification per reload.

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::AppConfig;

/// Delay between a modify event and the reload, so partial writes settle
const RELOAD_DEBOUNCE: Duration = Duration::from_millis(100);

/// Config watcher that monitors file changes and publishes reloads
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    tx: Arc<watch::Sender<Arc<AppConfig>>>,
}

impl ConfigWatcher {
    /// Load the file and start watching it
    pub async fn new(config_path: String) -> Result<Self> {
        let initial_config = AppConfig::load(&config_path)
            .await
            .context("Failed to load initial config")?;

        let (tx, _rx) = watch::channel(Arc::new(initial_config));
        let tx = Arc::new(tx);

        let config_path_clone = config_path.clone();
        let tx_clone = tx.clone();

        // notify callbacks run on their own OS thread, outside tokio
        let runtime_handle = tokio::runtime::Handle::current();

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    if !matches!(event.kind, EventKind::Modify(_)) {
                        return;
                    }
                    debug!("Config file modified: {:?}", event.paths);

                    let config_path = config_path_clone.clone();
                    let tx = tx_clone.clone();

                    runtime_handle.spawn(async move {
                        tokio::time::sleep(RELOAD_DEBOUNCE).await;

                        match AppConfig::load(&config_path).await {
                            Ok(new_config) => {
                                info!("Configuration reloaded successfully");
                                tx.send_replace(Arc::new(new_config));
                            }
                            Err(e) => {
                                warn!("Failed to reload config (keeping old config): {:#}", e);
                            }
                        }
                    });
                }
                Err(e) => {
                    error!("Watch error: {}", e);
                }
            }
        })?;

        watcher
            .watch(Path::new(&config_path), RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch config file: {}", config_path))?;

        info!("Config file watcher started for: {}", config_path);

        Ok(Self {
            _watcher: watcher,
            tx,
        })
    }

    /// Latest loaded configuration
    pub fn current(&self) -> Arc<AppConfig> {
        self.tx.borrow().clone()
    }

    /// New receiver; it only reports reloads that happen after this call
    pub fn subscribe(&self) -> watch::Receiver<Arc<AppConfig>> {
        self.tx.subscribe()
    }
}
