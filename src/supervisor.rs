//! Reconnect supervisor
//!
//! Reacts to configuration reloads: every reload schedules a slider table
//! reset so each slider's next report is re-broadcast, and a change of
//! connection parameters cycles the input connection.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::connection::{ConnectionManager, ConnectionParameters};
use crate::sliders::{DecoderSettings, SliderActorHandle};

/// Grace period before the post-reload reset, and between stop and
/// restart. Downstream consumers re-acquire their targets on reload and must
/// not see the re-broadcast before that settles.
pub const SETTLE_DELAY: Duration = Duration::from_millis(50);

pub struct ReconnectSupervisor {
    connection: Arc<Mutex<ConnectionManager>>,
    sliders: SliderActorHandle,
    config_rx: watch::Receiver<Arc<AppConfig>>,
    verbose: bool,
    settle_delay: Duration,
}

impl ReconnectSupervisor {
    pub fn new(
        connection: Arc<Mutex<ConnectionManager>>,
        sliders: SliderActorHandle,
        config_rx: watch::Receiver<Arc<AppConfig>>,
        verbose: bool,
    ) -> Self {
        Self {
            connection,
            sliders,
            config_rx,
            verbose,
            settle_delay: SETTLE_DELAY,
        }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Run the supervisor loop on the current runtime
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        debug!("Reconnect supervisor started");

        while self.config_rx.changed().await.is_ok() {
            let config = self.config_rx.borrow_and_update().clone();
            self.on_config_reloaded(&config).await;
        }

        debug!("Configuration feed closed, reconnect supervisor stopping");
    }

    async fn on_config_reloaded(&self, config: &AppConfig) {
        self.schedule_reset();

        self.sliders.set_delivery_policy(config.delivery);

        let next = ConnectionParameters::from_config(&config.midi);
        let changed = *self.connection.lock().params() != next;

        if !changed {
            self.sliders
                .update_settings(DecoderSettings::from_config(config, self.verbose));
            return;
        }

        info!("Detected change in connection parameters, attempting to renew connection");

        // driver open and close may block, keep them off the runtime threads
        let connection = self.connection.clone();
        let stopped = tokio::task::spawn_blocking(move || {
            let mut connection = connection.lock();
            connection.stop();
            connection.set_params(next);
        })
        .await;
        if let Err(e) = stopped {
            error!(error = %e, "Connection stop task failed");
            return;
        }

        self.sliders
            .update_settings(DecoderSettings::from_config(config, self.verbose));

        // let the port fully release
        tokio::time::sleep(self.settle_delay).await;

        let connection = self.connection.clone();
        match tokio::task::spawn_blocking(move || connection.lock().start()).await {
            Ok(Ok(())) => debug!("Renewed connection successfully"),
            Ok(Err(e)) => warn!(error = %e, "Failed to renew connection after parameter change"),
            Err(e) => error!(error = %e, "Connection start task failed"),
        }
    }

    fn schedule_reset(&self) {
        let sliders = self.sliders.clone();
        let delay = self.settle_delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            sliders.reset();
        });
    }
}
