//! Slider I/O facade
//!
//! Wires the slider actor, the connection manager and the reconnect
//! supervisor together and exposes the lifecycle and subscription API.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::AppConfig;
use crate::connection::{ConnectionManager, ConnectionParameters, ConnectionState, MidiTransport};
use crate::error::Result;
use crate::sliders::{DecoderSettings, SliderActorHandle, SliderMoveEvent};
use crate::supervisor::{ReconnectSupervisor, SETTLE_DELAY};

/// Listens for slider positions and republishes clean move events
pub struct SliderIo {
    connection: Arc<Mutex<ConnectionManager>>,
    sliders: SliderActorHandle,
    supervisor: JoinHandle<()>,
}

impl SliderIo {
    /// Build the pipeline from the current configuration and start watching
    /// `config_rx` for reloads. Must be called inside a tokio runtime.
    ///
    /// The connection stays closed until [`SliderIo::start`].
    pub fn new(
        transport: Arc<dyn MidiTransport>,
        config_rx: watch::Receiver<Arc<AppConfig>>,
        verbose: bool,
    ) -> Self {
        Self::with_settle_delay(transport, config_rx, verbose, SETTLE_DELAY)
    }

    pub fn with_settle_delay(
        transport: Arc<dyn MidiTransport>,
        mut config_rx: watch::Receiver<Arc<AppConfig>>,
        verbose: bool,
        settle_delay: Duration,
    ) -> Self {
        let config = config_rx.borrow_and_update().clone();

        let sliders = SliderActorHandle::spawn(
            DecoderSettings::from_config(&config, verbose),
            config.delivery,
        );

        let params = ConnectionParameters::from_config(&config.midi);
        let connection = Arc::new(Mutex::new(ConnectionManager::new(
            transport,
            sliders.clone(),
            params,
        )));

        let supervisor =
            ReconnectSupervisor::new(connection.clone(), sliders.clone(), config_rx, verbose)
                .with_settle_delay(settle_delay)
                .spawn();

        debug!("Created slider i/o instance");

        Self {
            connection,
            sliders,
            supervisor,
        }
    }

    /// Open the configured input port
    pub fn start(&self) -> Result<()> {
        self.connection.lock().start()
    }

    /// Close the input port, if open
    pub fn stop(&self) {
        self.connection.lock().stop();
    }

    /// Fresh queue receiving every future move event
    pub fn subscribe(&self) -> mpsc::Receiver<SliderMoveEvent> {
        self.sliders.subscribe()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.lock().state()
    }

    pub fn connection_params(&self) -> ConnectionParameters {
        self.connection.lock().params().clone()
    }

    pub fn sliders(&self) -> &SliderActorHandle {
        &self.sliders
    }

    /// Stop supervising, close the port and stop the slider actor
    pub async fn shutdown(self) {
        let SliderIo {
            connection,
            sliders,
            supervisor,
        } = self;

        supervisor.abort();
        let _ = supervisor.await;
        let _ = tokio::task::spawn_blocking(move || connection.lock().stop()).await;
        sliders.shutdown();
        debug!("Slider i/o shut down");
    }
}

#[cfg(test)]
mod tests;
