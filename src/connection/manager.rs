//! Connection state machine: Closed -> start -> Open -> stop -> Closed

use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use super::transport::{MidiTransport, PacketCallback, StopHandle};
use super::ConnectionParameters;
use crate::error::{ConnectionError, Result};
use crate::midi::{format_hex, MidiMessage};
use crate::sliders::SliderActorHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Closed,
    Open,
}

/// Owns the transport handle and feeds inbound messages to the slider actor
pub struct ConnectionManager {
    transport: Arc<dyn MidiTransport>,
    sliders: SliderActorHandle,
    params: ConnectionParameters,
    state: ConnectionState,
    stop_handle: Option<Box<dyn StopHandle>>,
    port_name: Option<String>,
}

impl ConnectionManager {
    pub fn new(
        transport: Arc<dyn MidiTransport>,
        sliders: SliderActorHandle,
        params: ConnectionParameters,
    ) -> Self {
        Self {
            transport,
            sliders,
            params,
            state: ConnectionState::Closed,
            stop_handle: None,
            port_name: None,
        }
    }

    /// Open the configured port and start listening.
    ///
    /// A second start without a stop in between is refused. On any failure
    /// the manager stays Closed.
    pub fn start(&mut self) -> Result<()> {
        if self.state == ConnectionState::Open {
            warn!("Already connected, can't start another without closing first");
            return Err(ConnectionError::AlreadyConnected);
        }

        let selector = self.params.selector();

        let port = self.transport.open(&selector).map_err(|source| {
            warn!(%selector, error = %source, "Failed to open midi port");
            ConnectionError::Open {
                selector: selector.clone(),
                source,
            }
        })?;
        let port_name = port.name().to_string();

        let sliders = self.sliders.clone();
        let callback: PacketCallback = Box::new(move |data: &[u8]| match MidiMessage::parse(data) {
            Some(message) => sliders.push_message(message),
            None => trace!(bytes = %format_hex(data), "Unparseable MIDI message"),
        });

        let stop_handle = port.listen(callback).map_err(|source| {
            warn!(%selector, error = %source, "Failed to listen on midi port");
            ConnectionError::Listen {
                selector: selector.clone(),
                source,
            }
        })?;

        info!(port = %port_name, %selector, channel = self.params.channel, "Connected");
        self.stop_handle = Some(stop_handle);
        self.port_name = Some(port_name);
        self.state = ConnectionState::Open;

        Ok(())
    }

    /// Release the port if one is open
    pub fn stop(&mut self) {
        if self.state == ConnectionState::Closed {
            debug!("Not currently connected, nothing to stop");
            return;
        }

        debug!(port = ?self.port_name, "Shutting down midi connection");
        if let Some(handle) = self.stop_handle.take() {
            handle.stop();
            debug!("Stopped listening");
        }

        self.port_name = None;
        self.state = ConnectionState::Closed;
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn params(&self) -> &ConnectionParameters {
        &self.params
    }

    /// Adopt new parameters; they take effect on the next `start()`
    pub fn set_params(&mut self, params: ConnectionParameters) {
        self.params = params;
    }

    pub fn port_name(&self) -> Option<&str> {
        self.port_name.as_deref()
    }
}
