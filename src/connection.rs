//! Input connection lifecycle
//!
//! [`ConnectionManager`] opens and closes the MIDI input through a
//! [`MidiTransport`]; [`midir_transport`] is the system driver.

pub mod manager;
pub mod midir_transport;
#[cfg(test)]
pub(crate) mod testing;
pub mod transport;

pub use manager::{ConnectionManager, ConnectionState};
pub use midir_transport::{discovery, MidirTransport};
pub use transport::{InputPort, MidiTransport, PacketCallback, PortSelector, StopHandle};

use crate::config::MidiConfig;

/// The subset of configuration that requires a reconnect when it changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParameters {
    pub port_index: usize,
    pub device_name: String,
    pub channel: u8,
    pub select_by_name: bool,
}

impl ConnectionParameters {
    pub fn from_config(midi: &MidiConfig) -> Self {
        Self {
            port_index: midi.port,
            device_name: midi.device_name.clone(),
            channel: midi.channel,
            select_by_name: midi.use_device_name,
        }
    }

    pub fn selector(&self) -> PortSelector {
        if self.select_by_name {
            PortSelector::Name(self.device_name.clone())
        } else {
            PortSelector::Index(self.port_index)
        }
    }
}
