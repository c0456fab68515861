//! Seam between the connection manager and a MIDI input driver
//!
//! Opening resolves a port; listening installs the per-message callback and
//! yields the handle that releases the port again.

use std::fmt;

use crate::error::TransportError;

/// How to pick the input port
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortSelector {
    /// Position in the driver's port list
    Index(usize),
    /// Case-insensitive substring of the port name
    Name(String),
}

impl fmt::Display for PortSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortSelector::Index(index) => write!(f, "#{}", index),
            PortSelector::Name(name) => write!(f, "'{}'", name),
        }
    }
}

/// Invoked by the driver for every raw message, on the driver's thread
pub type PacketCallback = Box<dyn FnMut(&[u8]) + Send + 'static>;

/// A MIDI input driver
pub trait MidiTransport: Send + Sync {
    fn open(&self, selector: &PortSelector) -> Result<Box<dyn InputPort>, TransportError>;
}

/// An opened, not yet listening, input port
pub trait InputPort {
    fn name(&self) -> &str;

    fn listen(self: Box<Self>, callback: PacketCallback)
        -> Result<Box<dyn StopHandle>, TransportError>;
}

/// Releases a listening port. Returns once the port is free.
pub trait StopHandle: Send {
    fn stop(self: Box<Self>);
}
