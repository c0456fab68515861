//! Error types for the input connection

use thiserror::Error;

use crate::connection::PortSelector;

/// Failures reported by a MIDI input driver
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("MIDI driver initialisation failed: {0}")]
    Init(String),

    #[error("no MIDI input port at index {index} ({available} available)")]
    IndexOutOfRange { index: usize, available: usize },

    #[error("no MIDI input port matching '{0}'")]
    NameNotFound(String),

    #[error("failed to listen on MIDI port '{port}': {reason}")]
    Listen { port: String, reason: String },
}

/// Failures of `start()`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("midi: connection already active")]
    AlreadyConnected,

    #[error("open midi port {selector}: {source}")]
    Open {
        selector: PortSelector,
        #[source]
        source: TransportError,
    },

    #[error("listen on midi port {selector}: {source}")]
    Listen {
        selector: PortSelector,
        #[source]
        source: TransportError,
    },
}

pub type Result<T> = std::result::Result<T, ConnectionError>;
