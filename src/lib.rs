//! midi-sliders
//!
//! Listens to a MIDI input where a slider surface reports positions as
//! note-on messages (note = slider index, velocity = position), keeps the
//! last known position of every slider, drops jitter and republishes clean
//! [`SliderMoveEvent`]s to any number of subscribers. Configuration reloads
//! reset the known positions and, when the connection parameters changed,
//! reconnect the input.

pub mod config;
pub mod connection;
pub mod error;
pub mod midi;
pub mod slider_io;
pub mod sliders;
pub mod supervisor;

pub use config::{AppConfig, ConfigWatcher};
pub use connection::{ConnectionParameters, ConnectionState, MidirTransport};
pub use error::{ConnectionError, TransportError};
pub use slider_io::SliderIo;
pub use sliders::SliderMoveEvent;
