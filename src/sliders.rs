//! Slider tracking
//!
//! Decodes position reports, keeps the last known position per slider,
//! filters jitter and broadcasts [`SliderMoveEvent`]s. All of it lives behind
//! a single actor task.

mod actor;
mod actor_handle;
mod commands;
pub mod decoder;
pub mod dispatcher;
pub mod scalar;
pub mod table;

pub use actor::PACKET_QUEUE_CAPACITY;
pub use actor_handle::SliderActorHandle;
pub use decoder::{DecodeOutcome, DecoderSettings, DecoderStats, PositionReport};
pub use dispatcher::{DeliveryPolicy, SUBSCRIBER_QUEUE_CAPACITY};
pub use scalar::{normalize_scalar, significantly_different};
pub use table::{SliderTable, SENTINEL};

/// A slider settled on a new position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderMoveEvent {
    pub slider_id: usize,
    /// Position in `[0, 1]`, two decimals
    pub percent_value: f64,
}
