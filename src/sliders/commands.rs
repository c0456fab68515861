//! Messages understood by the slider actor

use tokio::sync::{mpsc, oneshot};

use super::decoder::{DecoderSettings, DecoderStats};
use super::dispatcher::DeliveryPolicy;
use super::SliderMoveEvent;

/// Control commands for the slider actor.
///
/// Inbound packets travel on their own bounded queue. Each command is tagged
/// with a sequence number so it applies after the packets queued before it.
#[derive(Debug)]
pub enum SliderCommand {
    /// Register a subscriber queue
    Subscribe {
        sender: mpsc::Sender<SliderMoveEvent>,
    },

    /// Replace decoder settings
    UpdateSettings(DecoderSettings),

    /// Change how full subscriber queues are handled
    SetDeliveryPolicy(DeliveryPolicy),

    /// Forget every known slider
    Reset,

    /// Copy of the slider table
    Snapshot {
        response: oneshot::Sender<Vec<f64>>,
    },

    /// Copy of the decode counters
    Stats {
        response: oneshot::Sender<DecoderStats>,
    },

    /// Stop the actor loop
    Shutdown,
}
