//! SliderActorHandle - public API for the SliderActor
//!
//! Fire-and-forget methods for the hot path and for control, async methods
//! with oneshot replies for queries.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use super::actor::Sequence;
use super::commands::SliderCommand;
use super::decoder::{DecoderSettings, DecoderStats};
use super::dispatcher::{DeliveryPolicy, SUBSCRIBER_QUEUE_CAPACITY};
use super::SliderMoveEvent;
use crate::midi::MidiMessage;

/// Warn on the first dropped packet and then every this many
const BACKLOG_WARN_EVERY: u64 = 1000;

/// Cloneable handle to the slider actor
#[derive(Clone, Debug)]
pub struct SliderActorHandle {
    cmd_tx: mpsc::UnboundedSender<(Sequence, SliderCommand)>,
    packet_tx: mpsc::Sender<(Sequence, MidiMessage)>,
    sequence: Arc<AtomicU64>,
    backlog_dropped: Arc<AtomicU64>,
}

impl SliderActorHandle {
    pub(super) fn new(
        cmd_tx: mpsc::UnboundedSender<(Sequence, SliderCommand)>,
        packet_tx: mpsc::Sender<(Sequence, MidiMessage)>,
        backlog_dropped: Arc<AtomicU64>,
    ) -> Self {
        Self {
            cmd_tx,
            packet_tx,
            sequence: Arc::new(AtomicU64::new(0)),
            backlog_dropped,
        }
    }

    /// Spawn a new actor and return its handle
    pub fn spawn(settings: DecoderSettings, policy: DeliveryPolicy) -> Self {
        super::actor::SliderActor::spawn(settings, policy)
    }

    fn next_sequence(&self) -> Sequence {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }

    fn send(&self, cmd: SliderCommand) -> bool {
        self.cmd_tx.send((self.next_sequence(), cmd)).is_ok()
    }

    // Hot path

    /// Queue an inbound message for decoding.
    ///
    /// Never blocks, so it is safe to call from the driver's own thread. When
    /// the packet queue is full the message is dropped and counted in
    /// [`DecoderStats::backlog_dropped`].
    pub fn push_message(&self, message: MidiMessage) {
        match self.packet_tx.try_send((self.next_sequence(), message)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                let dropped = self.backlog_dropped.fetch_add(1, Ordering::Relaxed) + 1;
                if dropped == 1 || dropped % BACKLOG_WARN_EVERY == 0 {
                    warn!(dropped, "Slider input backlog full, dropping MIDI input");
                }
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }

    // Control

    /// Register a new subscriber and return its queue
    pub fn subscribe(&self) -> mpsc::Receiver<SliderMoveEvent> {
        let (sender, receiver) = mpsc::channel(SUBSCRIBER_QUEUE_CAPACITY);
        self.send(SliderCommand::Subscribe { sender });
        receiver
    }

    pub fn update_settings(&self, settings: DecoderSettings) {
        self.send(SliderCommand::UpdateSettings(settings));
    }

    pub fn set_delivery_policy(&self, policy: DeliveryPolicy) {
        self.send(SliderCommand::SetDeliveryPolicy(policy));
    }

    /// Forget every known slider
    pub fn reset(&self) {
        self.send(SliderCommand::Reset);
    }

    // Queries

    /// Current slider table. Empty if the actor is gone.
    pub async fn snapshot(&self) -> Vec<f64> {
        let (response, rx) = oneshot::channel();
        if !self.send(SliderCommand::Snapshot { response }) {
            return Vec::new();
        }
        rx.await.unwrap_or_default()
    }

    pub async fn stats(&self) -> DecoderStats {
        let (response, rx) = oneshot::channel();
        if !self.send(SliderCommand::Stats { response }) {
            return DecoderStats::default();
        }
        rx.await.unwrap_or_default()
    }

    // Lifecycle

    pub fn is_alive(&self) -> bool {
        !self.cmd_tx.is_closed()
    }

    pub fn shutdown(&self) {
        self.send(SliderCommand::Shutdown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detached_handle(packet_capacity: usize) -> (SliderActorHandle, mpsc::Receiver<(Sequence, MidiMessage)>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        drop(cmd_rx);
        let (packet_tx, packet_rx) = mpsc::channel(packet_capacity);
        let handle = SliderActorHandle::new(cmd_tx, packet_tx, Arc::new(AtomicU64::new(0)));
        (handle, packet_rx)
    }

    #[test]
    fn test_handle_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<SliderActorHandle>();
    }

    #[tokio::test]
    async fn test_is_alive_when_channel_closed() {
        let (handle, _packets) = detached_handle(4);
        assert!(!handle.is_alive());
        assert_eq!(handle.stats().await, DecoderStats::default());
    }

    #[test]
    fn test_full_packet_queue_counts_drops() {
        let (handle, mut packets) = detached_handle(2);
        let clock = MidiMessage::System { status: 0xF8 };

        for _ in 0..5 {
            handle.push_message(clock.clone());
        }

        assert_eq!(handle.backlog_dropped.load(Ordering::Relaxed), 3);
        assert_eq!(packets.try_recv().map(|(seq, _)| seq), Ok(0));
        assert_eq!(packets.try_recv().map(|(seq, _)| seq), Ok(1));
        assert!(packets.try_recv().is_err());
    }
}
