//! SliderActor - single owner of slider state
//!
//! Inbound packets arrive on a bounded queue fed by the transport callback.
//! The reconnect supervisor and the public API use a separate command queue
//! that is always served first. The actor owns the slider table, the decoder
//! settings and the subscriber list, and touches them from one place only.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, trace};

use super::actor_handle::SliderActorHandle;
use super::commands::SliderCommand;
use super::decoder::{decode, DecodeOutcome, DecoderSettings, DecoderStats};
use super::dispatcher::{DeliveryPolicy, Dispatcher, PendingDelivery};
use super::table::SliderTable;
use crate::midi::MidiMessage;

/// Inbound messages held while delivery is stalled. Anything beyond this is
/// dropped at the transport callback and counted.
pub const PACKET_QUEUE_CAPACITY: usize = 256;

/// Position in the order packets and commands were queued by the handles
pub type Sequence = u64;

pub struct SliderActor {
    table: SliderTable,
    settings: DecoderSettings,
    dispatcher: Dispatcher,
    stats: DecoderStats,
    backlog_dropped: Arc<AtomicU64>,
    pending: Option<PendingDelivery>,
    held: Option<(Sequence, MidiMessage)>,
    command_rx: mpsc::UnboundedReceiver<(Sequence, SliderCommand)>,
    packet_rx: mpsc::Receiver<(Sequence, MidiMessage)>,
}

impl SliderActor {
    /// Spawn the actor on the current tokio runtime and return its handle
    pub fn spawn(settings: DecoderSettings, policy: DeliveryPolicy) -> SliderActorHandle {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (packet_tx, packet_rx) = mpsc::channel(PACKET_QUEUE_CAPACITY);
        let backlog_dropped = Arc::new(AtomicU64::new(0));

        let actor = SliderActor {
            table: SliderTable::new(),
            settings,
            dispatcher: Dispatcher::new(policy),
            stats: DecoderStats::default(),
            backlog_dropped: backlog_dropped.clone(),
            pending: None,
            held: None,
            command_rx: cmd_rx,
            packet_rx,
        };

        tokio::spawn(actor.run());
        debug!("SliderActor spawned");

        SliderActorHandle::new(cmd_tx, packet_tx, backlog_dropped)
    }

    async fn run(mut self) {
        debug!("SliderActor run loop started");

        loop {
            tokio::select! {
                biased;

                cmd = self.command_rx.recv() => {
                    let Some((seq, cmd)) = cmd else { break };
                    if !self.handle_command(seq, cmd) {
                        break;
                    }
                }
                _ = drive(&mut self.pending), if self.pending.is_some() => {
                    self.pending = None;
                    self.dispatcher.prune_closed();
                }
                packet = next_packet(&mut self.held, &mut self.packet_rx), if self.pending.is_none() => {
                    let Some((_, message)) = packet else { break };
                    self.handle_packet(message);
                }
            }
        }

        info!(
            emitted = self.stats.emitted,
            dropped = self.stats.ignored + self.stats.wrong_channel,
            backlog_dropped = self.backlog_dropped.load(Ordering::Relaxed),
            "SliderActor run loop terminated"
        );
    }

    /// Apply one command after the packets queued before it, unless delivery
    /// is stalled. Returns false on shutdown.
    fn handle_command(&mut self, seq: Sequence, cmd: SliderCommand) -> bool {
        if matches!(cmd, SliderCommand::Shutdown) {
            info!("SliderActor received shutdown command");
            return false;
        }

        self.decode_queued_before(seq);

        match cmd {
            SliderCommand::Subscribe { sender } => self.dispatcher.add(sender),
            SliderCommand::UpdateSettings(settings) => {
                trace!(?settings, "Decoder settings updated");
                self.settings = settings;
            }
            SliderCommand::SetDeliveryPolicy(policy) => self.dispatcher.set_policy(policy),
            SliderCommand::Reset => {
                debug!(known = self.table.len(), "Resetting slider table");
                self.table.reset();
            }
            SliderCommand::Snapshot { response } => {
                let _ = response.send(self.table.values().to_vec());
            }
            SliderCommand::Stats { response } => {
                let _ = response.send(DecoderStats {
                    backlog_dropped: self.backlog_dropped.load(Ordering::Relaxed),
                    ..self.stats
                });
            }
            SliderCommand::Shutdown => {}
        }

        true
    }

    /// Decode packets older than `limit` until one stalls delivery
    fn decode_queued_before(&mut self, limit: Sequence) {
        while self.pending.is_none() {
            let packet = match self.held.take() {
                Some(packet) => packet,
                None => match self.packet_rx.try_recv() {
                    Ok(packet) => packet,
                    Err(_) => break,
                },
            };

            if packet.0 >= limit {
                self.held = Some(packet);
                break;
            }
            self.handle_packet(packet.1);
        }
    }

    fn handle_packet(&mut self, message: MidiMessage) {
        let outcome = decode(&message, &self.settings, &mut self.table);
        self.stats.record(&outcome);

        if let DecodeOutcome::Moved(event) = outcome {
            if self.settings.verbose {
                debug!(?event, "Slider moved");
            }
            self.pending = self.dispatcher.dispatch(event);
        }
    }
}

async fn drive(pending: &mut Option<PendingDelivery>) {
    match pending {
        Some(delivery) => delivery.await,
        None => std::future::pending().await,
    }
}

async fn next_packet(
    held: &mut Option<(Sequence, MidiMessage)>,
    packet_rx: &mut mpsc::Receiver<(Sequence, MidiMessage)>,
) -> Option<(Sequence, MidiMessage)> {
    match held.take() {
        Some(packet) => Some(packet),
        None => packet_rx.recv().await,
    }
}
