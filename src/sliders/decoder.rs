//! Position report decoding
//!
//! Note-on messages carry slider positions: the note number is the slider
//! index and the velocity is its raw magnitude. Everything else sharing the
//! bus is noise for us.

use tracing::{debug, info, warn};

use super::scalar::{normalize_scalar, significantly_different, SEVEN_BIT_FULL_SCALE};
use super::table::SliderTable;
use super::SliderMoveEvent;
use crate::config::AppConfig;
use crate::midi::MidiMessage;

/// Decoder knobs, refreshed on every configuration change
#[derive(Debug, Clone, PartialEq)]
pub struct DecoderSettings {
    /// Channel the sliders report on (0-15)
    pub channel: u8,
    /// Minimum percentage delta worth reporting
    pub noise_reduction: f64,
    /// Raw magnitude that maps to 100%
    pub full_scale: u16,
    /// Report `1 - p` instead of `p`
    pub invert: bool,
    /// Log every emitted move
    pub verbose: bool,
}

impl DecoderSettings {
    pub fn from_config(config: &AppConfig, verbose: bool) -> Self {
        Self {
            channel: config.midi.channel,
            noise_reduction: config.noise_reduction.threshold(),
            full_scale: config.midi.full_scale,
            invert: config.invert_sliders,
            verbose,
        }
    }
}

impl Default for DecoderSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default(), false)
    }
}

/// The useful part of a position report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionReport {
    pub channel: u8,
    pub slider: u8,
    pub magnitude: u8,
}

impl PositionReport {
    /// Extract a report from a message, if it is one
    pub fn from_message(message: &MidiMessage) -> Option<Self> {
        match *message {
            MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            } => Some(Self {
                channel,
                slider: note,
                magnitude: velocity,
            }),
            _ => None,
        }
    }
}

/// What happened to one inbound message
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecodeOutcome {
    /// Not a position report
    Ignored,
    /// Position report for another channel
    WrongChannel { expected: u8, got: u8 },
    /// Within the noise threshold of the stored value
    Insignificant,
    /// Stored and worth broadcasting
    Moved(SliderMoveEvent),
}

/// Running counters, for diagnostics and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    pub ignored: u64,
    pub wrong_channel: u64,
    pub insignificant: u64,
    pub emitted: u64,
    /// Inbound messages dropped because the packet queue was full
    pub backlog_dropped: u64,
}

impl DecoderStats {
    pub fn record(&mut self, outcome: &DecodeOutcome) {
        match outcome {
            DecodeOutcome::Ignored => self.ignored += 1,
            DecodeOutcome::WrongChannel { .. } => self.wrong_channel += 1,
            DecodeOutcome::Insignificant => self.insignificant += 1,
            DecodeOutcome::Moved(_) => self.emitted += 1,
        }
    }
}

/// Run one message through classification, growth, normalization and
/// change detection.
///
/// The table only changes for reports on the configured channel. Capacity
/// grows even when the new position turns out to be insignificant.
pub fn decode(
    message: &MidiMessage,
    settings: &DecoderSettings,
    table: &mut SliderTable,
) -> DecodeOutcome {
    let Some(report) = PositionReport::from_message(message) else {
        debug!(
            kind = message.kind(),
            channel = ?message.channel(),
            %message,
            "Not a Note On message, skipping"
        );
        return DecodeOutcome::Ignored;
    };

    if report.channel != settings.channel {
        warn!(
            expected = settings.channel,
            got = report.channel,
            "Position report on unexpected channel"
        );
        return DecodeOutcome::WrongChannel {
            expected: settings.channel,
            got: report.channel,
        };
    }

    let index = report.slider as usize;
    if table.ensure_capacity(index) {
        info!(amount = index + 1, "Detected more sliders");
    }

    let mut percent = normalize_scalar(raw_fraction(report.magnitude, settings.full_scale));
    if settings.invert {
        percent = normalize_scalar(1.0 - percent);
    }

    let Some(previous) = table.get(index) else {
        return DecodeOutcome::Ignored;
    };

    if !significantly_different(previous, percent, settings.noise_reduction) {
        return DecodeOutcome::Insignificant;
    }

    table.set(index, percent);

    DecodeOutcome::Moved(SliderMoveEvent {
        slider_id: index,
        percent_value: percent,
    })
}

fn raw_fraction(magnitude: u8, full_scale: u16) -> f64 {
    let scale = if full_scale == 0 {
        SEVEN_BIT_FULL_SCALE
    } else {
        full_scale
    };
    magnitude as f64 / scale as f64
}
