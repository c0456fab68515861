//! Percentage normalization and jitter filtering

use super::table::SENTINEL;

/// Full scale of a 7-bit MIDI data byte
pub const SEVEN_BIT_FULL_SCALE: u16 = 127;

const EPSILON: f64 = 0.000_001;

/// Clamp a raw fraction to `[0, 1]` and round it to two decimals.
pub fn normalize_scalar(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    (value.clamp(0.0, 1.0) * 100.0).round() / 100.0
}

/// Whether `new` differs from `old` enough to be reported.
///
/// The first observation of a slider (`old` is the sentinel) is always
/// significant. Landing exactly on an end stop is significant too, so a
/// slider pushed all the way down reads 0 even when the last report was
/// within the threshold.
pub fn significantly_different(old: f64, new: f64, threshold: f64) -> bool {
    if is_unobserved(old) {
        return true;
    }

    if (new - old).abs() > threshold {
        return true;
    }

    (almost_equals(new, 1.0) && !almost_equals(old, 1.0))
        || (almost_equals(new, 0.0) && !almost_equals(old, 0.0))
}

/// True for the "never observed" marker
pub fn is_unobserved(value: f64) -> bool {
    value == SENTINEL
}

fn almost_equals(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}
