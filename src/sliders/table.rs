//! Last-known slider positions
//!
//! The number of sliders is never enumerated up front: the table grows the
//! first time a report names an index past its end.

/// Marker for a slot whose slider has not reported a position yet
pub const SENTINEL: f64 = -1.0;

/// Ordered, growable store of the last percentage seen per slider index.
///
/// Every entry is either in `[0.0, 1.0]` or exactly [`SENTINEL`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SliderTable {
    values: Vec<f64>,
}

impl SliderTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grow the table so `index` is addressable.
    ///
    /// New slots start at [`SENTINEL`]; existing slots keep their values.
    /// Returns true when the table grew.
    pub fn ensure_capacity(&mut self, index: usize) -> bool {
        if index < self.values.len() {
            return false;
        }
        self.values.resize(index + 1, SENTINEL);
        true
    }

    /// Value at `index`, or `None` if `ensure_capacity` was never called for it
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    /// Store `value` at `index`. Returns false if the slot does not exist.
    pub fn set(&mut self, index: usize, value: f64) -> bool {
        match self.values.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Forget every slider, so the next report of each is a fresh baseline
    pub fn reset(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}
