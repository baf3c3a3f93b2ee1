//! Gate input edge detection

/// Input at or below this is a released gate
pub const GATE_LOW_THRESHOLD: f32 = 0.1;

/// Input at or above this is a held gate
pub const GATE_HIGH_THRESHOLD: f32 = 1.0;

/// Schmitt trigger for the gate input.
///
/// Between the two thresholds the previous state holds, so a noisy or slowly
/// moving gate produces a single rising edge.
#[derive(Clone, Copy, Debug, Default)]
pub struct GateTrigger {
    high: bool,
}

impl GateTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one sample; returns `true` on a rising edge
    pub fn process(&mut self, voltage: f32) -> bool {
        if self.high {
            if voltage <= GATE_LOW_THRESHOLD {
                self.high = false;
            }
            false
        } else if voltage >= GATE_HIGH_THRESHOLD {
            self.high = true;
            true
        } else {
            false
        }
    }

    pub fn is_high(&self) -> bool {
        self.high
    }

    pub fn reset(&mut self) {
        self.high = false;
    }
}
