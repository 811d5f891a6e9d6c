//! # Startup Fade-In
//!
//! When the wet path first comes alive its buffer is silent, then suddenly
//! full of delayed audio. A short linear ramp on the wet signal hides that
//! edge. The ramp runs once, from construction or the last sample-rate
//! change, and is not retriggered by parameter changes.

/// Ramp duration in seconds.
const FADE_SECONDS: f64 = 0.02;

/// Linear 0 → 1 envelope applied to the wet signal.
#[derive(Debug, Clone)]
pub struct FadeIn {
    /// Never exceeds 1.0.
    amount: f32,
    increment: f32,
}

impl FadeIn {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            amount: 0.0,
            increment: (1.0 / (sample_rate * FADE_SECONDS)) as f32,
        }
    }

    /// Restart the ramp from silence, retimed for `sample_rate`.
    pub fn restart(&mut self, sample_rate: f64) {
        *self = Self::new(sample_rate);
    }

    /// Current envelope level.
    pub fn amount(&self) -> f32 {
        self.amount
    }

    /// Gain for the current sample, then advance the ramp by one sample.
    #[inline]
    pub fn next_gain(&mut self) -> f32 {
        let gain = self.amount.min(1.0);
        self.amount = (self.amount + self.increment).min(1.0);
        gain
    }
}
