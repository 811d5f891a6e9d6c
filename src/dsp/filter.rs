//! # One-Pole Lowpass Filter
//!
//! Sits in the feedback path so every trip around the loop loses a little
//! more top end. The first repeat is filtered once, the second twice, and so
//! on, which is how tape and bucket-brigade echoes darken as they fade.
//!
//! ## The Filter Equation
//!
//! ```text
//! y[n] = (1 - a) * x[n] + a * y[n-1]
//! ```
//!
//! A weighted average of the new input and the previous output. `a = 0.0`
//! passes the input untouched; `a → 1.0` freezes the output.
//!
//! ## Coefficient from Frequency
//!
//! ```text
//! a = e^(-2π * cutoff_hz / sample_rate)
//! ```
//!
//! The exponential is only evaluated when the cutoff or the sample rate
//! actually changes. The engine hands the filter a cutoff every block, and
//! most blocks repeat the previous value.

use std::f32::consts::PI;

/// Lowest cutoff accepted. Keeps the coefficient away from 1.0, where the
/// filter would stop responding to its input.
const MIN_CUTOFF_HZ: f32 = 20.0;

/// A one-pole (6 dB/octave) lowpass filter with a cached coefficient.
pub struct OnePoleFilter {
    /// Range: 0.0 (no filtering) to ~0.999 (extreme filtering).
    coefficient: f32,

    /// The previous output sample, the filter's only state variable.
    prev_output: f32,

    /// Cutoff and sample rate the coefficient was computed for. `None`
    /// until the first [`set_cutoff`](Self::set_cutoff).
    tuned_for: Option<(f32, f32)>,
}

impl OnePoleFilter {
    /// Create a filter that passes its input through unchanged.
    pub fn new() -> Self {
        Self {
            coefficient: 0.0,
            prev_output: 0.0,
            tuned_for: None,
        }
    }

    /// Tune the filter to `cutoff_hz` at `sample_rate`. Does nothing if it is
    /// already tuned for exactly these values.
    ///
    /// Example at 44100 Hz:
    /// - cutoff = 20000 Hz → coeff ≈ 0.06 (barely filtering)
    /// - cutoff = 1000 Hz  → coeff ≈ 0.87 (noticeable filtering)
    /// - cutoff = 100 Hz   → coeff ≈ 0.99 (heavy filtering)
    pub fn set_cutoff(&mut self, cutoff_hz: f32, sample_rate: f32) {
        if self.tuned_for == Some((cutoff_hz, sample_rate)) {
            return;
        }

        // Stay below 49% of the sample rate; the mapping breaks down as the
        // cutoff approaches Nyquist.
        let safe_cutoff = cutoff_hz.clamp(MIN_CUTOFF_HZ, (sample_rate * 0.49).max(MIN_CUTOFF_HZ));

        self.coefficient = (-2.0 * PI * safe_cutoff / sample_rate).exp();
        self.tuned_for = Some((cutoff_hz, sample_rate));
    }

    /// Forget the tuning and go back to passthrough. State is kept.
    pub fn bypass(&mut self) {
        self.coefficient = 0.0;
        self.tuned_for = None;
    }

    /// Process one sample through the filter.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = (1.0 - self.coefficient) * input + self.coefficient * self.prev_output;
        self.prev_output = output;
        output
    }

    /// Zero the filter's memory so the previous run doesn't leak into the
    /// next one.
    pub fn reset(&mut self) {
        self.prev_output = 0.0;
    }
}

impl Default for OnePoleFilter {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// A fresh filter is transparent.
    #[test]
    fn test_passthrough_when_untuned() {
        let mut filter = OnePoleFilter::new();

        for input in [1.0, 0.5, -0.3] {
            let output = filter.process(input);
            assert!(
                (output - input).abs() < 1e-6,
                "Filter should pass {input} through unchanged, got {output}"
            );
        }
    }

    /// A low cutoff crushes a signal alternating at Nyquist.
    #[test]
    fn test_filter_attenuates_high_freq() {
        let mut filter = OnePoleFilter::new();
        filter.set_cutoff(100.0, 44100.0);

        let mut max_output = 0.0_f32;
        for i in 0..1000 {
            let input = if i % 2 == 0 { 1.0 } else { -1.0 };
            max_output = max_output.max(filter.process(input).abs());
        }

        assert!(
            max_output < 0.05,
            "Expected heavy attenuation, got max output {max_output}"
        );
    }

    #[test]
    fn test_coefficient_range() {
        let mut filter = OnePoleFilter::new();

        filter.set_cutoff(20000.0, 44100.0);
        assert!(
            filter.coefficient < 0.1,
            "High cutoff should give small coefficient, got {}",
            filter.coefficient
        );

        filter.set_cutoff(20.0, 44100.0);
        assert!(
            filter.coefficient > 0.99,
            "Low cutoff should give large coefficient, got {}",
            filter.coefficient
        );
    }

    /// Repeating the same cutoff does not recompute anything.
    #[test]
    fn test_coefficient_cached() {
        // Overwrite the coefficient with a marker, then see whether
        // set_cutoff replaced it.
        const MARKER: f32 = -1.0;
        let mut filter = OnePoleFilter::new();

        filter.set_cutoff(1000.0, 48000.0);
        filter.coefficient = MARKER;
        filter.set_cutoff(1000.0, 48000.0);
        assert_eq!(filter.coefficient, MARKER, "same tuning was recomputed");

        filter.set_cutoff(2000.0, 48000.0);
        assert!(filter.coefficient > 0.0, "new cutoff was not applied");

        // A sample rate change retunes even at the same cutoff.
        filter.coefficient = MARKER;
        filter.set_cutoff(2000.0, 44100.0);
        assert!(filter.coefficient > 0.0, "new sample rate was not applied");
    }

    #[test]
    fn test_bypass_restores_passthrough() {
        let mut filter = OnePoleFilter::new();
        filter.set_cutoff(200.0, 44100.0);
        filter.bypass();
        filter.reset();

        assert!((filter.process(0.8) - 0.8).abs() < 1e-6);
        // Bypassing forgets the tuning, so the next set_cutoff recomputes.
        filter.set_cutoff(200.0, 44100.0);
        assert!(filter.coefficient > 0.9);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut filter = OnePoleFilter::new();
        filter.set_cutoff(1000.0, 44100.0);

        filter.process(1.0);
        assert!(filter.prev_output.abs() > 0.0);

        filter.reset();
        assert!(filter.prev_output.abs() < 1e-6);
    }

    /// DC passes a lowpass regardless of cutoff.
    #[test]
    fn test_dc_passes_through() {
        let mut filter = OnePoleFilter::new();
        filter.set_cutoff(100.0, 44100.0);

        let mut output = 0.0;
        for _ in 0..10000 {
            output = filter.process(1.0);
        }

        assert!(
            (output - 1.0).abs() < 1e-4,
            "DC signal should pass through lowpass, got {output}"
        );
    }
}
