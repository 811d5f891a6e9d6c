//! # Delay-Time Modulator
//!
//! A free-running sine LFO that wobbles the read head back and forth around
//! the nominal delay time. Small, slow wobbles give the repeats a gentle
//! chorus/tape-wow character.
//!
//! ```text
//! offset_seconds = sin(2π * phase) * depth_seconds / 100
//! phase         += rate_hz / sample_rate        (wrapped into [0, 1))
//! ```
//!
//! The configured depth is divided by 100 before it reaches the read head,
//! so a depth of 0.2 s moves the delay by at most ±2 ms.

use std::f32::consts::TAU;

/// Divisor applied to the depth parameter.
const DEPTH_SCALE: f32 = 100.0;

/// Sine LFO producing a per-sample delay-time offset in seconds.
///
/// The phase is only ever reset by constructing a new modulator. Parameter
/// changes and sample-rate changes leave it running.
#[derive(Debug, Clone, Default)]
pub struct Modulator {
    /// Always in `[0, 1)`.
    phase: f32,
    depth_seconds: f32,
    rate_hz: f32,
}

impl Modulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_depth(&mut self, depth_seconds: f32) {
        self.depth_seconds = depth_seconds;
    }

    pub fn set_rate(&mut self, rate_hz: f32) {
        self.rate_hz = rate_hz;
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Return the offset for the current sample and step the phase forward.
    #[inline]
    pub fn next_offset(&mut self, sample_rate: f32) -> f32 {
        let offset = (self.phase * TAU).sin() * (self.depth_seconds / DEPTH_SCALE);

        self.phase = (self.phase + self.rate_hz / sample_rate).rem_euclid(1.0);
        // rem_euclid can round a tiny negative value up to exactly 1.0.
        if self.phase >= 1.0 || !self.phase.is_finite() {
            self.phase = 0.0;
        }

        offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_depth_is_silent() {
        let mut lfo = Modulator::new();
        lfo.set_rate(3.0);

        for _ in 0..1000 {
            assert_eq!(lfo.next_offset(1000.0), 0.0);
        }
    }

    /// Peak offset is depth / 100, reached a quarter cycle in.
    #[test]
    fn test_depth_is_scaled_down() {
        let mut lfo = Modulator::new();
        lfo.set_depth(0.5);
        lfo.set_rate(1.0);

        let offsets: Vec<f32> = (0..1000).map(|_| lfo.next_offset(1000.0)).collect();

        assert!(offsets[0].abs() < 1e-6, "sin(0) should be 0, got {}", offsets[0]);
        assert!(
            (offsets[250] - 0.005).abs() < 1e-6,
            "Quarter-cycle peak should be 0.005 s, got {}",
            offsets[250]
        );
        assert!((offsets[750] + 0.005).abs() < 1e-6);

        let peak = offsets.iter().fold(0.0_f32, |m, x| m.max(x.abs()));
        assert!(peak <= 0.005 + 1e-6);
    }

    #[test]
    fn test_phase_wraps() {
        let mut lfo = Modulator::new();
        lfo.set_rate(7.3);

        for _ in 0..100_000 {
            lfo.next_offset(44100.0);
            let phase = lfo.phase();
            assert!((0.0..1.0).contains(&phase), "phase escaped [0, 1): {phase}");
        }
    }

    /// Negative rates run the phase backwards but still wrap.
    #[test]
    fn test_negative_rate_wraps() {
        let mut lfo = Modulator::new();
        lfo.set_rate(-1.0);

        lfo.next_offset(4.0);
        assert!((lfo.phase() - 0.75).abs() < 1e-6);
    }
}
