//! # Delay Timing
//!
//! Turns the time-related parameters into a delay length in seconds, either
//! straight from the delay-time knob or from the host tempo and a musical
//! note length.
//!
//! ```text
//! delay_seconds = (60 / bpm) * note_fraction
//! ```
//!
//! `note_fraction` scales one beat (`60 / bpm` seconds): 1/1 is a full beat,
//! 1/4 a quarter of it. At 120 BPM that makes "1/4" 0.125 s and "1/1" 0.5 s.

use nih_plug::prelude::Enum;

/// Tempo assumed when the host does not report one.
pub const DEFAULT_BPM: f32 = 120.0;

/// Musical note lengths available for tempo sync.
#[derive(Enum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoteDivision {
    #[id = "whole"]
    #[name = "1/1"]
    Whole,
    #[id = "half"]
    #[name = "1/2"]
    Half,
    #[id = "quarter"]
    #[name = "1/4"]
    #[default]
    Quarter,
    #[id = "eighth"]
    #[name = "1/8"]
    Eighth,
    #[id = "dotted-eighth"]
    #[name = "1/8 Dotted"]
    DottedEighth,
    #[id = "sixteenth"]
    #[name = "1/16"]
    Sixteenth,
}

impl NoteDivision {
    /// Length as a fraction of a whole note. Dotted values are 1.5× the plain
    /// note they extend.
    pub fn fraction(self) -> f32 {
        match self {
            NoteDivision::Whole => 1.0,
            NoteDivision::Half => 0.5,
            NoteDivision::Quarter => 0.25,
            NoteDivision::Eighth => 0.125,
            NoteDivision::DottedEighth => 0.1875,
            NoteDivision::Sixteenth => 0.0625,
        }
    }
}

/// Seconds for `division` at `bpm`. A missing, zero, negative or non-finite
/// tempo falls back to [`DEFAULT_BPM`].
pub fn synced_delay_seconds(bpm: f32, division: NoteDivision) -> f32 {
    let bpm = if bpm.is_finite() && bpm > 0.0 {
        bpm
    } else {
        DEFAULT_BPM
    };

    (60.0 / bpm) * division.fraction()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fractions() {
        assert_eq!(NoteDivision::Whole.fraction(), 1.0);
        assert_eq!(NoteDivision::Sixteenth.fraction(), 0.0625);
        assert_eq!(
            NoteDivision::DottedEighth.fraction(),
            NoteDivision::Eighth.fraction() * 1.5
        );
    }

    #[test]
    fn test_quarter_at_120() {
        let seconds = synced_delay_seconds(120.0, NoteDivision::Quarter);
        assert_eq!(seconds, 0.125);
    }

    #[test]
    fn test_whole_at_120() {
        assert_eq!(synced_delay_seconds(120.0, NoteDivision::Whole), 0.5);
    }

    #[test]
    fn test_dotted_eighth_at_140() {
        let seconds = synced_delay_seconds(140.0, NoteDivision::DottedEighth);
        let expected = (60.0 / 140.0) * 0.1875;
        assert!(
            (seconds - expected).abs() < 1e-6,
            "expected {expected}, got {seconds}"
        );
        assert!((seconds - 0.08036).abs() < 1e-5);
    }

    #[test]
    fn test_bad_tempo_falls_back() {
        let reference = synced_delay_seconds(DEFAULT_BPM, NoteDivision::Half);
        for bpm in [0.0, -90.0, f32::NAN, f32::INFINITY] {
            assert_eq!(synced_delay_seconds(bpm, NoteDivision::Half), reference);
        }
    }
}
