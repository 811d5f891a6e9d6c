//! # Plugin Parameters
//!
//! The knobs, switches and menus the host shows for the delay. Each one has:
//!
//! - A **unique string ID** (`#[id = "..."]`) the host uses to save and
//!   recall presets. Once published, never change these IDs or existing
//!   presets will break.
//! - A **human-readable name** shown in the DAW's UI.
//! - A **range** and a **default value**.
//!
//! ## Block-Rate Values
//!
//! The engine takes one [`Parameters`] snapshot per processing block, so
//! nothing here carries a smoother. Delay-time jumps are covered by the
//! engine's fade-in and the ping-pong timer re-arm instead.

use nih_plug::prelude::*;

use crate::dsp::timing::{NoteDivision, DEFAULT_BPM};
use crate::engine::{DelayMode, Parameters};

/// Cutoff at which the feedback lowpass switches itself off.
const HI_CUT_BYPASS_HZ: f32 = 20000.0;

/// All user-facing parameters for the delay.
#[derive(Params)]
pub struct PluginParams {
    /// **Delay Time** in seconds, used when tempo sync is off.
    ///
    /// Range: 10 ms to 2 s, skewed so the short end gets more knob travel.
    #[id = "delay"]
    pub delay_time: FloatParam,

    /// **Feedback**: how much of each echo is fed back for the next one.
    ///
    /// Capped at 99%. At 100% the repeats would never decay.
    #[id = "fdbk"]
    pub feedback: FloatParam,

    /// **Wet** level of the delayed signal.
    #[id = "wet"]
    pub wet: FloatParam,

    /// **Dry** level of the unprocessed signal.
    #[id = "dry"]
    pub dry: FloatParam,

    /// **Mod Depth** in seconds. The engine scales it down by 100, so the
    /// full 0.5 s swings the delay time by ±5 ms.
    #[id = "mdepth"]
    pub mod_depth: FloatParam,

    /// **Mod Rate** of the delay-time LFO.
    #[id = "mrate"]
    pub mod_rate: FloatParam,

    /// **Tempo Sync**: take the delay time from the host tempo and
    /// [`division`](Self::division) instead of [`delay_time`](Self::delay_time).
    #[id = "sync"]
    pub sync: BoolParam,

    /// **Note Division** used while synced.
    #[id = "division"]
    pub division: EnumParam<NoteDivision>,

    /// **Delay Mode**: mono, stereo or ping-pong routing.
    #[id = "mode"]
    pub mode: EnumParam<DelayMode>,

    /// **Hi Cut**: feedback lowpass cutoff. Each repeat passes through it
    /// again, so lower values make the tail darker faster. Fully open
    /// (20 kHz) bypasses the filter.
    #[id = "hicut"]
    pub hi_cut: FloatParam,
}

impl Default for PluginParams {
    fn default() -> Self {
        Self {
            delay_time: FloatParam::new(
                "Delay Time",
                0.3,
                FloatRange::Skewed {
                    min: 0.01,
                    max: 2.0,
                    factor: FloatRange::skew_factor(-1.0),
                },
            )
            .with_unit(" s")
            .with_step_size(0.001),

            feedback: FloatParam::new("Feedback", 0.2, FloatRange::Linear { min: 0.0, max: 0.99 })
                .with_unit("%")
                .with_value_to_string(formatters::v2s_f32_percentage(1))
                .with_string_to_value(formatters::s2v_f32_percentage()),

            wet: FloatParam::new("Wet", 0.1, FloatRange::Linear { min: 0.0, max: 1.0 })
                .with_unit("%")
                .with_value_to_string(formatters::v2s_f32_percentage(1))
                .with_string_to_value(formatters::s2v_f32_percentage()),

            dry: FloatParam::new("Dry", 0.5, FloatRange::Linear { min: 0.0, max: 1.0 })
                .with_unit("%")
                .with_value_to_string(formatters::v2s_f32_percentage(1))
                .with_string_to_value(formatters::s2v_f32_percentage()),

            mod_depth: FloatParam::new("Mod Depth", 0.2, FloatRange::Linear { min: 0.0, max: 0.5 })
                .with_unit(" s")
                .with_step_size(0.001),

            mod_rate: FloatParam::new(
                "Mod Rate",
                1.2,
                FloatRange::Skewed {
                    min: 0.01,
                    max: 5.0,
                    factor: FloatRange::skew_factor(-1.0),
                },
            )
            .with_unit(" Hz")
            .with_value_to_string(formatters::v2s_f32_rounded(2)),

            sync: BoolParam::new("Tempo Sync", false),

            division: EnumParam::new("Note Division", NoteDivision::Quarter),

            mode: EnumParam::new("Delay Mode", DelayMode::Stereo),

            hi_cut: FloatParam::new(
                "Hi Cut",
                HI_CUT_BYPASS_HZ,
                FloatRange::Skewed {
                    min: 200.0,
                    max: HI_CUT_BYPASS_HZ,
                    // Frequency perception is roughly logarithmic.
                    factor: FloatRange::skew_factor(-2.0),
                },
            )
            .with_unit(" Hz")
            .with_step_size(1.0),
        }
    }
}

impl PluginParams {
    /// Snapshot the current values for one processing block.
    ///
    /// `host_bpm` is whatever tempo the host reported, if any.
    pub fn snapshot(&self, host_bpm: Option<f64>) -> Parameters {
        let hi_cut = self.hi_cut.value();

        Parameters {
            delay_time_seconds: self.delay_time.value(),
            feedback: self.feedback.value(),
            wet_level: self.wet.value(),
            dry_level: self.dry.value(),
            modulation_depth_seconds: self.mod_depth.value(),
            modulation_rate_hz: self.mod_rate.value(),
            sync_to_tempo: self.sync.value(),
            host_bpm: host_bpm.map_or(DEFAULT_BPM, |bpm| bpm as f32),
            note_division: self.division.value(),
            mode: self.mode.value(),
            hi_cut_hz: (hi_cut < HI_CUT_BYPASS_HZ).then_some(hi_cut),
        }
    }
}
