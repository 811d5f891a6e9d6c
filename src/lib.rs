//! # Loveless Delay II — A Modulated Mono/Stereo/Ping-Pong Delay
//!
//! The second Loveless delay, built with
//! [nih-plug](https://github.com/robbert-vdh/nih-plug) and shipped as Audio
//! Unit (AUv2), VST3 and CLAP from one codebase. On top of the first
//! version's ring buffer and darkening feedback filter it adds a delay-time
//! LFO, tempo sync, three routing modes and a click-free startup ramp.
//!
//! ## Signal Flow
//!
//! ```text
//! Input ──┬─────────────────────────────────────────────── × dry ────┐
//!         │                                                           │
//!         │   ┌──────────────── FEEDBACK LOOP ─────────────────┐      │
//!         │   │                                                │      │
//!         └──►(+)──► [Ring Buffer] ──► delayed ──► [Hi Cut] × feedback
//!             ▲       ▲ read head              │               │      │
//!             │       │ wobbled by the LFO     │               │      │
//!             │       │                        ▼               │      │
//!             │    Mono / Stereo /       × wet × fade-in       │      │
//!             │    Ping-Pong routing           │               │      │
//!             └────────────────────────────────│───────────────┘      │
//!                                              └────────────────────►(+)──► Output
//! ```
//!
//! The host-facing side lives here and in [`params`]; all of the audio
//! work happens in [`engine::DelayEngine`].

pub mod dsp;
pub mod engine;
pub mod params;

use std::num::NonZeroU32;
use std::sync::Arc;

use engine::DelayEngine;
use nih_plug::prelude::*;
use params::PluginParams;

/// The main plugin struct.
///
/// Parameters are shared with the host through an `Arc` and may be read
/// from any thread. The engine is owned by the audio thread and only touched
/// from the host callbacks below, so it needs no locking.
struct LovelessDelay {
    params: Arc<PluginParams>,

    /// Delay buffers, LFO, ping-pong timer, fade-in and feedback filters.
    /// Built at 44.1 kHz and resized in `initialize()` once the host tells
    /// us the real sample rate.
    engine: DelayEngine,
}

impl Default for LovelessDelay {
    fn default() -> Self {
        Self {
            params: Arc::new(PluginParams::default()),
            engine: DelayEngine::new(),
        }
    }
}

impl Plugin for LovelessDelay {
    const NAME: &'static str = "Loveless Delay II";
    const VENDOR: &'static str = "Loveless Audio";
    const URL: &'static str = "";
    const EMAIL: &'static str = "steve.loveless@gmail.com";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    // Stereo first, since most tracks are stereo. Mono tracks get the
    // single-buffer path regardless of the mode parameter.
    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(1),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
    ];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;

    // Automation points split the buffer, and every split gets its own
    // parameter snapshot.
    const SAMPLE_ACCURATE_AUTOMATION: bool = true;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    /// Called when the plugin is loaded or the audio configuration changes.
    /// This is the only place the delay buffers are (re)allocated.
    fn initialize(
        &mut self,
        audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        self.engine.set_sample_rate(f64::from(buffer_config.sample_rate));

        let num_channels = audio_io_layout
            .main_input_channels
            .map_or(2, NonZeroU32::get);
        nih_log!(
            "Initialized at {} Hz with {} channel(s), {} samples of delay history",
            buffer_config.sample_rate,
            num_channels,
            self.engine.capacity()
        );

        true
    }

    /// Called when playback stops or the plugin is bypassed. Clears the
    /// buffers so old echoes don't come back on the next play.
    fn reset(&mut self) {
        self.engine.reset();
    }

    /// Snapshot the parameters, hand them to the engine, and let it process
    /// the block in place.
    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        // Hosts that don't report a tempo get 120 BPM.
        let parameters = self.params.snapshot(context.transport().tempo);
        self.engine.set_parameters(&parameters);

        match buffer.as_slice() {
            [mono] => self.engine.process_mono(mono),
            [left, right, ..] => self.engine.process_stereo(left, right),
            [] => {}
        }

        // Keep the host calling process() until the echoes have decayed to
        // -60 dB, even after the input goes silent.
        ProcessStatus::Tail(self.engine.tail_samples())
    }
}

// ─────────────────────────────────────────────────────────────────────
// Plugin format trait implementations
// ─────────────────────────────────────────────────────────────────────

impl ClapPlugin for LovelessDelay {
    const CLAP_ID: &'static str = "com.loveless-audio.loveless-delay-v2";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("A modulated delay with mono, stereo and ping-pong modes and tempo sync");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Delay,
    ];
}

impl Vst3Plugin for LovelessDelay {
    // 16 ASCII bytes, unique across every VST3 plugin.
    const VST3_CLASS_ID: [u8; 16] = *b"LvlssDelay__v002";

    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Delay];
}

// ─────────────────────────────────────────────────────────────────────
// Export macros
// ─────────────────────────────────────────────────────────────────────
//
// `nih_export_clap!` exports `clap_entry` for CLAP hosts and
// `nih_export_vst3!` exports `GetPluginFactory` for VST3 hosts.
// `clap_wrapper::export_auv2!()` re-exports the CLAP entry point as an
// Audio Unit so Logic Pro can load it.

nih_export_clap!(LovelessDelay);
nih_export_vst3!(LovelessDelay);

clap_wrapper::export_auv2!();
