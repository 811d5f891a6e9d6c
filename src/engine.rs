//! # Delay Engine
//!
//! Everything the plugin does to audio happens here. The host glue builds a
//! [`Parameters`] snapshot once per block, hands it to
//! [`DelayEngine::set_parameters`], and then calls
//! [`DelayEngine::process_mono`] or [`DelayEngine::process_stereo`] on the
//! block's samples. Audio is transformed in place.
//!
//! ## Per-Sample Loop
//!
//! ```text
//!  LFO ──► delay + offset ──► clamp [1, capacity - 2]
//!                                   │
//!                                   ▼
//!  input ──┬──────────────► [ring buffer read] ──► delayed ──► × wet × fade ──┐
//!          │                                          │                        │
//!          │                                    [lowpass] × feedback           │
//!          │                                          │                        ▼
//!          └──► topology routing ◄────────────────────┘          dry × input (+) ──► output
//!                      │
//!                      ▼
//!               [ring buffer write] ──► advance cursor
//! ```
//!
//! Samples are processed strictly in order: each read depends on what the
//! previous samples wrote.
//!
//! ## Topologies
//!
//! - **Mono**: one buffer. `process_stereo` feeds it the mid signal
//!   `0.5 * (L + R)` and adds the same wet signal to both outputs.
//! - **Stereo**: two independent buffers sharing the cursor and the LFO.
//! - **Ping-Pong**: the left input is injected at `(1 - feedback)` gain,
//!   and the feedback crosses over to the opposite buffer. Which direction
//!   it crosses flips once per delay period, so repeats alternate
//!   left, right, left, ...

use std::num::NonZeroUsize;

use nih_plug::prelude::*;

use crate::dsp::{
    delay_line::{DelayLine, WriteCursor},
    fade::FadeIn,
    filter::OnePoleFilter,
    lfo::Modulator,
    timing::{self, NoteDivision},
};

/// Longest delay the buffers are sized for.
pub const MAX_DELAY_SECONDS: f64 = 2.0;

/// Sample rate used until the host tells us the real one.
pub const DEFAULT_SAMPLE_RATE: f64 = 44100.0;

/// Upper bound on the feedback gain. Loop gain stays strictly below 1.0.
pub const MAX_FEEDBACK: f32 = 0.99;

/// Smallest buffer that still leaves a non-empty `[1, capacity - 2]` read
/// range.
const MIN_CAPACITY: usize = 3;

/// Delay-time changes smaller than this don't re-arm the ping-pong timer.
const DELAY_CHANGE_EPSILON: f32 = 0.0001;

/// How input and feedback are routed between the channel buffers.
#[derive(Enum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DelayMode {
    #[id = "mono"]
    Mono,
    #[id = "stereo"]
    #[default]
    Stereo,
    #[id = "ping-pong"]
    #[name = "Ping-Pong"]
    PingPong,
}

/// One block's worth of control values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameters {
    /// Free-running delay time, used when `sync_to_tempo` is off.
    pub delay_time_seconds: f32,
    /// Clamped to `[0, MAX_FEEDBACK]` by the engine.
    pub feedback: f32,
    pub wet_level: f32,
    pub dry_level: f32,
    pub modulation_depth_seconds: f32,
    pub modulation_rate_hz: f32,
    pub sync_to_tempo: bool,
    pub host_bpm: f32,
    pub note_division: NoteDivision,
    pub mode: DelayMode,
    /// Feedback lowpass cutoff. `None` leaves the feedback unfiltered.
    pub hi_cut_hz: Option<f32>,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            delay_time_seconds: 0.5,
            feedback: 0.5,
            wet_level: 0.5,
            dry_level: 0.5,
            modulation_depth_seconds: 0.002,
            modulation_rate_hz: 0.25,
            sync_to_tempo: false,
            host_bpm: timing::DEFAULT_BPM,
            note_division: NoteDivision::Quarter,
            mode: DelayMode::Stereo,
            hi_cut_hz: None,
        }
    }
}

impl Parameters {
    /// The delay length these parameters ask for, in seconds.
    ///
    /// Tempo-synced values are recomputed from scratch every call, so a tempo
    /// change in the host lands on the very next block.
    pub fn effective_delay_seconds(&self) -> f32 {
        if self.sync_to_tempo {
            timing::synced_delay_seconds(self.host_bpm, self.note_division)
        } else {
            self.delay_time_seconds
        }
    }
}

/// Ping-pong bookkeeping. Lives on each engine instance.
#[derive(Debug, Clone, Copy, Default)]
struct PingPong {
    /// `true`: left echoes cross into the right buffer.
    /// `false`: right echoes cross into the left buffer.
    flip: bool,
    samples_until_flip: usize,
}

impl PingPong {
    fn armed(delay_samples: f64) -> Self {
        let mut state = Self::default();
        state.arm(delay_samples);
        state
    }

    /// Restart the countdown at one delay period.
    fn arm(&mut self, delay_samples: f64) {
        self.samples_until_flip = (delay_samples as usize).max(1);
    }

    /// Count one sample. At zero, swap direction and start the next period
    /// at the current (modulated) delay length.
    #[inline]
    fn tick(&mut self, delay_samples: f32) {
        self.samples_until_flip = self.samples_until_flip.saturating_sub(1);
        if self.samples_until_flip == 0 {
            self.flip = !self.flip;
            self.arm(f64::from(delay_samples));
        }
    }
}

/// A modulated delay with mono, stereo and ping-pong topologies.
///
/// Not thread-safe by itself: every method is meant to be called from the
/// audio thread that owns the engine. Nothing in the processing methods
/// allocates; storage is sized by [`set_sample_rate`](Self::set_sample_rate).
pub struct DelayEngine {
    /// At least 1 Hz.
    sample_rate: f64,

    /// Left and right history. Mono processing only uses the left one.
    lines: [DelayLine; 2],
    /// Shared by both lines, so both channels write the same time slot.
    cursor: WriteCursor,

    delay_time_seconds: f32,
    feedback: f32,
    wet_level: f32,
    dry_level: f32,
    mode: DelayMode,

    modulator: Modulator,
    ping_pong: PingPong,
    fade_in: FadeIn,

    /// Per-channel feedback lowpass, retuned only when the cutoff changes.
    filters: [OnePoleFilter; 2],
    hi_cut_hz: Option<f32>,
}

impl Default for DelayEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DelayEngine {
    /// An engine at [`DEFAULT_SAMPLE_RATE`] with default [`Parameters`].
    pub fn new() -> Self {
        Self::with_sample_rate(DEFAULT_SAMPLE_RATE)
    }

    pub fn with_sample_rate(sample_rate: f64) -> Self {
        let sample_rate = sanitize_sample_rate(sample_rate);
        let capacity = capacity_for(sample_rate);
        let defaults = Parameters::default();

        let mut engine = Self {
            sample_rate,
            lines: [DelayLine::new(capacity), DelayLine::new(capacity)],
            cursor: WriteCursor::new(capacity),
            delay_time_seconds: defaults.effective_delay_seconds(),
            feedback: 0.0,
            wet_level: 0.0,
            dry_level: 0.0,
            mode: DelayMode::default(),
            modulator: Modulator::new(),
            ping_pong: PingPong::default(),
            fade_in: FadeIn::new(sample_rate),
            filters: [OnePoleFilter::new(), OnePoleFilter::new()],
            hi_cut_hz: None,
        };
        engine.set_parameters(&defaults);
        engine.ping_pong = PingPong::armed(engine.nominal_delay_samples());
        engine
    }

    /// Resize the buffers for `sample_rate` and start from silence.
    ///
    /// Allocates. Call it from the host's initialization callback, never
    /// from inside a processing call. The LFO phase keeps running.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sanitize_sample_rate(sample_rate);
        let capacity = capacity_for(self.sample_rate);

        self.lines = [DelayLine::new(capacity), DelayLine::new(capacity)];
        self.cursor = WriteCursor::new(capacity);
        self.fade_in.restart(self.sample_rate);
        for filter in &mut self.filters {
            filter.reset();
        }
        self.retune_filters();
        self.ping_pong = PingPong::armed(self.nominal_delay_samples());
    }

    /// Silence all state without reallocating: buffers, cursor, filters,
    /// fade-in and the ping-pong timer.
    pub fn reset(&mut self) {
        for line in &mut self.lines {
            line.clear();
        }
        self.cursor.reset();
        for filter in &mut self.filters {
            filter.reset();
        }
        self.fade_in.restart(self.sample_rate);
        self.ping_pong = PingPong::armed(self.nominal_delay_samples());
    }

    /// Apply a block's parameters. Touches no audio and allocates nothing.
    ///
    /// Applying the same values twice changes nothing: the cursor, LFO phase,
    /// fade-in and ping-pong timer only react to an actual delay-time change.
    pub fn set_parameters(&mut self, params: &Parameters) {
        // `max` drops a NaN in favour of 0.0.
        self.feedback = params.feedback.max(0.0).min(MAX_FEEDBACK);
        self.wet_level = params.wet_level;
        self.dry_level = params.dry_level;
        self.mode = params.mode;

        self.modulator.set_depth(params.modulation_depth_seconds);
        self.modulator.set_rate(params.modulation_rate_hz);

        let delay = params.effective_delay_seconds();
        let changed =
            (self.delay_time_seconds - delay).abs() > DELAY_CHANGE_EPSILON || delay.is_nan();
        self.delay_time_seconds = delay;
        if changed {
            self.ping_pong.arm(self.nominal_delay_samples());
        }

        if self.hi_cut_hz != params.hi_cut_hz {
            self.hi_cut_hz = params.hi_cut_hz;
            self.retune_filters();
        }
    }

    /// Process one channel in place.
    ///
    /// Always uses the single-buffer topology and a nearest-sample read, with
    /// no fade-in. Heavy modulation steps audibly on this path.
    pub fn process_mono(&mut self, samples: &mut [f32]) {
        for sample in samples.iter_mut() {
            // Read: the modulated delay is truncated to a whole sample.
            let delay = self.modulated_delay_samples() as usize;
            let delayed = self.lines[0].read_nearest(&self.cursor, delay);

            let input = *sample;
            *sample = self.dry_level * input + self.wet_level * delayed;

            // Write: input plus the filtered, scaled echo, so each repeat
            // comes back `feedback` times quieter than the last.
            let fed_back = self.filters[0].process(delayed) * self.feedback;
            self.lines[0].write(&self.cursor, input + fed_back);

            self.cursor.advance();
        }

        nih_debug_assert!(self.cursor.position() < self.capacity());
    }

    /// Process a stereo pair in place, routed by the current [`DelayMode`].
    ///
    /// Both slices should be the same length; if not, only the common prefix
    /// is processed.
    pub fn process_stereo(&mut self, left: &mut [f32], right: &mut [f32]) {
        nih_debug_assert_eq!(left.len(), right.len());

        for (left, right) in left.iter_mut().zip(right.iter_mut()) {
            // Step 1: READ both delayed samples.
            //
            // The LFO nudges the read head around the nominal delay, so the
            // position is usually fractional and the two neighbouring slots
            // are blended. Both channels read the same position.
            let delay = self.modulated_delay_samples();
            let delayed_l = self.lines[0].read_interpolated(&self.cursor, delay);
            let delayed_r = self.lines[1].read_interpolated(&self.cursor, delay);

            // Step 2: RAMP the wet level.
            //
            // The fade-in only scales what comes out of the buffers. The dry
            // signal and the feedback written back are never faded.
            let (in_l, in_r) = (*left, *right);
            let fade = self.fade_in.next_gain();
            let (dry, wet, feedback) = (self.dry_level, self.wet_level * fade, self.feedback);

            // Steps 3 to 5: MIX, FILTER + SCALE the feedback, WRITE.
            // Where the input and the feedback land depends on the mode.
            match self.mode {
                DelayMode::Mono => {
                    // One echo, heard on both sides.
                    let wet_sample = wet * delayed_l;
                    *left = dry * in_l + wet_sample;
                    *right = dry * in_r + wet_sample;

                    // The buffer only sees the mid signal.
                    let mid = 0.5 * (in_l + in_r);
                    let write = mid + self.filters[0].process(delayed_l) * feedback;
                    // The right line mirrors the left so switching to stereo
                    // picks up the same history.
                    self.lines[0].write(&self.cursor, write);
                    self.lines[1].write(&self.cursor, write);
                }
                DelayMode::Stereo => {
                    // Two independent delays that happen to share a clock.
                    *left = dry * in_l + wet * delayed_l;
                    *right = dry * in_r + wet * delayed_r;

                    let fed_back_l = self.filters[0].process(delayed_l) * feedback;
                    let fed_back_r = self.filters[1].process(delayed_r) * feedback;
                    self.lines[0].write(&self.cursor, in_l + fed_back_l);
                    self.lines[1].write(&self.cursor, in_r + fed_back_r);
                }
                DelayMode::PingPong => {
                    *left = dry * in_l + wet * delayed_l;
                    *right = dry * in_r + wet * delayed_r;

                    // Both filters run every sample, including the side whose
                    // feedback is dropped this period.
                    let fed_back_l = self.filters[0].process(delayed_l) * feedback;
                    let fed_back_r = self.filters[1].process(delayed_r) * feedback;

                    // Injection: only the left input enters the loop, scaled
                    // by (1 - feedback). The right input is heard dry only.
                    let mut write_l = in_l * (1.0 - feedback);
                    let mut write_r = 0.0;

                    // Cross-feed: each echo is written into the opposite
                    // buffer. With `flip` set, what just came out of the left
                    // goes into the right; otherwise right goes into left.
                    // The other direction is silent for this period.
                    //
                    //   D:  left echo  (injected input)
                    //   2D: right echo (left crossed over)
                    //   3D: left echo  (right crossed back)
                    if self.ping_pong.flip {
                        write_r += fed_back_l;
                    } else {
                        write_l += fed_back_r;
                    }
                    self.lines[0].write(&self.cursor, write_l);
                    self.lines[1].write(&self.cursor, write_r);

                    // Flip: once a full delay period has gone by, swap the
                    // cross-feed direction. The next period is measured with
                    // this sample's modulated delay, so the flips follow the
                    // read head as the LFO moves it.
                    self.ping_pong.tick(delay);
                }
            }

            // Step 6: ADVANCE the shared write head.
            self.cursor.advance();
        }

        nih_debug_assert!(self.cursor.position() < self.capacity());
    }

    /// Samples until the echo train has decayed to -60 dB.
    ///
    /// Each repeat is scaled by `feedback`, so after N repeats the level is
    /// `feedback^N`. Solving `feedback^N = 0.001` gives
    /// `N = -3 / log10(feedback)`.
    pub fn tail_samples(&self) -> u32 {
        let delay_samples = self.nominal_delay_samples().max(0.0) as f32;

        if self.feedback > 0.001 {
            let repeats = -3.0 / self.feedback.log10();
            (repeats * delay_samples) as u32
        } else {
            delay_samples as u32
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Slots per channel buffer: `ceil(sample_rate * 2) + 1`.
    pub fn capacity(&self) -> usize {
        self.lines[0].capacity()
    }

    pub fn write_index(&self) -> usize {
        self.cursor.position()
    }

    pub fn delay_time_seconds(&self) -> f32 {
        self.delay_time_seconds
    }

    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    pub fn mod_phase(&self) -> f32 {
        self.modulator.phase()
    }

    pub fn fade_in_amount(&self) -> f32 {
        self.fade_in.amount()
    }

    pub fn mode(&self) -> DelayMode {
        self.mode
    }

    fn nominal_delay_samples(&self) -> f64 {
        f64::from(self.delay_time_seconds) * self.sample_rate
    }

    /// Delay length for the current sample including the LFO offset,
    /// clamped to `[1, capacity - 2]`. Advances the LFO.
    #[inline]
    fn modulated_delay_samples(&mut self) -> f32 {
        let offset = self.modulator.next_offset(self.sample_rate as f32);
        let samples = (f64::from(self.delay_time_seconds + offset) * self.sample_rate) as f32;

        // max/min rather than clamp so a NaN lands on 1.0 instead of
        // propagating into the read index.
        samples.max(1.0).min((self.capacity() - 2) as f32)
    }

    fn retune_filters(&mut self) {
        let sample_rate = self.sample_rate as f32;
        for filter in &mut self.filters {
            match self.hi_cut_hz {
                Some(cutoff) => filter.set_cutoff(cutoff, sample_rate),
                None => filter.bypass(),
            }
        }
    }
}

fn sanitize_sample_rate(sample_rate: f64) -> f64 {
    if sample_rate.is_finite() && sample_rate >= 1.0 {
        sample_rate
    } else {
        1.0
    }
}

/// `ceil(sample_rate * MAX_DELAY_SECONDS) + 1`, never below [`MIN_CAPACITY`].
fn capacity_for(sample_rate: f64) -> NonZeroUsize {
    let slots = ((sample_rate * MAX_DELAY_SECONDS).ceil() as usize + 1).max(MIN_CAPACITY);
    NonZeroUsize::MIN.saturating_add(slots - 1)
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
