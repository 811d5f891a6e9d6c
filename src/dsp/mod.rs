//! # DSP Primitives
//!
//! The building blocks the delay engine is assembled from:
//!
//! - **`delay_line`**: ring buffer storage, the shared write cursor, and
//!   the nearest/interpolated read strategies.
//! - **`filter`**: one-pole lowpass that darkens the feedback path.
//! - **`lfo`**: sine modulator that wobbles the delay time.
//! - **`timing`**: tempo-sync note lengths and the BPM → seconds conversion.
//! - **`fade`**: the one-shot wet-signal fade-in.

pub mod delay_line;
pub mod fade;
pub mod filter;
pub mod lfo;
pub mod timing;
