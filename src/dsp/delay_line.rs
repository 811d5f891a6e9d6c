//! # Delay Line (Ring Buffer)
//!
//! A delay line stores audio samples and lets you read them back after a
//! specified time delay. Picture a circular tape loop: a "write head"
//! records incoming audio and a "read head" plays it back from a position
//! further behind on the tape. The distance between the heads is the delay.
//!
//! ## One Cursor, Many Channels
//!
//! Every channel of the engine writes the same moment in time into the same
//! slot. Instead of each [`DelayLine`] owning its own write position, the
//! position lives in a single [`WriteCursor`] that the engine advances once
//! per sample frame. The delay lines are pure storage addressed by that
//! cursor, so left and right can never drift apart.
//!
//! ## Two Ways to Read
//!
//! - [`DelayLine::read_nearest`] snaps the delay to a whole number of
//!   samples. One buffer lookup, no blending. Under heavy modulation the
//!   read head jumps in whole-sample steps, which is audible as stepping.
//! - [`DelayLine::read_interpolated`] blends two neighbouring samples for
//!   fractional delays:
//!
//! ```text
//! result = sample_a * (1 - frac) + sample_b * frac
//! ```
//!
//! For a delay of 441.3 samples:
//! - `sample_a` is 441 samples back (weight 0.7)
//! - `sample_b` is 442 samples back (weight 0.3)

use std::num::NonZeroUsize;

/// Shared write position for a set of equally sized delay lines.
///
/// Always in `[0, len)`. Advances by exactly one slot per sample frame.
#[derive(Debug, Clone, Copy)]
pub struct WriteCursor {
    pos: usize,
    len: usize,
}

impl WriteCursor {
    pub fn new(len: NonZeroUsize) -> Self {
        Self {
            pos: 0,
            len: len.get(),
        }
    }

    /// The slot the current sample frame will be written into.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Move forward one slot, wrapping back to 0 at the end of the buffer.
    #[inline]
    pub fn advance(&mut self) {
        self.pos += 1;
        if self.pos == self.len {
            self.pos = 0;
        }
    }

    pub fn reset(&mut self) {
        self.pos = 0;
    }
}

/// A ring buffer holding one channel of delay history.
///
/// The buffer is allocated once for the maximum delay at the current sample
/// rate. Changing the delay time only moves the read position, so nothing
/// here ever allocates while audio is running.
pub struct DelayLine {
    /// Stored samples. All values start at 0.0 (silence).
    buffer: Vec<f32>,
}

impl DelayLine {
    /// Create a silent delay line holding `capacity` samples.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            buffer: vec![0.0; capacity.get()],
        }
    }

    /// Number of slots in the ring.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Store a sample at the cursor's slot.
    ///
    /// Reads for the current frame must happen before this call; the slot
    /// being written is the oldest sample in the ring, exactly one full
    /// capacity behind the write head.
    #[inline]
    pub fn write(&mut self, cursor: &WriteCursor, sample: f32) {
        self.buffer[cursor.position()] = sample;
    }

    /// Read `delay_samples` whole samples behind the write head.
    ///
    /// ```text
    /// read_index = (write_pos + capacity - delay) % capacity
    /// ```
    ///
    /// `capacity` is added before subtracting so the `usize` math never goes
    /// negative. The delay is limited to `capacity - 1`.
    #[inline]
    pub fn read_nearest(&self, cursor: &WriteCursor, delay_samples: usize) -> f32 {
        let len = self.buffer.len();
        let delay = delay_samples.min(len - 1);
        self.buffer[(cursor.position() + len - delay) % len]
    }

    /// Read a fractional number of samples behind the write head, blending
    /// the two nearest stored samples linearly.
    ///
    /// Equivalent to computing the fractional read position
    /// `write_pos + capacity - delay`, flooring it for the first index and
    /// using the remainder as the blend weight towards the next one. Splitting
    /// the delay into whole and fractional parts first keeps the weight exact
    /// even for large buffers, where an `f32` read position loses precision.
    #[inline]
    pub fn read_interpolated(&self, cursor: &WriteCursor, delay_samples: f32) -> f32 {
        let len = self.buffer.len();
        let delay_clamped = delay_samples.clamp(0.0, (len - 2) as f32);

        // For delay_samples = 441.3:
        //   delay_int  = 441   (which slots to look at)
        //   delay_frac = 0.3   (how far to blend towards the older slot)
        let delay_int = delay_clamped as usize;
        let delay_frac = delay_clamped - delay_int as f32;

        // index_a is the newer sample, index_b one slot older.
        let index_a = (cursor.position() + len - delay_int) % len;
        let index_b = (cursor.position() + len - delay_int - 1) % len;

        self.buffer[index_a] * (1.0 - delay_frac) + self.buffer[index_b] * delay_frac
    }

    /// Fill the ring with silence without touching its allocation.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn line(capacity: usize) -> (DelayLine, WriteCursor) {
        let len = NonZeroUsize::new(capacity).unwrap();
        (DelayLine::new(len), WriteCursor::new(len))
    }

    /// Write then read one sample back at an exact position.
    #[test]
    fn test_write_and_read_exact() {
        let (mut dl, mut cursor) = line(100);

        dl.write(&cursor, 0.75);
        cursor.advance();

        assert!((dl.read_nearest(&cursor, 1) - 0.75).abs() < 1e-6);
        assert!((dl.read_interpolated(&cursor, 1.0) - 0.75).abs() < 1e-6);
    }

    /// Halfway between two stored samples gives their average.
    #[test]
    fn test_interpolation() {
        let (mut dl, mut cursor) = line(100);

        dl.write(&cursor, 0.0);
        cursor.advance();
        dl.write(&cursor, 1.0);
        cursor.advance();

        // write_pos = 2:
        //   1 back = pos 1 → 1.0 (weight 0.5)
        //   2 back = pos 0 → 0.0 (weight 0.5)
        let result = dl.read_interpolated(&cursor, 1.5);
        assert!((result - 0.5).abs() < 1e-6, "Expected 0.5, got {result}");

        let result = dl.read_interpolated(&cursor, 1.25);
        assert!((result - 0.75).abs() < 1e-6, "Expected 0.75, got {result}");
    }

    /// The nearest read truncates towards the newer sample.
    #[test]
    fn test_nearest_ignores_fraction() {
        let (mut dl, mut cursor) = line(16);

        for i in 1..=4 {
            dl.write(&cursor, i as f32);
            cursor.advance();
        }

        assert!((dl.read_nearest(&cursor, 1) - 4.0).abs() < 1e-6);
        assert!((dl.read_nearest(&cursor, 4) - 1.0).abs() < 1e-6);
    }

    /// Reads wrap around the start of the ring.
    #[test]
    fn test_wrapping() {
        let (mut dl, mut cursor) = line(4);

        for i in 0..6 {
            dl.write(&cursor, i as f32);
            cursor.advance();
        }

        // write_pos = 6 % 4 = 2, contents [4.0, 5.0, 2.0, 3.0]
        assert_eq!(cursor.position(), 2);
        assert!((dl.read_nearest(&cursor, 1) - 5.0).abs() < 1e-6);
        assert!((dl.read_nearest(&cursor, 3) - 3.0).abs() < 1e-6);
        // 1.5 back blends pos 1 (5.0) and pos 0 (4.0)
        assert!((dl.read_interpolated(&cursor, 1.5) - 4.5).abs() < 1e-6);
    }

    /// The cursor stays inside [0, len) however far it runs.
    #[test]
    fn test_cursor_wraps() {
        let mut cursor = WriteCursor::new(NonZeroUsize::new(7).unwrap());
        for _ in 0..1000 {
            cursor.advance();
            assert!(cursor.position() < 7);
        }
        assert_eq!(cursor.position(), 1000 % 7);

        cursor.reset();
        assert_eq!(cursor.position(), 0);
    }

    /// Over-long delays are limited instead of indexing out of bounds.
    #[test]
    fn test_oversized_delay_is_clamped() {
        let (mut dl, mut cursor) = line(8);
        for i in 0..8 {
            dl.write(&cursor, i as f32);
            cursor.advance();
        }

        let _ = dl.read_nearest(&cursor, 10_000);
        let result = dl.read_interpolated(&cursor, 1.0e9);
        assert!(result.is_finite());
        let result = dl.read_interpolated(&cursor, -5.0);
        assert!(result.is_finite());
    }

    #[test]
    fn test_clear() {
        let (mut dl, mut cursor) = line(10);

        dl.write(&cursor, 0.5);
        cursor.advance();
        dl.clear();

        assert!(dl.read_nearest(&cursor, 1).abs() < 1e-6);
        assert_eq!(dl.capacity(), 10);
    }

    /// Reading back a sequence returns it newest-first.
    #[test]
    fn test_fifo_sequence() {
        let (mut dl, mut cursor) = line(10);

        for i in 1..=5 {
            dl.write(&cursor, i as f32);
            cursor.advance();
        }

        for (delay, expected) in [(1, 5.0), (2, 4.0), (3, 3.0), (4, 2.0), (5, 1.0)] {
            let got = dl.read_interpolated(&cursor, delay as f32);
            assert!((got - expected).abs() < 1e-6, "delay {delay}: got {got}");
        }
    }
}
