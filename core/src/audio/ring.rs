//! Producer-side model of the device's circular sample buffer.
//!
//! The device owns the actual storage and consumes it asynchronously;
//! this model only reasons about byte offsets into it. The producer's
//! position is a monotonically increasing sample index that wraps into
//! the ring via modulo, so it never loses track of total progress.

use thiserror::Error;

/// Why hardware cursors could not be read this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CursorError {
    /// The stream has not consumed anything yet, so cursor positions
    /// are meaningless.
    #[error("audio stream has not started consuming yet")]
    NotStarted,
    /// The device vanished mid-session.
    #[error("audio device lost")]
    DeviceLost,
    /// Audio output was disabled at startup.
    #[error("audio output disabled")]
    Disabled,
}

/// Immutable shape of the device ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingFormat {
    /// Sample frames consumed per second.
    pub samples_per_second: u32,
    /// Bytes per interleaved frame.
    pub bytes_per_sample: u32,
    /// Total ring size in bytes.
    pub capacity_bytes: u32,
}

impl RingFormat {
    /// 16-bit interleaved stereo, with a ring one second deep.
    pub fn stereo_16(samples_per_second: u32) -> Self {
        let bytes_per_sample = 4;
        Self {
            samples_per_second,
            bytes_per_sample,
            capacity_bytes: samples_per_second * bytes_per_sample,
        }
    }
}

/// Hardware cursor positions, read from the device each tick.
///
/// Both are byte offsets inside `[0, capacity_bytes)`. The region
/// between `play` and `write` is in flight; writing to it is unsafe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingCursors {
    /// Offset the device is currently reading for playback.
    pub play: u32,
    /// Offset past which the device guarantees not to read before the
    /// next query.
    pub write: u32,
}

/// Producer state for the circular device buffer.
#[derive(Debug, Clone)]
pub struct AudioRing {
    format: RingFormat,
    safety_bytes: u32,
    running_sample_index: u64,
    anchored: bool,
}

impl AudioRing {
    pub fn new(format: RingFormat, safety_bytes: u32) -> Self {
        Self {
            format,
            safety_bytes,
            running_sample_index: 0,
            anchored: false,
        }
    }

    #[inline]
    pub fn format(&self) -> RingFormat {
        self.format
    }

    /// Jitter margin added ahead of the device write cursor.
    #[inline]
    pub fn safety_bytes(&self) -> u32 {
        self.safety_bytes
    }

    /// True once the producer has been aligned with the device and no
    /// cursor read has failed since.
    #[inline]
    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    #[inline]
    pub fn running_sample_index(&self) -> u64 {
        self.running_sample_index
    }

    /// Next byte the producer intends to write, inside the ring.
    pub fn byte_to_lock(&self) -> u32 {
        let format = self.format;
        ((self.running_sample_index * format.bytes_per_sample as u64)
            % format.capacity_bytes as u64) as u32
    }

    /// Bytes the device consumes over one tick at `update_hz`.
    pub fn expected_bytes_per_frame(&self, update_hz: f32) -> u32 {
        let per_second = self.format.samples_per_second * self.format.bytes_per_sample;
        (per_second as f32 / update_hz) as u32
    }

    /// Align the producer with the device's write cursor.
    ///
    /// Done on the first successful cursor read, and again after any
    /// read failure. Assuming continuity across a failure would leave
    /// the producer writing into already-played regions.
    pub fn anchor_to(&mut self, cursors: RingCursors) {
        self.running_sample_index = (cursors.write / self.format.bytes_per_sample) as u64;
        self.anchored = true;
    }

    /// Mark the producer position stale after a failed cursor read.
    pub fn invalidate(&mut self) {
        self.anchored = false;
    }

    /// Advance past a committed fill. Partial trailing samples are
    /// dropped, so the index only ever moves in whole frames.
    pub fn advance(&mut self, bytes: u32) {
        self.running_sample_index += (bytes / self.format.bytes_per_sample) as u64;
    }
}
