//! Shared circular sample buffer drained by the device callback

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use framelock_core::{CursorError, FillWindow, RingCursors, RingFormat};

/// Circular stereo frame buffer shared between the loop thread and the
/// audio callback.
///
/// One slot holds one interleaved frame, left sample in the low half,
/// right sample in the high half. The callback reads slots in order and
/// advances a consumed-frame counter; the loop writes slots at whatever
/// offsets its fill plan picked. Cursors are synthesized from the
/// consumed count: the play cursor is the byte the device reads next,
/// the write cursor leads it by roughly one callback worth of frames.
pub struct DeviceRing {
    /// Packed stereo frames, every slot starts as silence
    frames: Box<[AtomicU32]>,
    /// Total frames the device callback has consumed since start
    consumed_frames: AtomicU64,
    /// Largest single callback seen, in frames
    largest_callback: AtomicU32,
    /// Set once the callback has consumed at least once
    started: AtomicBool,
    format: RingFormat,
}

impl DeviceRing {
    pub fn new(format: RingFormat) -> Self {
        let capacity_frames = (format.capacity_bytes / format.bytes_per_sample) as usize;
        let frames = (0..capacity_frames).map(|_| AtomicU32::new(0)).collect();
        Self {
            frames,
            consumed_frames: AtomicU64::new(0),
            largest_callback: AtomicU32::new(0),
            started: AtomicBool::new(false),
            format,
        }
    }

    pub fn format(&self) -> RingFormat {
        self.format
    }

    fn capacity_frames(&self) -> u32 {
        self.frames.len() as u32
    }

    /// Write-cursor lead over the play cursor, in frames.
    ///
    /// The device can grab a full callback of frames at any moment, so
    /// nothing closer to the play cursor than this is safe to write.
    /// Floored at 10ms to cover the first cursor reads, before a large
    /// callback has been observed.
    fn write_ahead_frames(&self) -> u32 {
        let floor = (self.format.samples_per_second / 100).max(1);
        self.largest_callback
            .load(Ordering::Relaxed)
            .max(floor)
            .min(self.capacity_frames().saturating_sub(1))
    }

    /// Current play/write cursors, in bytes from the ring start.
    ///
    /// Fails with [`CursorError::NotStarted`] until the device callback
    /// has consumed at least once.
    pub fn cursors(&self) -> Result<RingCursors, CursorError> {
        if !self.started.load(Ordering::Acquire) {
            return Err(CursorError::NotStarted);
        }
        let capacity = self.capacity_frames();
        let play_frame = (self.consumed_frames.load(Ordering::Relaxed) % u64::from(capacity)) as u32;
        let write_frame = (play_frame + self.write_ahead_frames()) % capacity;
        Ok(RingCursors {
            play: play_frame * self.format.bytes_per_sample,
            write: write_frame * self.format.bytes_per_sample,
        })
    }

    /// Store interleaved stereo samples starting at the window's byte
    /// offset, wrapping around the ring end.
    ///
    /// If the window is larger than the provided samples, the extra
    /// slots are left untouched.
    pub fn commit(&self, window: FillWindow, samples: &[i16]) {
        let capacity = self.capacity_frames() as usize;
        let start_frame = (window.byte_to_lock / self.format.bytes_per_sample) as usize;
        let frame_count = ((window.bytes_to_write / self.format.bytes_per_sample) as usize)
            .min(samples.len() / 2);
        for i in 0..frame_count {
            let left = samples[2 * i] as u16 as u32;
            let right = samples[2 * i + 1] as u16 as u32;
            self.frames[(start_frame + i) % capacity].store(left | (right << 16), Ordering::Relaxed);
        }
    }

    /// Fill `out` with the next interleaved stereo frames and advance
    /// the play position. Called from the device callback.
    pub fn consume_into(&self, out: &mut [i16]) {
        let capacity = u64::from(self.capacity_frames());
        let frame_count = out.len() / 2;
        let start = self.consumed_frames.load(Ordering::Relaxed);
        for i in 0..frame_count {
            let slot = ((start + i as u64) % capacity) as usize;
            let packed = self.frames[slot].load(Ordering::Relaxed);
            out[2 * i] = packed as u16 as i16;
            out[2 * i + 1] = (packed >> 16) as u16 as i16;
        }
        // Single consumer: only the callback advances this counter
        self.consumed_frames
            .store(start + frame_count as u64, Ordering::Relaxed);
        self.largest_callback
            .fetch_max(frame_count as u32, Ordering::Relaxed);
        self.started.store(true, Ordering::Release);
    }
}
