//! Fill-window prediction.
//!
//! Each tick, before any samples are generated, the predictor decides
//! which byte range of the device ring to fill. It projects where the
//! play cursor will be when the next frame flips, compares that against
//! how far ahead the device's own write cursor (plus a jitter margin)
//! sits, and picks one of two targets:
//!
//! - **low latency**: the device consumes promptly, so filling exactly
//!   one frame past the predicted flip boundary keeps output tight.
//! - **high latency**: the write cursor already sits past the predicted
//!   boundary, so the prediction cannot be trusted; fall back to one
//!   frame plus margin ahead of the write cursor.
//!
//! The predictor is pure. It never touches the ring or the device, so
//! every branch is testable with plain numbers.

use super::ring::RingCursors;

/// Everything the predictor needs for one tick, by value.
#[derive(Debug, Clone, Copy)]
pub struct FillParams {
    /// Hardware cursors read this tick.
    pub cursors: RingCursors,
    /// Producer position inside the ring.
    pub byte_to_lock: u32,
    /// Ring size in bytes.
    pub capacity_bytes: u32,
    /// Bytes consumed by the device over one full tick.
    pub expected_bytes_per_frame: u32,
    /// Jitter margin in bytes.
    pub safety_bytes: u32,
    /// Time already spent in this tick when the prediction runs. The
    /// remaining fraction of the frame scales the boundary estimate.
    pub seconds_into_frame: f32,
    /// Tick duration in seconds.
    pub target_seconds_per_frame: f32,
}

/// How much the device can be trusted this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyClass {
    /// Write cursor trails the predicted flip boundary; fill one frame
    /// past the boundary.
    Low,
    /// Write cursor has already passed the predicted boundary; fill
    /// relative to the write cursor plus margin instead.
    High,
}

/// Byte range to fill, possibly wrapping the ring seam.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillWindow {
    pub byte_to_lock: u32,
    pub bytes_to_write: u32,
}

/// One contiguous run of bytes inside the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillSpan {
    pub start_byte: u32,
    pub byte_count: u32,
}

impl FillWindow {
    /// Split the window at the ring seam.
    ///
    /// The second span starts at byte zero and is empty unless the
    /// window wraps.
    pub fn spans(&self, capacity_bytes: u32) -> (FillSpan, FillSpan) {
        let first = capacity_bytes
            .saturating_sub(self.byte_to_lock)
            .min(self.bytes_to_write);
        (
            FillSpan {
                start_byte: self.byte_to_lock,
                byte_count: first,
            },
            FillSpan {
                start_byte: 0,
                byte_count: self.bytes_to_write - first,
            },
        )
    }
}

/// Full result of one prediction, including intermediates for the
/// diagnostic markers and overlay.
#[derive(Debug, Clone, Copy)]
pub struct FillPlan {
    pub window: FillWindow,
    pub latency: LatencyClass,
    /// Chosen fill target, wrapped into the ring.
    pub target_cursor: u32,
    /// Predicted play cursor position at the next flip, wrapped.
    pub expected_boundary: u32,
    /// Device write cursor plus margin, wrapped.
    pub safe_write_cursor: u32,
    /// True when the computed window exceeded the ring and was clamped.
    pub clamped: bool,
}

/// Decide the byte range to fill this tick.
pub fn plan_fill(params: &FillParams) -> FillPlan {
    let capacity = params.capacity_bytes as u64;
    let play = params.cursors.play as u64;

    // Scale the frame's byte budget by the fraction of the tick still
    // ahead of us. At tick start this is the full frame.
    let bytes_until_flip = if params.target_seconds_per_frame > 0.0 {
        let seconds_left =
            (params.target_seconds_per_frame - params.seconds_into_frame).max(0.0);
        (seconds_left / params.target_seconds_per_frame
            * params.expected_bytes_per_frame as f32) as u64
    } else {
        params.expected_bytes_per_frame as u64
    };
    let expected_boundary = play + bytes_until_flip;

    // Unwrap the write cursor forward so it compares linearly against
    // the boundary even when it has lapped the seam.
    let write = if params.cursors.write < params.cursors.play {
        params.cursors.write as u64 + capacity
    } else {
        params.cursors.write as u64
    };
    let safe_write_cursor = write + params.safety_bytes as u64;

    let (latency, target) = if safe_write_cursor < expected_boundary {
        (
            LatencyClass::Low,
            expected_boundary + params.expected_bytes_per_frame as u64,
        )
    } else {
        (
            LatencyClass::High,
            write + params.expected_bytes_per_frame as u64 + params.safety_bytes as u64,
        )
    };
    let target_cursor = (target % capacity) as u32;

    let bytes_to_write = if params.byte_to_lock > target_cursor {
        params
            .capacity_bytes
            .wrapping_sub(params.byte_to_lock)
            .wrapping_add(target_cursor)
    } else {
        target_cursor.wrapping_sub(params.byte_to_lock)
    };

    let mut window = FillWindow {
        byte_to_lock: params.byte_to_lock,
        bytes_to_write,
    };
    let clamped = window.bytes_to_write > params.capacity_bytes;
    if clamped {
        tracing::warn!(
            bytes_to_write = window.bytes_to_write,
            capacity_bytes = params.capacity_bytes,
            "fill window exceeds ring capacity, clamping"
        );
        window.bytes_to_write = params.capacity_bytes;
    }

    FillPlan {
        window,
        latency,
        target_cursor,
        expected_boundary: (expected_boundary % capacity) as u32,
        safe_write_cursor: (safe_write_cursor % capacity) as u32,
        clamped,
    }
}
