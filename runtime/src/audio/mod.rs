//! Framelock audio backend
//!
//! Emulates a cursor-addressable circular sound buffer on top of a cpal
//! output stream.
//!
//! Architecture:
//! - `DeviceRing` holds one second of interleaved stereo frames; the cpal
//!   callback drains it in real time and advances a consumed-frame counter
//! - Play/write cursors are derived from that counter, so the loop core
//!   can predict fill windows against real device progress
//! - The loop commits mixed samples at explicit byte offsets; regions the
//!   loop never reaches play silence
//!
//! Audio specs:
//! - Stereo interleaved 16-bit signed PCM
//! - Sample rate negotiated with the device (48 kHz preferred)

mod output;
mod ring;

// Re-export public API
pub use output::AudioOutput;
pub use ring::DeviceRing;

use framelock_core::{AudioSink, CursorError, FillWindow, RingCursors};

/// Sink used when audio is disabled (`--no-audio`).
///
/// Always reports [`CursorError::Disabled`], so the loop skips the fill
/// phase every tick and renders video only.
pub struct MutedSink;

impl AudioSink for MutedSink {
    fn cursors(&self) -> Result<RingCursors, CursorError> {
        Err(CursorError::Disabled)
    }

    fn commit(&mut self, _window: FillWindow, _samples: &[i16]) {}
}
