//! Host collaborator traits.
//!
//! The loop core never talks to real devices. The host hands it an
//! [`AudioSink`] wrapping the platform's circular buffer and a
//! [`Presenter`] owning the window surface; tests substitute scripted
//! doubles for both.

use crate::audio::ring::{CursorError, RingCursors};
use crate::audio::sync::FillWindow;
use crate::game::PixelFrame;

/// The device side of the circular audio buffer.
pub trait AudioSink {
    /// Read the hardware play and write cursors.
    ///
    /// Fails per tick, not fatally; the loop skips the fill and
    /// re-anchors on the next success.
    fn cursors(&self) -> Result<RingCursors, CursorError>;

    /// Copy `samples` into the ring at `window`.
    ///
    /// `samples` holds interleaved stereo pairs covering the window's
    /// whole frames.
    fn commit(&mut self, window: FillWindow, samples: &[i16]);
}

/// Owns the displayed surface.
pub trait Presenter {
    /// Show the finished frame.
    fn present(&mut self, frame: &PixelFrame);
}
