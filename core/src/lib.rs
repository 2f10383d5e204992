//! Framelock Core - Fixed-cadence frame loop
//!
//! This crate holds the platform-independent heart of the loop: frame
//! pacing against a monotonic clock, fill-window prediction for a
//! circular hardware audio buffer, and double-buffered input
//! snapshots. It talks to real devices only through the [`host`]
//! traits, so everything here runs unchanged under scripted tests.
//!
//! # Architecture
//!
//! - [`FramePacer`] - Drives one tick at a time at a fixed cadence
//! - [`LoopContext`] - All mutable loop state, owned for the loop's lifetime
//! - [`plan_fill`] - Pure predictor mapping hardware cursors to a fill window
//! - [`InputDoubleBuffer`] - Current/previous controller snapshots
//! - [`MarkerRing`] - Per-tick cursor markers for sync inspection

pub mod audio;
pub mod clock;
pub mod debug;
pub mod game;
pub mod host;
pub mod input;
#[cfg(test)]
mod integration;
pub mod pacer;
pub mod runner;
#[cfg(test)]
pub mod test_utils;

// Re-export core types
pub use audio::{
    AudioRing, CursorError, FillParams, FillPlan, FillSpan, FillWindow, LatencyClass,
    RingCursors, RingFormat, plan_fill,
};
pub use clock::{Clock, MonotonicClock};
pub use debug::{DebugMarker, LoopMetrics, MarkerRing};
pub use game::{Game, NullGame, PixelFrame, SoundBuffer};
pub use host::{AudioSink, Presenter};
pub use input::{
    Button, ButtonState, CONTROLLER_SLOTS, ControllerSnapshot, DpadState, InputDoubleBuffer,
    InputFrame, KEYBOARD_SLOT, STICK_DEADZONE, STICK_DIGITAL_THRESHOLD, apply_deadzone,
};
pub use pacer::{SleepPolicy, WaitReport, wait_until};
pub use runner::{AudioReport, FramePacer, LoopContext, TickReport};
