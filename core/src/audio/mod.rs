//! Circular audio buffer model and fill-window prediction.
//!
//! [`ring`] tracks the producer side of the device's circular sample
//! buffer. [`sync`] is the pure predictor that decides, from hardware
//! cursor positions, which byte range to fill each tick.

pub mod ring;
pub mod sync;

pub use ring::{AudioRing, CursorError, RingCursors, RingFormat};
pub use sync::{FillParams, FillPlan, FillSpan, FillWindow, LatencyClass, plan_fill};
