//! Offline sync diagnostics.
//!
//! Nothing here affects loop behavior. [`markers`] records cursor
//! positions per tick for the sync overlay, [`metrics`] aggregates
//! counters and logs them once a second.

pub mod markers;
pub mod metrics;

pub use markers::{DebugMarker, MarkerRing};
pub use metrics::LoopMetrics;
