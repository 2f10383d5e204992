//! Per-tick cursor snapshots for sync inspection.

use crate::audio::ring::RingCursors;
use crate::audio::sync::FillWindow;

/// Cursor positions captured at the two interesting moments of one
/// tick: when the fill window was computed and when the frame flipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugMarker {
    /// Predicted play cursor position at the flip, wrapped.
    pub expected_flip_play_cursor: u32,
    /// Play cursor when the fill was planned.
    pub fill_play_cursor: u32,
    /// Write cursor when the fill was planned.
    pub fill_write_cursor: u32,
    /// Start of the committed fill window.
    pub fill_location: u32,
    /// Length of the committed fill window.
    pub fill_byte_count: u32,
    /// Play cursor just after the flip.
    pub flip_play_cursor: u32,
    /// Write cursor just after the flip.
    pub flip_write_cursor: u32,
}

/// Fixed-size ring of completed markers plus one in-progress scratch.
///
/// Fields accumulate into the scratch marker during the tick; `advance`
/// publishes it at tick end. `latest` therefore always names a fully
/// recorded tick, never one still being written.
#[derive(Debug, Clone)]
pub struct MarkerRing {
    markers: Vec<DebugMarker>,
    head: usize,
    len: usize,
    current: DebugMarker,
}

impl MarkerRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            markers: vec![DebugMarker::default(); capacity.max(1)],
            head: 0,
            len: 0,
            current: DebugMarker::default(),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.markers.len()
    }

    /// Completed markers currently held.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Record the fill half of the current tick.
    pub fn record_fill(
        &mut self,
        cursors: RingCursors,
        window: FillWindow,
        expected_flip_play_cursor: u32,
    ) {
        self.current.fill_play_cursor = cursors.play;
        self.current.fill_write_cursor = cursors.write;
        self.current.fill_location = window.byte_to_lock;
        self.current.fill_byte_count = window.bytes_to_write;
        self.current.expected_flip_play_cursor = expected_flip_play_cursor;
    }

    /// Record the flip half of the current tick.
    pub fn record_flip(&mut self, cursors: RingCursors) {
        self.current.flip_play_cursor = cursors.play;
        self.current.flip_write_cursor = cursors.write;
    }

    /// Publish the in-progress marker and start a fresh one.
    pub fn advance(&mut self) {
        let capacity = self.markers.len();
        self.markers[self.head] = self.current;
        self.head = (self.head + 1) % capacity;
        self.len = (self.len + 1).min(capacity);
        self.current = DebugMarker::default();
    }

    /// Most recently completed marker.
    pub fn latest(&self) -> Option<&DebugMarker> {
        if self.len == 0 {
            return None;
        }
        let capacity = self.markers.len();
        Some(&self.markers[(self.head + capacity - 1) % capacity])
    }

    /// Completed markers, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &DebugMarker> {
        let capacity = self.markers.len();
        let start = if self.len < capacity { 0 } else { self.head };
        (0..self.len).map(move |i| &self.markers[(start + i) % capacity])
    }

    /// The marker still being recorded for the current tick.
    pub fn in_progress(&self) -> &DebugMarker {
        &self.current
    }
}
