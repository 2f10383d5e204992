//! On-screen audio sync display.
//!
//! Paints the marker ring into the backbuffer so cursor behavior can be
//! read off the screen: byte positions map linearly onto the frame
//! width, every recorded tick contributes one tick mark per cursor, and
//! the latest tick additionally shows its committed fill window and
//! predicted flip cursor.

use framelock_core::{FillWindow, MarkerRing, PixelFrame};

/// Horizontal and vertical inset of the display, in pixels.
const PAD: u32 = 16;

/// Play cursors, both at fill time and at flip time.
const PLAY_CURSOR_COLOR: u32 = 0x00FF_FFFF;
/// Write cursors, both at fill time and at flip time.
const WRITE_CURSOR_COLOR: u32 = 0x00FF_0000;
/// Predicted play cursor position at the flip.
const EXPECTED_FLIP_COLOR: u32 = 0x00FF_FF00;
/// Region committed by the latest fill.
const FILL_WINDOW_COLOR: u32 = 0x00FF_00FF;

/// Draw the sync display over whatever the game rendered.
///
/// The upper lane holds cursors sampled when the fill window was
/// planned, the lower lane holds them again after the flip. The latest
/// marker draws last so its predicted flip cursor stays visible, and
/// its fill window appears as a strip along the top edge, split in two
/// when it wraps the ring seam.
pub fn draw_sync_display(frame: &mut PixelFrame, markers: &MarkerRing, capacity_bytes: u32) {
    let width = frame.width();
    let height = frame.height();
    if capacity_bytes == 0 || width <= 2 * PAD || height <= 2 * PAD {
        return;
    }

    let top = PAD;
    let bottom = height - PAD;
    let mid = (top + bottom) / 2;
    let fill_lane = (top, mid.saturating_sub(4));
    let flip_lane = (mid + 4, bottom);

    for marker in markers.iter() {
        let fill_play = byte_to_x(marker.fill_play_cursor, capacity_bytes, width);
        let fill_write = byte_to_x(marker.fill_write_cursor, capacity_bytes, width);
        draw_vertical(frame, fill_play, fill_lane.0, fill_lane.1, PLAY_CURSOR_COLOR);
        draw_vertical(frame, fill_write, fill_lane.0, fill_lane.1, WRITE_CURSOR_COLOR);

        let flip_play = byte_to_x(marker.flip_play_cursor, capacity_bytes, width);
        let flip_write = byte_to_x(marker.flip_write_cursor, capacity_bytes, width);
        draw_vertical(frame, flip_play, flip_lane.0, flip_lane.1, PLAY_CURSOR_COLOR);
        draw_vertical(frame, flip_write, flip_lane.0, flip_lane.1, WRITE_CURSOR_COLOR);
    }

    if let Some(latest) = markers.latest() {
        let expected = byte_to_x(latest.expected_flip_play_cursor, capacity_bytes, width);
        draw_vertical(frame, expected, top, bottom, EXPECTED_FLIP_COLOR);

        let window = FillWindow {
            byte_to_lock: latest.fill_location,
            bytes_to_write: latest.fill_byte_count,
        };
        let (first, second) = window.spans(capacity_bytes);
        for span in [first, second] {
            if span.byte_count == 0 {
                continue;
            }
            let x0 = byte_to_x(span.start_byte, capacity_bytes, width);
            let x1 = byte_to_x(span.start_byte + span.byte_count, capacity_bytes, width).min(width);
            for y in PAD / 2..PAD - 2 {
                let row = frame.row_mut(y);
                for pixel in &mut row[x0 as usize..x1 as usize] {
                    *pixel = FILL_WINDOW_COLOR;
                }
            }
        }
    }
}

/// Map a ring byte position onto the padded horizontal span.
fn byte_to_x(byte: u32, capacity_bytes: u32, width: u32) -> u32 {
    let span = (width - 2 * PAD) as f32;
    PAD + (span * byte as f32 / capacity_bytes as f32) as u32
}

fn draw_vertical(frame: &mut PixelFrame, x: u32, top: u32, bottom: u32, color: u32) {
    if x >= frame.width() {
        return;
    }
    for y in top..bottom {
        frame.row_mut(y)[x as usize] = color;
    }
}
