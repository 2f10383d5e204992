//! The render and audio-generation callback boundary.
//!
//! The loop drives an implementation of [`Game`] once per tick, handing
//! it the finalized input frame, a pixel buffer to draw into, and a
//! sample buffer sized to exactly the fill window the predictor chose.
//! [`NullGame`] is the safe default when nothing real is bound.

use crate::input::InputFrame;

/// One tick's worth of work, supplied by the application.
pub trait Game {
    /// Draw the tick's video frame into `frame`.
    fn render(&mut self, input: &InputFrame, frame: &mut PixelFrame);

    /// Fill `audio` completely with interleaved stereo samples.
    ///
    /// Partial fills produce undefined playback; silence is the
    /// acceptable fallback when there is nothing to say.
    fn generate_audio(&mut self, audio: &mut SoundBuffer<'_>);
}

/// CPU-side backbuffer of packed `0x00RRGGBB` pixels, top-down rows.
#[derive(Debug, Clone)]
pub struct PixelFrame {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl PixelFrame {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width * height) as usize],
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row as uploaded to the presenter.
    #[inline]
    pub fn pitch_bytes(&self) -> u32 {
        self.width * 4
    }

    #[inline]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    pub fn row_mut(&mut self, y: u32) -> &mut [u32] {
        let start = (y * self.width) as usize;
        &mut self.pixels[start..start + self.width as usize]
    }
}

/// Mutable view of the samples one tick must produce.
///
/// `samples` holds interleaved stereo pairs, left then right, as signed
/// 16-bit values.
pub struct SoundBuffer<'a> {
    pub samples_per_second: u32,
    pub samples: &'a mut [i16],
}

impl SoundBuffer<'_> {
    /// Stereo frames in the buffer.
    #[inline]
    pub fn frame_count(&self) -> usize {
        self.samples.len() / 2
    }
}

/// Stub payload: black frames and silence.
#[derive(Debug, Default)]
pub struct NullGame;

impl Game for NullGame {
    fn render(&mut self, _input: &InputFrame, frame: &mut PixelFrame) {
        frame.pixels_mut().fill(0);
    }

    fn generate_audio(&mut self, audio: &mut SoundBuffer<'_>) {
        audio.samples.fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_frame_layout() {
        let mut frame = PixelFrame::new(320, 240);
        assert_eq!(frame.pitch_bytes(), 1280);
        assert_eq!(frame.pixels().len(), 320 * 240);

        frame.row_mut(1).fill(0x00FF0000);
        assert_eq!(frame.pixels()[320], 0x00FF0000);
        assert_eq!(frame.pixels()[319], 0);
        assert_eq!(frame.pixels()[640], 0);
    }

    #[test]
    fn test_null_game_outputs_silence() {
        let mut game = NullGame;
        let mut samples = [7i16; 64];
        let mut buffer = SoundBuffer {
            samples_per_second: 48000,
            samples: &mut samples,
        };
        assert_eq!(buffer.frame_count(), 32);

        game.generate_audio(&mut buffer);
        assert!(samples.iter().all(|&s| s == 0));

        let mut frame = PixelFrame::new(4, 4);
        frame.pixels_mut().fill(0x00123456);
        game.render(&InputFrame::default(), &mut frame);
        assert!(frame.pixels().iter().all(|&p| p == 0));
    }
}
