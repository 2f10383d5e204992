//! Bundled demo payload: scrolling gradient plus a controllable tone
//!
//! Exercises every loop surface without any asset loading. The gradient
//! pans with the stick or d-pad, the tone pitch follows the stick's
//! vertical axis, and Start recenters the view.

use framelock_core::{Button, Game, InputFrame, PixelFrame, SoundBuffer};

/// Base tone frequency in Hz
const TONE_BASE_HZ: f32 = 256.0;

/// How far the stick bends the tone, in Hz at full deflection
const TONE_RANGE_HZ: f32 = 128.0;

pub struct GradientDemo {
    /// Horizontal gradient shift in pixels
    x_offset: i32,
    /// Vertical gradient shift in pixels
    y_offset: i32,
    /// Current tone frequency
    tone_hz: f32,
    /// Sine phase, kept in [0, tau] across buffer boundaries
    t_sine: f32,
    /// Tone amplitude in raw sample units
    tone_volume: i16,
}

impl GradientDemo {
    pub fn new() -> Self {
        Self {
            x_offset: 0,
            y_offset: 0,
            tone_hz: TONE_BASE_HZ,
            t_sine: 0.0,
            tone_volume: 3000,
        }
    }

    /// Advance offsets and tone from one controller's state
    fn apply_controller(&mut self, controller: &framelock_core::ControllerSnapshot) {
        if controller.is_analog {
            self.x_offset += (4.0 * controller.stick_x) as i32;
            self.y_offset -= (4.0 * controller.stick_y) as i32;
            self.tone_hz = TONE_BASE_HZ + TONE_RANGE_HZ * controller.stick_y;
        } else {
            if controller.button(Button::Left).ended_down {
                self.x_offset -= 2;
            }
            if controller.button(Button::Right).ended_down {
                self.x_offset += 2;
            }
            if controller.button(Button::Up).ended_down {
                self.y_offset -= 2;
            }
            if controller.button(Button::Down).ended_down {
                self.y_offset += 2;
            }
        }

        if controller.button(Button::Start).pressed_this_tick() {
            self.x_offset = 0;
            self.y_offset = 0;
            self.tone_hz = TONE_BASE_HZ;
        }
    }
}

impl Default for GradientDemo {
    fn default() -> Self {
        Self::new()
    }
}

impl Game for GradientDemo {
    fn render(&mut self, input: &InputFrame, frame: &mut PixelFrame) {
        for controller in input.controllers() {
            if controller.is_connected {
                self.apply_controller(controller);
            }
        }

        let (x_offset, y_offset) = (self.x_offset, self.y_offset);
        for y in 0..frame.height() {
            let row = frame.row_mut(y);
            for (x, pixel) in row.iter_mut().enumerate() {
                let blue = (x as i32 + x_offset) as u8;
                let green = (y as i32 + y_offset) as u8;
                let red = (x as i32 + y as i32) as u8;
                *pixel = (u32::from(red) << 16) | (u32::from(green) << 8) | u32::from(blue);
            }
        }
    }

    fn generate_audio(&mut self, audio: &mut SoundBuffer<'_>) {
        let tau = std::f32::consts::TAU;
        let phase_step = tau * self.tone_hz / audio.samples_per_second as f32;
        let volume = f32::from(self.tone_volume);

        for frame_index in 0..audio.frame_count() {
            let sample = (self.t_sine.sin() * volume) as i16;
            audio.samples[2 * frame_index] = sample;
            audio.samples[2 * frame_index + 1] = sample;

            self.t_sine += phase_step;
            if self.t_sine > tau {
                self.t_sine -= tau;
            }
        }
    }
}
