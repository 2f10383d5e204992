//! Input capture feeding the loop's double-buffered snapshots
//!
//! Keyboard events arrive through winit between ticks and are applied to
//! the current frame as they happen, so edges are never lost. Gamepads
//! are polled once per tick. The keyboard owns slot 0, gamepads claim
//! slots 1-4 as they connect.

use framelock_core::{Button, InputFrame, KEYBOARD_SLOT};
use winit::event::KeyEvent;
use winit::keyboard::{KeyCode, PhysicalKey};

#[cfg(feature = "gamepad")]
use framelock_core::{ControllerSnapshot, DpadState};
#[cfg(feature = "gamepad")]
use gilrs::Gilrs;
#[cfg(feature = "gamepad")]
use hashbrown::HashMap;

pub struct InputManager {
    /// Gilrs context for gamepad handling (None if initialization failed)
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    /// Gamepad ID to controller slot mapping
    #[cfg(feature = "gamepad")]
    pad_slots: HashMap<gilrs::GamepadId, usize>,

    /// Raw dead zone threshold for stick axes
    stick_deadzone: i16,
}

impl InputManager {
    /// Create a new input manager
    pub fn new(stick_deadzone: i16) -> Self {
        #[cfg(feature = "gamepad")]
        let gilrs = match Gilrs::new() {
            Ok(g) => Some(g),
            Err(e) => {
                tracing::warn!(
                    "Failed to initialize gamepad support: {}. Gamepads will not be available.",
                    e
                );
                None
            }
        };

        Self {
            #[cfg(feature = "gamepad")]
            gilrs,
            #[cfg(feature = "gamepad")]
            pad_slots: HashMap::new(),
            stick_deadzone,
        }
    }

    /// Apply a winit keyboard event to the keyboard slot of the current
    /// input frame. Held-key repeats are ignored, only real edges count.
    pub fn handle_key_event(&mut self, frame: &mut InputFrame, event: &KeyEvent) {
        if event.repeat {
            return;
        }
        if let PhysicalKey::Code(code) = event.physical_key {
            Self::apply_key(frame, code, event.state.is_pressed());
        }
    }

    /// Apply one key edge to the keyboard slot
    fn apply_key(frame: &mut InputFrame, code: KeyCode, pressed: bool) {
        if let Some(button) = map_key(code) {
            frame
                .controller_mut(KEYBOARD_SLOT)
                .apply_edge(button, pressed);
        }
    }

    /// Poll gamepad state into the current input frame. Called once per
    /// tick, before the loop snapshots input.
    #[cfg(feature = "gamepad")]
    pub fn poll_gamepads(&mut self, frame: &mut InputFrame) {
        // Collect gilrs events first (if gamepad support is available)
        let events: Vec<_> = if let Some(ref mut gilrs) = self.gilrs {
            std::iter::from_fn(|| gilrs.next_event())
                .map(|e| (e.id, e.event))
                .collect()
        } else {
            Vec::new()
        };

        for (id, event) in events {
            match event {
                gilrs::EventType::Connected => {
                    if let Some(slot) = self.find_free_slot() {
                        self.pad_slots.insert(id, slot);
                        tracing::info!("Gamepad {} connected in slot {}", id, slot);
                    } else {
                        tracing::warn!("Gamepad {} connected but no free slots", id);
                    }
                }
                gilrs::EventType::Disconnected => {
                    if let Some(slot) = self.pad_slots.remove(&id) {
                        tracing::info!("Gamepad {} (slot {}) disconnected", id, slot);
                        *frame.controller_mut(slot) = ControllerSnapshot::default();
                    }
                }
                _ => {}
            }
        }

        if let Some(ref gilrs) = self.gilrs {
            for (id, &slot) in &self.pad_slots {
                let gamepad = gilrs.gamepad(*id);
                Self::read_gamepad(frame.controller_mut(slot), &gamepad, self.stick_deadzone);
            }
        }
    }

    #[cfg(not(feature = "gamepad"))]
    pub fn poll_gamepads(&mut self, _frame: &mut InputFrame) {}

    /// Find the lowest free gamepad slot (1-4, keyboard owns 0)
    #[cfg(feature = "gamepad")]
    fn find_free_slot(&self) -> Option<usize> {
        (1..framelock_core::CONTROLLER_SLOTS)
            .find(|&slot| !self.pad_slots.values().any(|&s| s == slot))
    }

    /// Read one gamepad's state into a controller snapshot
    #[cfg(feature = "gamepad")]
    fn read_gamepad(snapshot: &mut ControllerSnapshot, gamepad: &gilrs::Gamepad, deadzone: i16) {
        use gilrs::{Axis, Button as PadButton};

        snapshot.is_connected = true;

        let btn = |button: PadButton| -> bool { gamepad.is_pressed(button) };

        // Face buttons (South=A, East=B, West=X, North=Y in Xbox layout)
        snapshot.apply_edge(Button::A, btn(PadButton::South));
        snapshot.apply_edge(Button::B, btn(PadButton::East));
        snapshot.apply_edge(Button::X, btn(PadButton::West));
        snapshot.apply_edge(Button::Y, btn(PadButton::North));

        // Shoulder buttons
        snapshot.apply_edge(Button::LeftShoulder, btn(PadButton::LeftTrigger));
        snapshot.apply_edge(Button::RightShoulder, btn(PadButton::RightTrigger));

        // Start/Select
        snapshot.apply_edge(Button::Start, btn(PadButton::Start));
        snapshot.apply_edge(Button::Back, btn(PadButton::Select));

        let dpad = DpadState {
            up: btn(PadButton::DPadUp),
            down: btn(PadButton::DPadDown),
            left: btn(PadButton::DPadLeft),
            right: btn(PadButton::DPadRight),
        };

        let raw_x = axis_to_raw(gamepad.value(Axis::LeftStickX));
        let raw_y = axis_to_raw(-gamepad.value(Axis::LeftStickY)); // Invert Y (up = positive)
        snapshot.finish_analog(raw_x, raw_y, dpad, deadzone);
    }
}

/// Fixed keyboard layout for the keyboard controller slot
fn map_key(code: KeyCode) -> Option<Button> {
    match code {
        KeyCode::ArrowUp | KeyCode::KeyW => Some(Button::Up),
        KeyCode::ArrowDown | KeyCode::KeyS => Some(Button::Down),
        KeyCode::ArrowLeft | KeyCode::KeyA => Some(Button::Left),
        KeyCode::ArrowRight | KeyCode::KeyD => Some(Button::Right),
        KeyCode::KeyZ => Some(Button::A),
        KeyCode::KeyX => Some(Button::B),
        KeyCode::KeyC => Some(Button::X),
        KeyCode::KeyV => Some(Button::Y),
        KeyCode::KeyQ => Some(Button::LeftShoulder),
        KeyCode::KeyE => Some(Button::RightShoulder),
        KeyCode::Enter => Some(Button::Start),
        KeyCode::Space => Some(Button::Back),
        _ => None,
    }
}

/// Map a normalized axis value to the raw signed range
#[cfg(feature = "gamepad")]
fn axis_to_raw(value: f32) -> i16 {
    (value.clamp(-1.0, 1.0) * 32767.0) as i16
}
