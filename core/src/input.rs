//! Double-buffered controller snapshots.
//!
//! The loop owns two [`InputFrame`]s. Events and polled device state are
//! applied to the current frame while a tick is being prepared; when the
//! tick completes the buffers rotate and the new current frame is seeded
//! from the old one, so held buttons stay held and edge counts reset.
//!
//! Button edges are debounced by construction: [`ControllerSnapshot::apply_edge`]
//! only counts a transition when the incoming state actually differs from
//! the recorded one, so repeated key-down events from the OS do not inflate
//! the count.

/// Controller slots per frame. Slot [`KEYBOARD_SLOT`] is the keyboard,
/// the rest are physical gamepads.
pub const CONTROLLER_SLOTS: usize = 5;

/// Slot index reserved for the keyboard.
pub const KEYBOARD_SLOT: usize = 0;

/// Default stick dead-zone in raw axis units.
pub const STICK_DEADZONE: i16 = 7849;

/// Normalized stick magnitude past which a direction button edge is
/// synthesized.
pub const STICK_DIGITAL_THRESHOLD: f32 = 0.5;

/// Logical controller buttons shared by every backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Up,
    Down,
    Left,
    Right,
    A,
    B,
    X,
    Y,
    LeftShoulder,
    RightShoulder,
    Start,
    Back,
}

impl Button {
    pub const COUNT: usize = 12;

    pub const ALL: [Button; Self::COUNT] = [
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
        Button::A,
        Button::B,
        Button::X,
        Button::Y,
        Button::LeftShoulder,
        Button::RightShoulder,
        Button::Start,
        Button::Back,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// State of one button over one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonState {
    /// Whether the button was down when the tick's input was finalized.
    pub ended_down: bool,
    /// Number of up/down flips observed during the tick.
    pub transition_count: u32,
}

impl ButtonState {
    /// True if the button went down at least once during the tick.
    #[inline]
    pub fn pressed_this_tick(&self) -> bool {
        self.transition_count >= 2 || (self.transition_count == 1 && self.ended_down)
    }

    /// True if the button went up at least once during the tick.
    #[inline]
    pub fn released_this_tick(&self) -> bool {
        self.transition_count >= 2 || (self.transition_count == 1 && !self.ended_down)
    }
}

/// Hardware D-pad state polled once per tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct DpadState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

/// Map a raw signed axis value to `[-1.0, 1.0]` with a dead zone.
///
/// Values inside `[-threshold, threshold]` collapse to zero. Outside it,
/// each sign rescales over its remaining range, so the extremes
/// `i16::MIN` and `i16::MAX` map to exactly `-1.0` and `1.0`.
pub fn apply_deadzone(raw: i16, threshold: i16) -> f32 {
    let value = raw as f32;
    let threshold = threshold as f32;
    if value < -threshold {
        (value + threshold) / (32768.0 - threshold)
    } else if value > threshold {
        (value - threshold) / (32767.0 - threshold)
    } else {
        0.0
    }
}

/// One controller's state for one tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControllerSnapshot {
    buttons: [ButtonState; Button::COUNT],
    /// Dead-zoned stick X, `-1.0` (left) to `1.0` (right).
    pub stick_x: f32,
    /// Dead-zoned stick Y, `-1.0` (down) to `1.0` (up).
    pub stick_y: f32,
    /// True when stick motion drove this tick's axes, false when the
    /// D-pad or keyboard did.
    pub is_analog: bool,
    /// True while the backing device is attached.
    pub is_connected: bool,
}

impl ControllerSnapshot {
    #[inline]
    pub fn button(&self, button: Button) -> &ButtonState {
        &self.buttons[button.index()]
    }

    /// Record an observed button edge.
    ///
    /// A transition is only counted when `pressed` differs from the
    /// current `ended_down`, so feeding the same state twice is a no-op.
    pub fn apply_edge(&mut self, button: Button, pressed: bool) {
        let state = &mut self.buttons[button.index()];
        if state.ended_down != pressed {
            state.ended_down = pressed;
            state.transition_count += 1;
        }
    }

    /// Finalize this tick's analog state from polled hardware.
    ///
    /// Applies the dead zone to the raw axes, lets a pressed D-pad
    /// override them with unit vectors, then synthesizes direction
    /// button edges from the final axes. All four direction buttons go
    /// through [`ControllerSnapshot::apply_edge`] here, so a tick where
    /// the stick crosses the threshold reads identically to a D-pad
    /// press.
    pub fn finish_analog(&mut self, raw_x: i16, raw_y: i16, dpad: DpadState, deadzone: i16) {
        self.stick_x = apply_deadzone(raw_x, deadzone);
        self.stick_y = apply_deadzone(raw_y, deadzone);
        if self.stick_x != 0.0 || self.stick_y != 0.0 {
            self.is_analog = true;
        }

        if dpad.up {
            self.stick_y = 1.0;
            self.is_analog = false;
        }
        if dpad.down {
            self.stick_y = -1.0;
            self.is_analog = false;
        }
        if dpad.left {
            self.stick_x = -1.0;
            self.is_analog = false;
        }
        if dpad.right {
            self.stick_x = 1.0;
            self.is_analog = false;
        }

        self.apply_edge(Button::Left, self.stick_x < -STICK_DIGITAL_THRESHOLD);
        self.apply_edge(Button::Right, self.stick_x > STICK_DIGITAL_THRESHOLD);
        self.apply_edge(Button::Down, self.stick_y < -STICK_DIGITAL_THRESHOLD);
        self.apply_edge(Button::Up, self.stick_y > STICK_DIGITAL_THRESHOLD);
    }

    /// Start-of-tick copy of this snapshot: held buttons stay held,
    /// transition counts reset, axes clear until the next poll.
    fn seeded_successor(&self) -> ControllerSnapshot {
        let mut next = ControllerSnapshot {
            buttons: [ButtonState::default(); Button::COUNT],
            stick_x: 0.0,
            stick_y: 0.0,
            is_analog: self.is_analog,
            is_connected: self.is_connected,
        };
        for (slot, prev) in next.buttons.iter_mut().zip(self.buttons.iter()) {
            slot.ended_down = prev.ended_down;
        }
        next
    }
}

/// All controller state for one tick.
#[derive(Debug, Clone, Default)]
pub struct InputFrame {
    controllers: [ControllerSnapshot; CONTROLLER_SLOTS],
}

impl InputFrame {
    #[inline]
    pub fn controller(&self, slot: usize) -> &ControllerSnapshot {
        &self.controllers[slot]
    }

    #[inline]
    pub fn controller_mut(&mut self, slot: usize) -> &mut ControllerSnapshot {
        &mut self.controllers[slot]
    }

    #[inline]
    pub fn controllers(&self) -> &[ControllerSnapshot] {
        &self.controllers
    }

    fn seeded_successor(&self) -> InputFrame {
        let mut next = InputFrame::default();
        for (slot, prev) in next.controllers.iter_mut().zip(self.controllers.iter()) {
            *slot = prev.seeded_successor();
        }
        next
    }
}

/// The loop's two input frames.
///
/// `current` receives this tick's events; `previous` is the completed
/// frame the game last consumed. [`InputDoubleBuffer::rotate`] swaps the
/// roles at end of tick and seeds the new current frame.
#[derive(Debug, Default)]
pub struct InputDoubleBuffer {
    frames: [InputFrame; 2],
    current: usize,
}

impl InputDoubleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn current(&self) -> &InputFrame {
        &self.frames[self.current]
    }

    #[inline]
    pub fn current_mut(&mut self) -> &mut InputFrame {
        &mut self.frames[self.current]
    }

    #[inline]
    pub fn previous(&self) -> &InputFrame {
        &self.frames[self.current ^ 1]
    }

    /// End-of-tick swap. The finished frame becomes `previous` and the
    /// new `current` is seeded from it.
    pub fn rotate(&mut self) {
        self.current ^= 1;
        self.frames[self.current] = self.frames[self.current ^ 1].seeded_successor();
    }
}
