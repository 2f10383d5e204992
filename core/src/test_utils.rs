//! Shared test utilities for integration and unit tests

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use crate::audio::ring::{CursorError, RingCursors};
use crate::audio::sync::FillWindow;
use crate::clock::Clock;
use crate::game::{Game, PixelFrame, SoundBuffer};
use crate::host::{AudioSink, Presenter};
use crate::input::{Button, InputFrame, KEYBOARD_SLOT};

/// Shared ordering log the doubles append to.
pub type EventLog = Rc<RefCell<Vec<String>>>;

pub fn new_event_log() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

fn log_event(log: &Option<EventLog>, name: &str) {
    if let Some(log) = log {
        log.borrow_mut().push(name.to_string());
    }
}

// ============================================================================
// Manual Clock
// ============================================================================

struct ManualClockState {
    now: Cell<Duration>,
    advance_per_read: Cell<Duration>,
    sleep_overshoot: Cell<Duration>,
    sleep_calls: Cell<u32>,
    slept_total: Cell<Duration>,
}

/// Scripted clock with shared state.
///
/// Every read advances time a little, like a real clock observed from a
/// spin loop, so waits always terminate. Clones share the same state,
/// letting a test hold a handle to a clock that was moved into the
/// pacer.
#[derive(Clone)]
pub struct ManualClock {
    inner: Rc<ManualClockState>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ManualClockState {
                now: Cell::new(Duration::ZERO),
                advance_per_read: Cell::new(Duration::from_micros(5)),
                sleep_overshoot: Cell::new(Duration::ZERO),
                sleep_calls: Cell::new(0),
                slept_total: Cell::new(Duration::ZERO),
            }),
        }
    }

    /// Make every sleep run long by `overshoot`.
    pub fn with_sleep_overshoot(self, overshoot: Duration) -> Self {
        self.inner.sleep_overshoot.set(overshoot);
        self
    }

    /// Read the time without advancing it.
    pub fn peek(&self) -> Duration {
        self.inner.now.get()
    }

    pub fn set(&self, now: Duration) {
        self.inner.now.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.inner.now.set(self.inner.now.get() + by);
    }

    pub fn sleep_calls(&self) -> u32 {
        self.inner.sleep_calls.get()
    }

    pub fn slept_total(&self) -> Duration {
        self.inner.slept_total.get()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        let now = self.inner.now.get();
        self.inner
            .now
            .set(now + self.inner.advance_per_read.get());
        now
    }

    fn sleep(&self, duration: Duration) {
        self.inner.sleep_calls.set(self.inner.sleep_calls.get() + 1);
        self.inner
            .slept_total
            .set(self.inner.slept_total.get() + duration);
        self.advance(duration + self.inner.sleep_overshoot.get());
    }
}

// ============================================================================
// Scripted Audio Sink
// ============================================================================

/// Audio sink whose cursor reads follow a script.
///
/// The loop reads cursors twice per tick, once for the fill and once
/// after the flip, so scripts are written in pairs. When the script
/// runs out the fallback answer repeats.
pub struct ScriptedSink {
    script: RefCell<VecDeque<Result<RingCursors, CursorError>>>,
    fallback: Cell<Result<RingCursors, CursorError>>,
    /// Every committed window with a copy of its samples.
    pub commits: Vec<(FillWindow, Vec<i16>)>,
    log: Option<EventLog>,
}

impl ScriptedSink {
    pub fn new() -> Self {
        Self {
            script: RefCell::new(VecDeque::new()),
            fallback: Cell::new(Err(CursorError::NotStarted)),
            commits: Vec::new(),
            log: None,
        }
    }

    pub fn with_log(mut self, log: EventLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Answer used once the script is exhausted.
    pub fn with_fallback(self, fallback: Result<RingCursors, CursorError>) -> Self {
        self.fallback.set(fallback);
        self
    }

    pub fn push_cursors(&mut self, play: u32, write: u32) {
        self.script
            .borrow_mut()
            .push_back(Ok(RingCursors { play, write }));
    }

    pub fn push_failure(&mut self, error: CursorError) {
        self.script.borrow_mut().push_back(Err(error));
    }
}

impl Default for ScriptedSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSink for ScriptedSink {
    fn cursors(&self) -> Result<RingCursors, CursorError> {
        log_event(&self.log, "cursors");
        self.script
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| self.fallback.get())
    }

    fn commit(&mut self, window: FillWindow, samples: &[i16]) {
        log_event(&self.log, "commit");
        self.commits.push((window, samples.to_vec()));
    }
}

// ============================================================================
// Capture Presenter
// ============================================================================

/// Presenter that keeps the last presented pixels.
pub struct CapturePresenter {
    pub present_count: u32,
    pub last_pixels: Vec<u32>,
    log: Option<EventLog>,
}

impl CapturePresenter {
    pub fn new() -> Self {
        Self {
            present_count: 0,
            last_pixels: Vec::new(),
            log: None,
        }
    }

    pub fn with_log(mut self, log: EventLog) -> Self {
        self.log = Some(log);
        self
    }
}

impl Default for CapturePresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Presenter for CapturePresenter {
    fn present(&mut self, frame: &PixelFrame) {
        log_event(&self.log, "present");
        self.present_count += 1;
        self.last_pixels = frame.pixels().to_vec();
    }
}

// ============================================================================
// Recording Game
// ============================================================================

/// Game that records what the loop handed it.
///
/// Audio fills are a ramp continuing across ticks, so committed sample
/// runs can be checked for continuity. Renders stamp the tick count
/// into the first pixel.
pub struct RecordingGame {
    pub render_count: u32,
    /// Stereo frame count of every audio request.
    pub audio_requests: Vec<usize>,
    /// Keyboard A-button state observed by each render.
    pub seen_a_down: Vec<bool>,
    next_sample: i16,
    /// Simulated render cost, applied to this clock.
    work_clock: Option<(ManualClock, Duration)>,
    log: Option<EventLog>,
}

impl RecordingGame {
    pub fn new() -> Self {
        Self {
            render_count: 0,
            audio_requests: Vec::new(),
            seen_a_down: Vec::new(),
            next_sample: 0,
            work_clock: None,
            log: None,
        }
    }

    pub fn with_log(mut self, log: EventLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Advance `clock` by `cost` inside every render call.
    pub fn with_render_cost(mut self, clock: ManualClock, cost: Duration) -> Self {
        self.work_clock = Some((clock, cost));
        self
    }
}

impl Default for RecordingGame {
    fn default() -> Self {
        Self::new()
    }
}

impl Game for RecordingGame {
    fn render(&mut self, input: &InputFrame, frame: &mut PixelFrame) {
        log_event(&self.log, "render");
        self.render_count += 1;
        self.seen_a_down
            .push(input.controller(KEYBOARD_SLOT).button(Button::A).ended_down);
        if let Some((clock, cost)) = &self.work_clock {
            clock.advance(*cost);
        }
        frame.pixels_mut()[0] = self.render_count;
    }

    fn generate_audio(&mut self, audio: &mut SoundBuffer<'_>) {
        log_event(&self.log, "generate_audio");
        self.audio_requests.push(audio.frame_count());
        for sample in audio.samples.iter_mut() {
            *sample = self.next_sample;
            self.next_sample = self.next_sample.wrapping_add(1);
        }
    }
}
