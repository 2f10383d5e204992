//! The fixed-cadence tick loop.
//!
//! [`FramePacer`] drives one tick at a time against a [`LoopContext`]
//! holding all mutable loop state. The host owns the event loop and
//! calls [`FramePacer::run_tick`] once per frame.
//!
//! Per-tick ordering is fixed:
//!
//! 1. Render the video frame from the current input snapshot
//! 2. Read hardware cursors and plan the audio fill
//! 3. Generate and commit exactly the planned samples
//! 4. Sleep and spin to the frame boundary
//! 5. Compose diagnostics and present
//! 6. Record flip cursors, publish the tick's marker
//! 7. Rotate the input buffers
//!
//! The audio fill always lands before the present, and the producer
//! index advance always lands before the next tick computes its lock
//! position. Input rotation is last, so the render and the fill of one
//! tick observe the same snapshot.

use std::time::Duration;

use crate::audio::ring::AudioRing;
use crate::audio::sync::{FillParams, FillWindow, LatencyClass, plan_fill};
use crate::clock::Clock;
use crate::debug::markers::MarkerRing;
use crate::debug::metrics::LoopMetrics;
use crate::game::{Game, PixelFrame, SoundBuffer};
use crate::host::{AudioSink, Presenter};
use crate::input::InputDoubleBuffer;
use crate::pacer::{SleepPolicy, WaitReport, wait_until};

/// All mutable state the loop carries across ticks.
///
/// Created at loop start, dropped at loop exit. Nothing in here is
/// shared; the pacer borrows it exclusively for each tick.
pub struct LoopContext {
    /// Producer model of the device's circular buffer
    pub ring: AudioRing,
    /// Double-buffered controller snapshots
    pub input: InputDoubleBuffer,
    /// Per-tick cursor markers for the sync overlay
    pub markers: MarkerRing,
    /// Once-a-second health counters
    pub metrics: LoopMetrics,
    /// Scratch sample storage, reused every tick
    samples: Vec<i16>,
    tick_index: u64,
}

impl LoopContext {
    pub fn new(ring: AudioRing, marker_capacity: usize) -> Self {
        // Worst case fill is the whole ring.
        let format = ring.format();
        let max_samples = (format.capacity_bytes / format.bytes_per_sample) as usize * 2;
        Self {
            ring,
            input: InputDoubleBuffer::new(),
            markers: MarkerRing::new(marker_capacity),
            metrics: LoopMetrics::new(),
            samples: Vec::with_capacity(max_samples),
            tick_index: 0,
        }
    }

    /// Ticks completed since loop start.
    #[inline]
    pub fn tick_index(&self) -> u64 {
        self.tick_index
    }
}

/// What one tick's audio fill did.
#[derive(Debug, Clone, Copy)]
pub struct AudioReport {
    pub window: FillWindow,
    pub latency: LatencyClass,
    pub clamped: bool,
}

/// Timing and audio outcome of one completed tick.
#[derive(Debug, Clone, Copy)]
pub struct TickReport {
    pub tick_index: u64,
    /// Render plus audio fill time, before the wait began.
    pub work: Duration,
    pub wait: WaitReport,
    /// `None` when the cursor read failed and the fill was skipped.
    pub audio: Option<AudioReport>,
}

/// Drives ticks at a fixed cadence.
///
/// Owns the clock and the timing anchors; everything else is borrowed
/// per tick. The next tick's deadline is always this tick's start plus
/// the target duration, measured from the end of the wait, so present
/// cost and event handling eat into the next frame's budget instead of
/// stretching the cadence.
pub struct FramePacer<C: Clock> {
    clock: C,
    update_hz: f32,
    target: Duration,
    sleep: SleepPolicy,
    last_tick_start: Duration,
    last_flip: Duration,
    started: bool,
}

impl<C: Clock> FramePacer<C> {
    /// Create a pacer targeting `update_hz` ticks per second.
    ///
    /// `update_hz` must be positive and finite.
    pub fn new(clock: C, update_hz: f32, sleep: SleepPolicy) -> Self {
        let target = Duration::from_secs_f32(1.0 / update_hz);
        Self {
            clock,
            update_hz,
            target,
            sleep,
            last_tick_start: Duration::ZERO,
            last_flip: Duration::ZERO,
            started: false,
        }
    }

    #[inline]
    pub fn update_hz(&self) -> f32 {
        self.update_hz
    }

    #[inline]
    pub fn target_frame_duration(&self) -> Duration {
        self.target
    }

    #[inline]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Run one complete tick.
    ///
    /// `compose` runs after the wait and immediately before the
    /// present, with the tick's fill marker already recorded; the sync
    /// overlay hooks in here. Pass a no-op closure to present the
    /// frame untouched.
    pub fn run_tick(
        &mut self,
        ctx: &mut LoopContext,
        game: &mut dyn Game,
        sink: &mut dyn AudioSink,
        presenter: &mut dyn Presenter,
        frame: &mut PixelFrame,
        compose: impl FnOnce(&mut PixelFrame, &MarkerRing),
    ) -> TickReport {
        if !self.started {
            let now = self.clock.now();
            self.last_tick_start = now;
            self.last_flip = now;
            self.started = true;
        }
        let tick_start = self.last_tick_start;

        game.render(ctx.input.current(), frame);

        let audio = match sink.cursors() {
            Ok(cursors) => {
                if !ctx.ring.is_anchored() {
                    ctx.ring.anchor_to(cursors);
                }

                let format = ctx.ring.format();
                let seconds_into_frame = self
                    .clock
                    .now()
                    .saturating_sub(self.last_flip)
                    .as_secs_f32();
                let plan = plan_fill(&FillParams {
                    cursors,
                    byte_to_lock: ctx.ring.byte_to_lock(),
                    capacity_bytes: format.capacity_bytes,
                    expected_bytes_per_frame: ctx.ring.expected_bytes_per_frame(self.update_hz),
                    safety_bytes: ctx.ring.safety_bytes(),
                    seconds_into_frame,
                    target_seconds_per_frame: self.target.as_secs_f32(),
                });

                let frames_to_fill =
                    (plan.window.bytes_to_write / format.bytes_per_sample) as usize;
                ctx.samples.clear();
                ctx.samples.resize(frames_to_fill * 2, 0);
                let mut buffer = SoundBuffer {
                    samples_per_second: format.samples_per_second,
                    samples: &mut ctx.samples,
                };
                game.generate_audio(&mut buffer);

                sink.commit(plan.window, &ctx.samples);
                ctx.ring.advance(plan.window.bytes_to_write);
                ctx.markers
                    .record_fill(cursors, plan.window, plan.expected_boundary);

                Some(AudioReport {
                    window: plan.window,
                    latency: plan.latency,
                    clamped: plan.clamped,
                })
            }
            Err(err) => {
                ctx.ring.invalidate();
                tracing::debug!("audio fill skipped this tick: {err}");
                None
            }
        };

        let work = self.clock.now().saturating_sub(tick_start);
        let wait = wait_until(&self.clock, tick_start + self.target, self.sleep);
        let next_tick_start = self.clock.now();

        compose(frame, &ctx.markers);
        presenter.present(frame);
        let flip_time = self.clock.now();

        if let Ok(cursors) = sink.cursors() {
            ctx.markers.record_flip(cursors);
        }
        ctx.markers.advance();
        ctx.input.rotate();

        let report = TickReport {
            tick_index: ctx.tick_index,
            work,
            wait,
            audio,
        };
        ctx.tick_index += 1;
        self.last_tick_start = next_tick_start;
        self.last_flip = flip_time;

        ctx.metrics.record_tick(&report);
        ctx.metrics.maybe_log(flip_time);

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::ring::RingFormat;

    #[test]
    fn test_context_reserves_worst_case_samples() {
        let ctx = LoopContext::new(AudioRing::new(RingFormat::stereo_16(48000), 1600), 15);
        assert!(ctx.samples.capacity() >= 48000 * 2);
        assert_eq!(ctx.tick_index(), 0);
        assert_eq!(ctx.markers.capacity(), 15);
    }

    #[test]
    fn test_pacer_target_from_rate() {
        let pacer = FramePacer::new(
            crate::clock::MonotonicClock::new(),
            30.0,
            SleepPolicy::default(),
        );
        let target = pacer.target_frame_duration();
        assert!(target > Duration::from_micros(33_330));
        assert!(target < Duration::from_micros(33_340));
        assert_eq!(pacer.update_hz(), 30.0);
    }
}
