//! Integration tests for the frame loop
//!
//! Drives whole ticks against scripted doubles: cadence under light and
//! heavy work, fill windows flowing into the sink, cursor failure
//! recovery, input rotation, and marker publication.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::audio::ring::{AudioRing, CursorError, RingCursors, RingFormat};
    use crate::audio::sync::LatencyClass;
    use crate::game::PixelFrame;
    use crate::input::{Button, KEYBOARD_SLOT};
    use crate::pacer::SleepPolicy;
    use crate::runner::{FramePacer, LoopContext};
    use crate::test_utils::{
        CapturePresenter, ManualClock, RecordingGame, ScriptedSink, new_event_log,
    };

    const TARGET: Duration = Duration::from_nanos(33_333_333);

    fn context() -> LoopContext {
        LoopContext::new(AudioRing::new(RingFormat::stereo_16(48000), 1600), 15)
    }

    fn pacer(clock: ManualClock) -> FramePacer<ManualClock> {
        FramePacer::new(clock, 30.0, SleepPolicy::default())
    }

    // ============================================================================
    // Tick Ordering
    // ============================================================================

    #[test]
    fn test_tick_phase_order() {
        let log = new_event_log();
        let mut ctx = context();
        let mut game = RecordingGame::new().with_log(log.clone());
        let mut sink = ScriptedSink::new()
            .with_fallback(Ok(RingCursors {
                play: 0,
                write: 4800,
            }))
            .with_log(log.clone());
        let mut presenter = CapturePresenter::new().with_log(log.clone());
        let mut frame = PixelFrame::new(8, 8);
        let mut pacer = pacer(ManualClock::new());

        pacer.run_tick(
            &mut ctx,
            &mut game,
            &mut sink,
            &mut presenter,
            &mut frame,
            |_, _| {},
        );

        assert_eq!(
            log.borrow().as_slice(),
            [
                "render",
                "cursors",
                "generate_audio",
                "commit",
                "present",
                "cursors",
            ],
            "fill lands before present, flip cursors read after"
        );
    }

    // ============================================================================
    // Pacing
    // ============================================================================

    #[test]
    fn test_cadence_holds_under_light_work() {
        let clock = ManualClock::new();
        let mut ctx = context();
        let mut game = RecordingGame::new();
        let mut sink = ScriptedSink::new().with_fallback(Ok(RingCursors {
            play: 0,
            write: 4800,
        }));
        let mut presenter = CapturePresenter::new();
        let mut frame = PixelFrame::new(8, 8);
        let mut pacer = pacer(clock.clone());

        for _ in 0..5 {
            let report = pacer.run_tick(
                &mut ctx,
                &mut game,
                &mut sink,
                &mut presenter,
                &mut frame,
                |_, _| {},
            );
            assert!(report.wait.overran_by.is_none());
        }

        let elapsed = clock.peek();
        assert!(elapsed >= TARGET * 5, "loop finished early: {elapsed:?}");
        assert!(
            elapsed < TARGET * 5 + Duration::from_millis(2),
            "loop drifted: {elapsed:?}"
        );
        assert_eq!(clock.sleep_calls(), 5, "one coarse sleep per tick");
        assert_eq!(presenter.present_count, 5);
    }

    #[test]
    fn test_heavy_work_skips_wait_and_recovers() {
        let clock = ManualClock::new();
        let mut ctx = context();
        let mut game =
            RecordingGame::new().with_render_cost(clock.clone(), Duration::from_millis(50));
        let mut sink = ScriptedSink::new().with_fallback(Ok(RingCursors {
            play: 0,
            write: 4800,
        }));
        let mut presenter = CapturePresenter::new();
        let mut frame = PixelFrame::new(8, 8);
        let mut pacer = pacer(clock.clone());

        let report = pacer.run_tick(
            &mut ctx,
            &mut game,
            &mut sink,
            &mut presenter,
            &mut frame,
            |_, _| {},
        );

        assert!(report.work >= Duration::from_millis(50));
        let overran = report.wait.overran_by.expect("tick blew its budget");
        assert!(overran >= Duration::from_millis(16));
        assert_eq!(clock.sleep_calls(), 0, "an overrun tick never sleeps");
        assert_eq!(ctx.metrics.overruns, 1);

        // The next tick re-anchors from the late boundary and paces
        // normally again.
        let before = clock.peek();
        let report = pacer.run_tick(
            &mut ctx,
            &mut game,
            &mut sink,
            &mut presenter,
            &mut frame,
            |_, _| {},
        );
        assert!(report.wait.overran_by.is_some(), "50ms work still overruns");
        assert!(clock.peek() - before >= Duration::from_millis(50));
    }

    // ============================================================================
    // Audio Fill
    // ============================================================================

    #[test]
    fn test_first_tick_anchors_and_fills_to_target() {
        let mut ctx = context();
        let mut game = RecordingGame::new();
        let mut sink = ScriptedSink::new();
        sink.push_cursors(0, 4800);
        sink.push_cursors(160, 4960);
        let mut presenter = CapturePresenter::new();
        let mut frame = PixelFrame::new(8, 8);
        let mut pacer = pacer(ManualClock::new());

        let report = pacer.run_tick(
            &mut ctx,
            &mut game,
            &mut sink,
            &mut presenter,
            &mut frame,
            |_, _| {},
        );

        // The producer seeds from the write cursor, then fills up to
        // one frame plus margin past it.
        let audio = report.audio.expect("cursors were readable");
        assert_eq!(audio.latency, LatencyClass::High);
        assert_eq!(sink.commits.len(), 1);
        let (window, samples) = &sink.commits[0];
        assert_eq!(window.byte_to_lock, 4800);
        assert_eq!(window.bytes_to_write, 8000);
        assert_eq!(samples.len(), 8000 / 4 * 2);
        assert_eq!(game.audio_requests, vec![2000]);

        // Producer position advanced to exactly the fill target.
        assert!(ctx.ring.is_anchored());
        assert_eq!(ctx.ring.byte_to_lock(), 12800);

        let marker = ctx.markers.latest().expect("tick published its marker");
        assert_eq!(marker.fill_play_cursor, 0);
        assert_eq!(marker.fill_write_cursor, 4800);
        assert_eq!(marker.fill_location, 4800);
        assert_eq!(marker.fill_byte_count, 8000);
        assert_eq!(marker.flip_play_cursor, 160);
        assert_eq!(marker.flip_write_cursor, 4960);
        // The boundary prediction shrinks by the sliver of time already
        // spent, so it sits just under one full frame.
        assert!(marker.expected_flip_play_cursor <= 6400);
        assert!(marker.expected_flip_play_cursor > 6300);
    }

    #[test]
    fn test_committed_samples_are_continuous() {
        let mut ctx = context();
        let mut game = RecordingGame::new();
        let mut sink = ScriptedSink::new();
        // Device consumes one frame per tick.
        for tick in 0..3u32 {
            let play = tick * 6400;
            sink.push_cursors(play, play + 4800);
            sink.push_cursors(play + 160, play + 4960);
        }
        let mut presenter = CapturePresenter::new();
        let mut frame = PixelFrame::new(8, 8);
        let mut pacer = pacer(ManualClock::new());

        for _ in 0..3 {
            let report = pacer.run_tick(
                &mut ctx,
                &mut game,
                &mut sink,
                &mut presenter,
                &mut frame,
                |_, _| {},
            );
            assert!(report.audio.is_some());
        }

        // After the first catch-up fill the window settles at one frame
        // per tick.
        assert_eq!(sink.commits[0].0.bytes_to_write, 8000);
        assert_eq!(sink.commits[1].0.bytes_to_write, 6400);
        assert_eq!(sink.commits[2].0.bytes_to_write, 6400);

        // Each commit starts where the previous one ended.
        let mut expected_lock = 4800u32;
        for (window, _) in &sink.commits {
            assert_eq!(window.byte_to_lock, expected_lock);
            expected_lock = (window.byte_to_lock + window.bytes_to_write) % 192_000;
        }

        // The generator was asked for exactly the committed lengths,
        // with no samples dropped or duplicated between ticks.
        let all: Vec<i16> = sink
            .commits
            .iter()
            .flat_map(|(_, samples)| samples.iter().copied())
            .collect();
        let expected: Vec<i16> = (0..all.len() as i32).map(|s| s as i16).collect();
        assert_eq!(all, expected);
    }

    #[test]
    fn test_cursor_failure_skips_fill_then_reanchors() {
        let mut ctx = context();
        let mut game = RecordingGame::new();
        let mut sink = ScriptedSink::new();
        sink.push_failure(CursorError::NotStarted);
        sink.push_failure(CursorError::NotStarted);
        sink.push_cursors(1000, 1480);
        sink.push_cursors(1160, 1640);
        let mut presenter = CapturePresenter::new();
        let mut frame = PixelFrame::new(8, 8);
        let mut pacer = pacer(ManualClock::new());

        let report = pacer.run_tick(
            &mut ctx,
            &mut game,
            &mut sink,
            &mut presenter,
            &mut frame,
            |_, _| {},
        );
        assert!(report.audio.is_none());
        assert!(sink.commits.is_empty(), "no fill without cursors");
        assert!(game.audio_requests.is_empty());
        assert!(!ctx.ring.is_anchored());
        assert_eq!(ctx.metrics.cursor_failures, 1);
        assert_eq!(presenter.present_count, 1, "video is unaffected");

        let report = pacer.run_tick(
            &mut ctx,
            &mut game,
            &mut sink,
            &mut presenter,
            &mut frame,
            |_, _| {},
        );
        let audio = report.audio.expect("cursors recovered");
        assert!(ctx.ring.is_anchored());
        // Re-anchored at the fresh write cursor, not the stale index.
        assert_eq!(audio.window.byte_to_lock, 1480);
        assert_eq!(sink.commits.len(), 1);
    }

    // ============================================================================
    // Input Rotation
    // ============================================================================

    #[test]
    fn test_rotation_carries_held_buttons_across_ticks() {
        let mut ctx = context();
        let mut game = RecordingGame::new();
        let mut sink = ScriptedSink::new().with_fallback(Ok(RingCursors {
            play: 0,
            write: 4800,
        }));
        let mut presenter = CapturePresenter::new();
        let mut frame = PixelFrame::new(8, 8);
        let mut pacer = pacer(ManualClock::new());

        // Host applies a key-down before the tick runs.
        ctx.input
            .current_mut()
            .controller_mut(KEYBOARD_SLOT)
            .apply_edge(Button::A, true);

        pacer.run_tick(
            &mut ctx,
            &mut game,
            &mut sink,
            &mut presenter,
            &mut frame,
            |_, _| {},
        );
        // No events between ticks: the held key must persist.
        pacer.run_tick(
            &mut ctx,
            &mut game,
            &mut sink,
            &mut presenter,
            &mut frame,
            |_, _| {},
        );

        // Key released before the third tick.
        ctx.input
            .current_mut()
            .controller_mut(KEYBOARD_SLOT)
            .apply_edge(Button::A, false);
        pacer.run_tick(
            &mut ctx,
            &mut game,
            &mut sink,
            &mut presenter,
            &mut frame,
            |_, _| {},
        );

        assert_eq!(game.seen_a_down, vec![true, true, false]);

        // The finished frame is readable as previous, seeded current is
        // edge-free.
        let previous = ctx.input.previous().controller(KEYBOARD_SLOT);
        assert_eq!(previous.button(Button::A).transition_count, 1);
        let current = ctx.input.current().controller(KEYBOARD_SLOT);
        assert_eq!(current.button(Button::A).transition_count, 0);
        assert!(!current.button(Button::A).ended_down);
    }

    // ============================================================================
    // Markers
    // ============================================================================

    #[test]
    fn test_each_tick_publishes_one_marker() {
        let mut ctx = context();
        let mut game = RecordingGame::new();
        let mut sink = ScriptedSink::new();
        for tick in 0..4u32 {
            let play = tick * 6400;
            sink.push_cursors(play, play + 4800);
            sink.push_cursors(play + 160, play + 4960);
        }
        let mut presenter = CapturePresenter::new();
        let mut frame = PixelFrame::new(8, 8);
        let mut pacer = pacer(ManualClock::new());

        for _ in 0..4 {
            pacer.run_tick(
                &mut ctx,
                &mut game,
                &mut sink,
                &mut presenter,
                &mut frame,
                |_, _| {},
            );
        }

        assert_eq!(ctx.markers.len(), 4);
        let fill_plays: Vec<u32> = ctx.markers.iter().map(|m| m.fill_play_cursor).collect();
        assert_eq!(fill_plays, vec![0, 6400, 12800, 19200], "oldest first");
        assert_eq!(ctx.markers.latest().unwrap().flip_play_cursor, 19360);
        assert_eq!(ctx.tick_index(), 4);
    }
}
