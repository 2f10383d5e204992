//! Windowed application driving the loop against real devices.
//!
//! The window, GPU surface, and audio stream only exist after winit
//! delivers `resumed`, so everything device-backed lives in [`Running`]
//! and is built there. The loop itself runs from `RedrawRequested`;
//! `about_to_wait` keeps redraws coming and the pacer holds the
//! cadence by sleeping inside the tick.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use framelock_core::{
    AudioRing, AudioSink, FramePacer, KEYBOARD_SLOT, LoopContext, MonotonicClock, PixelFrame,
    RingFormat, SleepPolicy,
};

use crate::audio::{AudioOutput, MutedSink};
use crate::config::Config;
use crate::demo::GradientDemo;
use crate::input::InputManager;
use crate::overlay;
use crate::presenter::SurfacePresenter;
use crate::{BACKBUFFER_HEIGHT, BACKBUFFER_WIDTH};

/// Update rate used when the monitor refresh rate cannot be read.
const FALLBACK_UPDATE_HZ: u32 = 30;

/// Window-dependent state, built on `resumed`.
struct Running {
    window: Arc<Window>,
    presenter: SurfacePresenter,
    sink: Box<dyn AudioSink>,
    pacer: FramePacer<MonotonicClock>,
    ctx: LoopContext,
    game: GradientDemo,
    frame: PixelFrame,
}

/// The windowed host application.
pub struct App {
    config: Config,
    audio_enabled: bool,
    overlay_enabled: bool,
    input: InputManager,
    running: Option<Running>,
}

impl App {
    pub fn new(config: Config, audio_enabled: bool) -> Self {
        let input = InputManager::new(config.input.stick_deadzone);
        let overlay_enabled = config.debug.sync_overlay;
        Self {
            config,
            audio_enabled,
            overlay_enabled,
            input,
            running: None,
        }
    }

    /// Fixed update rate for this session.
    ///
    /// A configured rate wins; otherwise target half the monitor
    /// refresh, the cadence a synced flip can actually hold.
    fn pick_update_hz(&self, window: &Window) -> u32 {
        if self.config.video.update_hz > 0 {
            return self.config.video.update_hz;
        }
        window
            .current_monitor()
            .and_then(|monitor| monitor.refresh_rate_millihertz())
            .map(|mhz| mhz / 2000)
            .filter(|&hz| hz > 0)
            .unwrap_or(FALLBACK_UPDATE_HZ)
    }

    fn init_running(&mut self, event_loop: &ActiveEventLoop) -> Result<Running> {
        let window_attributes = Window::default_attributes()
            .with_title("Framelock")
            .with_inner_size(LogicalSize::new(
                self.config.video.window_width,
                self.config.video.window_height,
            ));
        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .context("Failed to create window")?,
        );

        let update_hz = self.pick_update_hz(&window);

        let presenter = SurfacePresenter::new(
            window.clone(),
            BACKBUFFER_WIDTH,
            BACKBUFFER_HEIGHT,
            self.config.video.scale_mode,
        )?;

        // The ring adopts whatever rate the device actually opened at.
        let (sink, sample_rate): (Box<dyn AudioSink>, u32) = if self.audio_enabled {
            match AudioOutput::new(self.config.audio.sample_rate) {
                Ok(output) => {
                    let rate = output.sample_rate();
                    (Box::new(output), rate)
                }
                Err(err) => {
                    warn!("Audio unavailable, running muted: {err:#}");
                    (Box::new(MutedSink), self.config.audio.sample_rate)
                }
            }
        } else {
            (Box::new(MutedSink), self.config.audio.sample_rate)
        };

        let format = RingFormat::stereo_16(sample_rate);
        let bytes_per_frame =
            ((format.samples_per_second * format.bytes_per_sample) as f32 / update_hz as f32) as u32;
        let safety_bytes = bytes_per_frame / self.config.audio.safety_divisor.max(1);
        let ring = AudioRing::new(format, safety_bytes);

        // Half a second of markers for the sync display.
        let marker_capacity = (update_hz / 2).max(1) as usize;
        let mut ctx = LoopContext::new(ring, marker_capacity);
        // The keyboard slot is always attached.
        ctx.input
            .current_mut()
            .controller_mut(KEYBOARD_SLOT)
            .is_connected = true;

        let pacer = FramePacer::new(
            MonotonicClock::new(),
            update_hz as f32,
            SleepPolicy::default(),
        );

        info!(
            "Loop running at {} Hz: ring {} bytes, safety {} bytes, {} markers",
            update_hz, format.capacity_bytes, safety_bytes, marker_capacity
        );

        Ok(Running {
            window,
            presenter,
            sink,
            pacer,
            ctx,
            game: GradientDemo::new(),
            frame: PixelFrame::new(BACKBUFFER_WIDTH, BACKBUFFER_HEIGHT),
        })
    }

    fn handle_key_input(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        if event.state == ElementState::Pressed && !event.repeat {
            match event.physical_key {
                PhysicalKey::Code(KeyCode::Escape) => {
                    event_loop.exit();
                    return;
                }
                PhysicalKey::Code(KeyCode::F3) => {
                    self.overlay_enabled = !self.overlay_enabled;
                    info!(
                        "Sync display {}",
                        if self.overlay_enabled { "on" } else { "off" }
                    );
                    return;
                }
                _ => {}
            }
        }

        if let Some(running) = &mut self.running {
            self.input
                .handle_key_event(running.ctx.input.current_mut(), event);
        }
    }

    fn run_tick(&mut self, event_loop: &ActiveEventLoop) {
        let Some(running) = &mut self.running else {
            return;
        };

        self.input.poll_gamepads(running.ctx.input.current_mut());

        let overlay_enabled = self.overlay_enabled;
        let capacity_bytes = running.ctx.ring.format().capacity_bytes;
        running.pacer.run_tick(
            &mut running.ctx,
            &mut running.game,
            running.sink.as_mut(),
            &mut running.presenter,
            &mut running.frame,
            |frame, markers| {
                if overlay_enabled {
                    overlay::draw_sync_display(frame, markers, capacity_bytes);
                }
            },
        );

        if !running.presenter.is_healthy() {
            error!("Presentation failed, exiting");
            event_loop.exit();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }
        match self.init_running(event_loop) {
            Ok(running) => {
                running.window.request_redraw();
                self.running = Some(running);
            }
            Err(err) => {
                error!("Failed to initialize window: {err:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Window close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(running) = &mut self.running {
                    running.presenter.resize(size.width, size.height);
                }
            }
            WindowEvent::KeyboardInput {
                event: key_event, ..
            } => {
                self.handle_key_input(event_loop, &key_event);
            }
            WindowEvent::RedrawRequested => {
                self.run_tick(event_loop);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // The pacer sleeps inside the tick, so the loop just needs a
        // steady stream of redraws.
        event_loop.set_control_flow(ControlFlow::Poll);
        if let Some(running) = &self.running {
            running.window.request_redraw();
        }
    }
}

/// Open the window and run until exit.
pub fn run(config: Config, audio_enabled: bool) -> Result<()> {
    let event_loop = EventLoop::new()?;

    let mut app = App::new(config, audio_enabled);
    event_loop.run_app(&mut app)?;

    Ok(())
}
