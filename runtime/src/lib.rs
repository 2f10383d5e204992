//! Framelock runtime - windowed host for the fixed-cadence loop
//!
//! This crate binds the loop core to real devices: a winit window with
//! a wgpu blit presenter, a cpal output stream behind the cursor-based
//! ring model, and gamepad/keyboard capture feeding the input double
//! buffer. The bundled demo payload draws a scrolling gradient and
//! plays a controllable sine tone.

pub mod app;
pub mod audio;
pub mod config;
pub mod demo;
pub mod input;
pub mod overlay;
pub mod presenter;

/// Fixed internal render resolution, scaled to the window on present.
pub const BACKBUFFER_WIDTH: u32 = 960;
pub const BACKBUFFER_HEIGHT: u32 = 540;
