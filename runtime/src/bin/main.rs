//! Framelock - Fixed-cadence loop host
//!
//! Runs the gradient demo under the fixed-cadence loop: paced video, a
//! synced audio tone, keyboard and gamepad input.
//!
//! # Usage
//!
//! ```bash
//! framelock
//! framelock --update-hz 60
//! framelock --overlay
//! framelock --no-audio
//! ```
//!
//! # Keyboard Shortcuts
//!
//! - ESC: Quit
//! - F3: Toggle audio sync display
//! - Arrows/WASD: Pan the gradient (left stick also bends the tone)
//! - Enter: Recenter

use anyhow::Result;
use clap::Parser;

use framelock_runtime::app;
use framelock_runtime::config;

#[derive(Parser)]
#[command(name = "framelock")]
#[command(author, version, about = "Fixed-cadence frame loop with synced audio")]
struct Args {
    /// Fixed update rate in Hz (default: half the monitor refresh rate)
    #[arg(long)]
    update_hz: Option<u32>,

    /// Window width in logical pixels
    #[arg(long)]
    width: Option<u32>,

    /// Window height in logical pixels
    #[arg(long)]
    height: Option<u32>,

    /// Show the audio sync display on startup
    #[arg(long)]
    overlay: bool,

    /// Run without opening an audio stream
    #[arg(long)]
    no_audio: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut config = config::load();
    if let Some(hz) = args.update_hz {
        if hz == 0 || hz > 1000 {
            anyhow::bail!("Update rate must be between 1 and 1000 Hz");
        }
        config.video.update_hz = hz;
    }
    if let Some(width) = args.width {
        config.video.window_width = width;
    }
    if let Some(height) = args.height {
        config.video.window_height = height;
    }
    if args.overlay {
        config.debug.sync_overlay = true;
    }

    tracing::info!("Starting Framelock");

    app::run(config, !args.no_audio)
}
