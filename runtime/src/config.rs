//! Configuration management (config.toml in the platform config directory)
//!
//! Handles loading, saving, and providing defaults for runtime settings.
//! Settings are stored in TOML format in the platform-specific config directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use framelock_core::STICK_DEADZONE;

/// Runtime configuration.
///
/// Contains all user-configurable settings organized into sections.
/// Serialized to/from TOML format for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Video/window settings
    #[serde(default)]
    pub video: VideoConfig,
    /// Audio settings
    #[serde(default)]
    pub audio: AudioConfig,
    /// Input/controller settings
    #[serde(default)]
    pub input: InputConfig,
    /// Debug overlay settings
    #[serde(default)]
    pub debug: DebugConfig,
}

/// Scaling mode for the backbuffer when blitted to the window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ScaleMode {
    /// Stretch to fill window (may distort aspect ratio)
    Stretch,
    /// Maintain aspect ratio, scale to fill as much as possible (adds letterbox bars)
    #[default]
    Fit,
    /// Integer scaling for pixel-perfect rendering (adds black bars, may not fill screen)
    PixelPerfect,
}

/// Video and window configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Initial window width in logical pixels (default: 1280)
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    /// Initial window height in logical pixels (default: 720)
    #[serde(default = "default_window_height")]
    pub window_height: u32,
    /// Fixed update rate in Hz. 0 means derive from the monitor
    /// refresh rate (half of it, matching the cadence the loop was
    /// tuned for). (default: 0)
    #[serde(default)]
    pub update_hz: u32,
    /// Scaling mode for the backbuffer (default: Fit)
    #[serde(default)]
    pub scale_mode: ScaleMode,
}

/// Audio configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Preferred output sample rate in Hz (default: 48000)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Safety margin as a divisor of one frame of audio. 3 means the
    /// margin is a third of a frame. (default: 3)
    #[serde(default = "default_safety_divisor")]
    pub safety_divisor: u32,
}

/// Input configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Analog stick dead zone, raw units out of 32767 (default: 7849)
    #[serde(default = "default_stick_deadzone")]
    pub stick_deadzone: i16,
}

/// Debug overlay configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugConfig {
    /// Draw the audio sync overlay on startup (default: false)
    #[serde(default)]
    pub sync_overlay: bool,
}

fn default_window_width() -> u32 {
    1280
}
fn default_window_height() -> u32 {
    720
}
fn default_sample_rate() -> u32 {
    48000
}
fn default_safety_divisor() -> u32 {
    3
}
fn default_stick_deadzone() -> i16 {
    STICK_DEADZONE
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            window_width: default_window_width(),
            window_height: default_window_height(),
            update_hz: 0,
            scale_mode: ScaleMode::default(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            safety_divisor: default_safety_divisor(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            stick_deadzone: default_stick_deadzone(),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            sync_overlay: false,
        }
    }
}

/// Returns the platform-specific configuration directory.
///
/// On Windows: `%APPDATA%\Framelock\config`
/// On macOS: `~/Library/Application Support/io.framelock.Framelock`
/// On Linux: `~/.config/Framelock`
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io.framelock", "", "Framelock")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Loads the configuration from disk.
///
/// Reads `config.toml` from the platform's configuration directory.
/// Returns default values if the file doesn't exist or cannot be parsed.
pub fn load() -> Config {
    config_dir()
        .map(|dir| load_from_path(&dir.join("config.toml")))
        .unwrap_or_default()
}

/// Loads the configuration from an explicit path.
///
/// Returns default values if the file doesn't exist or cannot be parsed.
pub fn load_from_path(path: &Path) -> Config {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|content| toml::from_str(&content).ok())
        .unwrap_or_default()
}

/// Saves the configuration to disk.
///
/// Writes `config.toml` to the platform's configuration directory.
/// Creates the directory if it doesn't exist.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file
/// cannot be written.
pub fn save(config: &Config) -> std::io::Result<()> {
    if let Some(dir) = config_dir() {
        std::fs::create_dir_all(&dir)?;
        save_to_path(config, &dir.join("config.toml"))?;
    }
    Ok(())
}

/// Saves the configuration to an explicit path.
pub fn save_to_path(config: &Config, path: &Path) -> std::io::Result<()> {
    let content = toml::to_string_pretty(config).unwrap();
    std::fs::write(path, content)
}

#[cfg(test)]
mod tests {
    use super::*;

    // =============================================================
    // Default value tests
    // =============================================================

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.video.window_width, 1280);
        assert_eq!(config.video.window_height, 720);
        assert_eq!(config.video.update_hz, 0);
        assert_eq!(config.video.scale_mode, ScaleMode::Fit);
        assert_eq!(config.audio.sample_rate, 48000);
        assert_eq!(config.audio.safety_divisor, 3);
        assert_eq!(config.input.stick_deadzone, STICK_DEADZONE);
        assert!(!config.debug.sync_overlay);
    }

    // =============================================================
    // TOML serialization tests
    // =============================================================

    #[test]
    fn test_config_serialize_roundtrip() {
        let config = Config {
            video: VideoConfig {
                window_width: 960,
                window_height: 540,
                update_hz: 60,
                scale_mode: ScaleMode::PixelPerfect,
            },
            audio: AudioConfig {
                sample_rate: 44100,
                safety_divisor: 4,
            },
            input: InputConfig {
                stick_deadzone: 5000,
            },
            debug: DebugConfig { sync_overlay: true },
        };

        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed, config);
    }

    #[test]
    fn test_config_deserialize_empty() {
        // Empty TOML should produce defaults
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_deserialize_partial_video() {
        // Only set update_hz, rest should default
        let toml_str = r#"
[video]
update_hz = 30
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.video.update_hz, 30);
        assert_eq!(config.video.window_width, 1280); // default
        assert_eq!(config.video.scale_mode, ScaleMode::Fit); // default
    }

    #[test]
    fn test_config_deserialize_partial_audio() {
        let toml_str = r#"
[audio]
sample_rate = 44100
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.audio.sample_rate, 44100);
        assert_eq!(config.audio.safety_divisor, 3); // default
        // video should be default
        assert_eq!(config.video.window_width, 1280);
    }

    #[test]
    fn test_video_config_serialize() {
        let video = VideoConfig {
            window_width: 1920,
            window_height: 1080,
            update_hz: 72,
            scale_mode: ScaleMode::Stretch,
        };
        let toml_str = toml::to_string(&video).unwrap();
        assert!(toml_str.contains("window_width = 1920"));
        assert!(toml_str.contains("window_height = 1080"));
        assert!(toml_str.contains("update_hz = 72"));
    }

    // =============================================================
    // File round-trip tests
    // =============================================================

    #[test]
    fn test_save_and_load_path_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.video.update_hz = 30;
        config.debug.sync_overlay = true;

        save_to_path(&config, &path).unwrap();
        let loaded = load_from_path(&path);

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_from_path(&dir.path().join("does_not_exist.toml"));
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_load_corrupt_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not [ valid { toml").unwrap();

        let loaded = load_from_path(&path);
        assert_eq!(loaded, Config::default());
    }
}
