use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Capture half of the runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureOptions {
    /// Capture backend name (see `--list-methods`).
    #[serde(alias = "mechanism")]
    pub method: String,
    /// Left edge of the capture rectangle, in screen pixels.
    pub x: i32,
    /// Top edge of the capture rectangle, in screen pixels.
    pub y: i32,
    pub width:  u32,
    pub height: u32,
    /// Pacing target in frames per second.
    pub fps: u32,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            method: "x11".to_owned(),
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            fps: 25,
        }
    }
}

impl CaptureOptions {
    /// Interval between paced deliveries: 25 fps → 40 ms.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / self.fps.max(1) as u64)
    }
}

/// Output half of the runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    /// UDP endpoint of the pixel mapper, `host:port` or a bare host.
    pub target: String,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self { target: String::new() }
    }
}

/// Full runtime configuration; also the schema of the `-c/--config` file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub capture: CaptureOptions,
    pub output:  OutputOptions,
}
