//! Command line surface.
//!
//! Flags mirror the config file field for field; an explicit flag always
//! wins over whatever the file set.

use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;

use ledcast_core::Config;

#[derive(Parser, Debug)]
#[command(name = "ledcast", author, version, about)]
pub struct Cli {
    /// Capture method name (see --list-methods)
    #[arg(short, long)]
    pub method: Option<String>,

    /// Left edge of the capture rectangle
    #[arg(short, long, allow_negative_numbers = true)]
    pub x: Option<i32>,

    /// Top edge of the capture rectangle
    #[arg(short, long, allow_negative_numbers = true)]
    pub y: Option<i32>,

    /// Capture rectangle size
    #[arg(short, long, value_name = "WxH")]
    pub dimensions: Option<Dimensions>,

    /// Pacing target in frames per second
    #[arg(short, long)]
    pub fps: Option<u32>,

    /// Pixel mapper endpoint, host:port or a bare host
    #[arg(short, long)]
    pub target: Option<String>,

    /// JSON config file; flags override its values
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Print the registered capture methods and exit
    #[arg(long)]
    pub list_methods: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width:  u32,
    pub height: u32,
}

impl FromStr for Dimensions {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WxH, got \"{s}\""))?;
        let width = w.parse().map_err(|_| format!("invalid width \"{w}\""))?;
        let height = h.parse().map_err(|_| format!("invalid height \"{h}\""))?;
        Ok(Self { width, height })
    }
}

impl Cli {
    /// Folds explicit flags over `base`, leaving unset fields alone.
    pub fn merged_config(&self, mut base: Config) -> Config {
        if let Some(method) = &self.method {
            base.capture.method = method.clone();
        }
        if let Some(x) = self.x {
            base.capture.x = x;
        }
        if let Some(y) = self.y {
            base.capture.y = y;
        }
        if let Some(dims) = self.dimensions {
            base.capture.width = dims.width;
            base.capture.height = dims.height;
        }
        if let Some(fps) = self.fps {
            base.capture.fps = fps;
        }
        if let Some(target) = &self.target {
            base.output.target = target.clone();
        }
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_dimensions() {
        assert_eq!("192x128".parse(), Ok(Dimensions { width: 192, height: 128 }));
        assert_eq!("64X32".parse(), Ok(Dimensions { width: 64, height: 32 }));
        assert!("192".parse::<Dimensions>().is_err());
        assert!("x128".parse::<Dimensions>().is_err());
        assert!("192xbroad".parse::<Dimensions>().is_err());
    }

    #[test]
    fn flags_override_config_file_values() {
        let cli = Cli::parse_from([
            "ledcast",
            "-m",
            "x11-argb",
            "--dimensions",
            "64x32",
            "-t",
            "mapper.local:19523",
        ]);

        let mut base = Config::default();
        base.capture.fps = 50;
        base.capture.x = 10;

        let merged = cli.merged_config(base);
        assert_eq!(merged.capture.method, "x11-argb");
        assert_eq!((merged.capture.width, merged.capture.height), (64, 32));
        assert_eq!(merged.output.target, "mapper.local:19523");
        // Untouched flags keep the base values.
        assert_eq!(merged.capture.fps, 50);
        assert_eq!(merged.capture.x, 10);
    }
}
