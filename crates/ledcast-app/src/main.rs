//! ledcast binary: mirror an X11 screen region onto LED hardware.
//!
//! ```text
//!   config file + CLI flags
//!            │
//!            ▼
//!   registry lookup ──> capture session (x11 / x11-argb)
//!                              │
//!                              ▼
//!                       paced pipeline ──> UDP sink ──> pixel mapper
//! ```
//!
//! Cancellation (SIGINT, SIGTERM, SIGQUIT, SIGHUP) stops the pipeline
//! after the iteration in flight and exits orderly; any pipeline error
//! tears the session down first and exits nonzero.

mod cli;
mod pipeline;

use std::fs;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use signal_hook::consts::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use ledcast_capture::{CaptureRegistry, CaptureSession};
use ledcast_core::{CaptureError, Config, FrameBuffer};
use ledcast_output::UdpSink;

use cli::Cli;
use pipeline::Pipeline;

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_target(true)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Fatal error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    info!("ledcast v{}", env!("CARGO_PKG_VERSION"));

    let registry = CaptureRegistry::builtin();
    if cli.list_methods {
        println!("Supported capture methods:");
        for name in registry.names() {
            println!("\t{name}");
        }
        return Ok(());
    }

    let base = match &cli.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("Reading config file {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Parsing config file {}", path.display()))?
        }
        None => Config::default(),
    };
    let mut config = cli.merged_config(base);
    sanitize(&mut config);
    validate(&config)?;

    let method = registry
        .method_from_name(&config.capture.method)
        .ok_or_else(|| CaptureError::InvalidMethod { method: config.capture.method.clone() })?;

    let mut session = CaptureSession::open(&registry, method)?;
    debug!("Selected capture method {} (\"{}\")", session.method(), session.name());

    // The session outlives any pipeline failure so teardown runs exactly once.
    let outcome = stream(&mut session, &config);
    session.close();
    outcome
}

/// Clamps negative capture offsets to the screen edge.
fn sanitize(config: &mut Config) {
    if config.capture.x < 0 {
        warn!("Capture x {} clamped to 0", config.capture.x);
        config.capture.x = 0;
    }
    if config.capture.y < 0 {
        warn!("Capture y {} clamped to 0", config.capture.y);
        config.capture.y = 0;
    }
}

fn validate(config: &Config) -> Result<()> {
    ensure!(
        config.capture.width > 0 && config.capture.height > 0,
        "Capture dimensions must be positive (have {}x{}; set --dimensions)",
        config.capture.width,
        config.capture.height,
    );
    ensure!(
        config.capture.fps > 0,
        "Capture rate must be positive (have {} fps)",
        config.capture.fps,
    );
    ensure!(
        !config.output.target.is_empty(),
        "No dispatch target configured (set --target HOST:PORT)",
    );
    Ok(())
}

fn stream(session: &mut CaptureSession, config: &Config) -> Result<()> {
    let capture = &config.capture;

    let format = session
        .backend()
        .format()
        .with_context(|| format!("Pixel format query on \"{}\" failed", session.name()))?;
    let big_endian = session
        .backend()
        .is_big_endian()
        .with_context(|| format!("Byte-order query on \"{}\" failed", session.name()))?;

    let mut frame = FrameBuffer::new(capture.width, capture.height, format);
    frame.set_big_endian(big_endian);
    info!(
        "Allocated frame: {}x{} ({}, {} bytes{})",
        frame.width(),
        frame.height(),
        frame.format(),
        frame.len(),
        if frame.is_big_endian() { ", big-endian" } else { "" },
    );

    let mut sink = UdpSink::connect(&config.output.target)
        .with_context(|| format!("Connecting to dispatch target \"{}\"", config.output.target))?;
    info!("Dispatching frames to {}", sink.remote_addr());

    let cancel = Arc::new(AtomicBool::new(false));
    for signal in [SIGINT, SIGTERM, SIGQUIT, SIGHUP] {
        signal_hook::flag::register(signal, Arc::clone(&cancel))
            .with_context(|| format!("Installing handler for signal {signal}"))?;
    }

    info!(
        "Capturing {}x{} pixels at position {}/{} ({} fps target)",
        capture.width, capture.height, capture.x, capture.y, capture.fps,
    );

    let mut pipeline = Pipeline::new(
        session,
        &mut frame,
        &mut sink,
        (capture.x, capture.y),
        capture.frame_interval(),
    );
    let started = Instant::now();
    let outcome = pipeline.run(&cancel);

    let elapsed = started.elapsed().as_secs_f64();
    info!(
        "Pipeline {:?}: {} frames in {:.1}s ({:.1} fps)",
        pipeline.state(),
        pipeline.frames_delivered(),
        elapsed,
        pipeline.frames_delivered() as f64 / elapsed.max(f64::EPSILON),
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_clamps_negative_offsets() {
        let mut config = Config::default();
        config.capture.x = -15;
        config.capture.y = 4;

        sanitize(&mut config);
        assert_eq!((config.capture.x, config.capture.y), (0, 4));
    }

    #[test]
    fn validate_requires_dimensions_rate_and_target() {
        let mut config = Config::default();
        config.capture.width = 64;
        config.capture.height = 32;
        config.output.target = "mapper.local:19523".into();
        assert!(validate(&config).is_ok());

        let mut no_dims = config.clone();
        no_dims.capture.width = 0;
        assert!(validate(&no_dims).is_err());

        let mut no_target = config.clone();
        no_target.output.target.clear();
        assert!(validate(&no_target).is_err());

        let mut no_rate = config;
        no_rate.capture.fps = 0;
        assert!(validate(&no_rate).is_err());
    }

    #[test]
    fn default_method_is_registered() {
        let registry = CaptureRegistry::builtin();
        let method = registry
            .method_from_name(&Config::default().capture.method)
            .expect("default method resolves");
        assert!(registry.validate(method));
    }
}
