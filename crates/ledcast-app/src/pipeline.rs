//! The paced capture loop.
//!
//! One iteration moves a frame end to end:
//!
//! ```text
//!   poll cancel -> capture -> refresh byte order -> dispatch -> pace
//! ```
//!
//! Pacing sleeps away whatever remains of the frame interval and then
//! restamps the baseline, so an iteration that overruns is absorbed
//! instead of being repaid through shorter sleeps later.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, info};

use ledcast_capture::CaptureSession;
use ledcast_core::FrameBuffer;
use ledcast_output::FrameSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running,
    /// Terminal; reached on cancellation or on the first failure.
    Stopped,
}

/// Drives one capture session into one sink at a fixed cadence.
pub struct Pipeline<'a> {
    session:  &'a mut CaptureSession,
    frame:    &'a mut FrameBuffer,
    sink:     &'a mut dyn FrameSink,
    origin:   (i32, i32),
    interval: Duration,
    state:    PipelineState,
    frames_delivered: u64,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        session: &'a mut CaptureSession,
        frame: &'a mut FrameBuffer,
        sink: &'a mut dyn FrameSink,
        origin: (i32, i32),
        interval: Duration,
    ) -> Self {
        Self {
            session,
            frame,
            sink,
            origin,
            interval,
            state: PipelineState::Idle,
            frames_delivered: 0,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn frames_delivered(&self) -> u64 {
        self.frames_delivered
    }

    /// Runs until `cancel` is raised or an iteration fails. Cancellation
    /// is orderly and returns `Ok`; the first failure returns `Err`
    /// without attempting another iteration.
    pub fn run(&mut self, cancel: &AtomicBool) -> Result<()> {
        self.state = PipelineState::Running;
        debug!("Pipeline running (interval {:?})", self.interval);

        let mut last_delivery = Instant::now();
        let result = loop {
            // ── 1. poll cancellation ──
            if cancel.load(Ordering::Relaxed) {
                info!("Cancellation requested, stopping capture");
                break Ok(());
            }

            // ── 2. capture ──
            let (x, y) = self.origin;
            if let Err(e) = self.session.backend_mut().capture(self.frame, x, y) {
                break Err(e).with_context(|| {
                    format!("Capture with method \"{}\" failed", self.session.name())
                });
            }

            // ── 3. refresh byte order ──
            match self.session.backend().is_big_endian() {
                Ok(big_endian) => self.frame.set_big_endian(big_endian),
                Err(e) => {
                    break Err(e).with_context(|| {
                        format!("Byte-order query on \"{}\" failed", self.session.name())
                    });
                }
            }

            // ── 4. dispatch ──
            if let Err(e) = self.sink.dispatch(self.frame) {
                break Err(e).context("Frame dispatch failed");
            }
            self.frames_delivered += 1;

            // ── 5. pace ──
            let elapsed = last_delivery.elapsed();
            if elapsed < self.interval {
                thread::sleep(self.interval - elapsed);
            }

            // ── 6. restamp the baseline ──
            last_delivery = Instant::now();
        };

        self.state = PipelineState::Stopped;
        result
    }
}
