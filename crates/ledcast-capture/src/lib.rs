//! Screen capture backends and their lifecycle.
//!
//! A [`CaptureBackend`] grabs one rectangle of the screen per call and
//! writes it into a caller-owned [`FrameBuffer`]. Backends are looked up
//! by name through the [`CaptureRegistry`] and driven through a
//! [`CaptureSession`], which pairs `init` with exactly one `deinit`.
//!
//! Built-in backends:
//!
//! | name       | source                                 | pixel format      |
//! |------------|----------------------------------------|-------------------|
//! | `x11`      | root-window GetImage at native depth   | introspected      |
//! | `x11-argb` | GetImage, normalized per pixel         | fixed `ARGB u8`   |

pub mod registry;
pub mod session;

mod argb;
mod x11;

pub use argb::X11ArgbBackend;
pub use registry::{BackendFactory, CaptureRegistry, RegistryEntry};
pub use session::CaptureSession;
pub use x11::X11Backend;

use ledcast_core::{CaptureError, FrameBuffer, PixelFormat};

// ── Method ordinals ─────────────────────────────────────────────────────────

/// Ordinal handle for a registered capture backend.
///
/// Valid ordinals run from 1 to the number of registered backends; the
/// values at [`CaptureMethod::MIN`] and [`CaptureRegistry::max`] are
/// out-of-range sentinels on either side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CaptureMethod(pub i32);

impl CaptureMethod {
    /// Lower sentinel; never names a backend.
    pub const MIN: CaptureMethod = CaptureMethod(0);
}

impl std::fmt::Display for CaptureMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Backend contract ────────────────────────────────────────────────────────

/// A source of screen pixels.
///
/// `capture` fills the caller's frame completely or fails before touching
/// it; partial frames are never handed on. Implementations hold whatever
/// connection state they need between `init` and `deinit` and release
/// per-call resources before returning.
pub trait CaptureBackend {
    /// Acquires the resources the backend captures through.
    fn init(&mut self) -> Result<(), CaptureError>;

    /// Releases everything `init` acquired. Safe to call on a backend
    /// that never initialized; must not fail.
    fn deinit(&mut self);

    /// Grabs `frame.width() x frame.height()` pixels at `(x, y)` and
    /// writes exactly `frame.len()` bytes into the frame.
    fn capture(&mut self, frame: &mut FrameBuffer, x: i32, y: i32) -> Result<(), CaptureError>;

    /// Pixel format the backend delivers.
    fn format(&self) -> Result<PixelFormat, CaptureError>;

    /// Whether delivered pixels are big-endian. Queried once per captured
    /// frame, so sources that can change byte order mid-run stay honest.
    fn is_big_endian(&self) -> Result<bool, CaptureError>;

    /// Registered name, for diagnostics.
    fn name(&self) -> &'static str;
}
