//! Native-depth X11 capture.
//!
//! Pixels come straight out of a `GetImage` on the root window, in
//! whatever depth and byte order the X server uses. The pixel format is
//! introspected from the root visual and the byte order from the server
//! setup, so consumers see exactly what the server delivered.

use tracing::{debug, trace};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{
    ConnectionExt as _, GetImageReply, ImageFormat, ImageOrder, Screen, Visualid, Visualtype,
    Window,
};
use x11rb::rust_connection::RustConnection;

use ledcast_core::{CaptureError, FrameBuffer, PixelFormat};

use crate::CaptureBackend;

// ── Shared X11 plumbing ─────────────────────────────────────────────────────

/// Open display connection plus the root identifiers capture needs.
pub(crate) struct X11Session {
    pub(crate) conn:        RustConnection,
    pub(crate) screen:      usize,
    pub(crate) root:        Window,
    pub(crate) root_visual: Visualid,
}

pub(crate) fn open_display() -> Result<X11Session, CaptureError> {
    let (conn, screen_num) = x11rb::connect(None).map_err(|e| CaptureError::SessionInit {
        reason: format!("connecting to X display: {e}"),
    })?;

    let (root, root_visual, root_depth) = {
        let screen = &conn.setup().roots[screen_num];
        (screen.root, screen.root_visual, screen.root_depth)
    };
    debug!(
        "X11 session open: screen {screen_num} root 0x{root:x} \
         visual 0x{root_visual:x} depth {root_depth}"
    );

    Ok(X11Session { conn, screen: screen_num, root, root_visual })
}

/// Narrows a capture rectangle to the wire types `GetImage` takes.
pub(crate) fn request_geometry(
    frame: &FrameBuffer,
    x: i32,
    y: i32,
) -> Result<(i16, i16, u16, u16), CaptureError> {
    let out_of_range = |what: &str| CaptureError::CaptureFailed {
        reason: format!("{what} out of range for the X protocol"),
    };

    let x = i16::try_from(x).map_err(|_| out_of_range("x offset"))?;
    let y = i16::try_from(y).map_err(|_| out_of_range("y offset"))?;
    let width = u16::try_from(frame.width()).map_err(|_| out_of_range("frame width"))?;
    let height = u16::try_from(frame.height()).map_err(|_| out_of_range("frame height"))?;
    Ok((x, y, width, height))
}

pub(crate) fn fetch_image(
    sess: &X11Session,
    frame: &FrameBuffer,
    x: i32,
    y: i32,
) -> Result<GetImageReply, CaptureError> {
    let (x, y, width, height) = request_geometry(frame, x, y)?;
    trace!("capturing {width}x{height} at {x},{y}");

    sess.conn
        .get_image(ImageFormat::Z_PIXMAP, sess.root, x, y, width, height, u32::MAX)
        .map_err(|e| CaptureError::CaptureFailed { reason: format!("GetImage request: {e}") })?
        .reply()
        .map_err(|e| CaptureError::CaptureFailed { reason: format!("GetImage reply: {e}") })
}

pub(crate) fn find_visual(screen: &Screen, visual_id: Visualid) -> Option<&Visualtype> {
    screen
        .allowed_depths
        .iter()
        .flat_map(|depth| depth.visuals.iter())
        .find(|visual| visual.visual_id == visual_id)
}

/// Copies one frame's worth of reply bytes, leaving the frame untouched
/// when the reply is short.
pub(crate) fn copy_exact(frame: &mut FrameBuffer, data: &[u8]) -> Result<(), CaptureError> {
    let len = frame.len();
    if data.len() < len {
        return Err(CaptureError::CaptureFailed {
            reason: format!("short image reply: {} bytes for a {len} byte frame", data.len()),
        });
    }
    frame.data_mut().copy_from_slice(&data[..len]);
    Ok(())
}

// ── Native-depth backend ────────────────────────────────────────────────────

#[derive(Default)]
pub struct X11Backend {
    session: Option<X11Session>,
}

impl X11Backend {
    pub const NAME: &'static str = "x11";

    pub fn new() -> Self {
        Self::default()
    }

    fn session(&self) -> Result<&X11Session, CaptureError> {
        self.session.as_ref().ok_or_else(|| CaptureError::FormatQuery {
            reason: "no capture session established".into(),
        })
    }
}

impl CaptureBackend for X11Backend {
    fn init(&mut self) -> Result<(), CaptureError> {
        self.session = Some(open_display()?);
        Ok(())
    }

    fn deinit(&mut self) {
        if self.session.take().is_some() {
            debug!("X11 session closed");
        }
    }

    fn capture(&mut self, frame: &mut FrameBuffer, x: i32, y: i32) -> Result<(), CaptureError> {
        let sess = self.session.as_ref().ok_or_else(|| CaptureError::CaptureFailed {
            reason: "no capture session established".into(),
        })?;

        let reply = fetch_image(sess, frame, x, y)?;
        copy_exact(frame, &reply.data)
    }

    fn format(&self) -> Result<PixelFormat, CaptureError> {
        let sess = self.session()?;
        let screen = &sess.conn.setup().roots[sess.screen];
        let visual =
            find_visual(screen, sess.root_visual).ok_or_else(|| CaptureError::FormatQuery {
                reason: format!("no visual matched the default visual id 0x{:x}", sess.root_visual),
            })?;
        debug!(
            "root visual 0x{:x}: {} bits per channel, masks r=0x{:x} g=0x{:x} b=0x{:x}",
            visual.visual_id,
            visual.bits_per_rgb_value,
            visual.red_mask,
            visual.green_mask,
            visual.blue_mask
        );

        match visual.bits_per_rgb_value {
            8 => Ok(PixelFormat::ArgbU8),
            16 => Ok(PixelFormat::ArgbU16),
            32 => Ok(PixelFormat::ArgbU32),
            bits => Err(CaptureError::FormatQuery {
                reason: format!("unsupported bits per channel: {bits}"),
            }),
        }
    }

    fn is_big_endian(&self) -> Result<bool, CaptureError> {
        Ok(self.session()?.conn.setup().image_byte_order == ImageOrder::MSB_FIRST)
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }
}
