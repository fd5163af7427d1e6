//! Normalized X11 capture: any native depth in, fixed 32-bit ARGB out.
//!
//! The server is asked for the same `GetImage` as the native backend,
//! then every pixel is widened channel by channel into `[A, R, G, B]`
//! bytes with a fully opaque alpha. Because the output layout never
//! depends on the server, `format` and `is_big_endian` are constants.

use tracing::debug;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{ImageOrder, Visualid};

use ledcast_core::{CaptureError, FrameBuffer, PixelFormat};

use crate::x11::{fetch_image, find_visual, open_display, X11Session};
use crate::CaptureBackend;

// ── Source pixel layout ─────────────────────────────────────────────────────

/// Shape of the server's reply pixels, resolved per capture so the
/// normalization tracks whatever depth the reply actually carries.
pub(crate) struct SourceLayout {
    bits_per_pixel: u8,
    stride:         usize,
    byte_order:     ImageOrder,
    red_mask:       u32,
    green_mask:     u32,
    blue_mask:      u32,
}

fn source_layout(
    sess: &X11Session,
    depth: u8,
    visual_id: Visualid,
    width: u32,
) -> Result<SourceLayout, CaptureError> {
    let setup = sess.conn.setup();
    let format = setup
        .pixmap_formats
        .iter()
        .find(|f| f.depth == depth)
        .ok_or_else(|| CaptureError::CaptureFailed {
            reason: format!("server advertises no pixmap format for depth {depth}"),
        })?;
    let screen = &setup.roots[sess.screen];
    let visual = find_visual(screen, visual_id).ok_or_else(|| CaptureError::CaptureFailed {
        reason: format!("no visual matched id 0x{visual_id:x}"),
    })?;

    // Rows are padded to the server's scanline unit, never less than a byte.
    let pad_bits = (format.scanline_pad as usize).max(8);
    let row_bits = width as usize * format.bits_per_pixel as usize;
    let stride = ((row_bits + pad_bits - 1) / pad_bits) * (pad_bits / 8);

    Ok(SourceLayout {
        bits_per_pixel: format.bits_per_pixel,
        stride,
        byte_order: setup.image_byte_order,
        red_mask: visual.red_mask,
        green_mask: visual.green_mask,
        blue_mask: visual.blue_mask,
    })
}

// ── Pixel normalization ─────────────────────────────────────────────────────

fn read_pixel(bytes: &[u8], byte_order: ImageOrder) -> u32 {
    if byte_order == ImageOrder::MSB_FIRST {
        bytes.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
    } else {
        bytes.iter().rev().fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
    }
}

/// Extracts one channel and widens it to 8 bits, saturating narrow
/// channels so that a full 5-bit value still maps to 255.
fn scale_channel(pixel: u32, mask: u32) -> u8 {
    if mask == 0 {
        return 0;
    }
    let shift = mask.trailing_zeros();
    let width = mask.count_ones();
    let value = (pixel & mask) >> shift;

    match width {
        8 => value as u8,
        w if w > 8 => (value >> (w - 8)) as u8,
        w => {
            let max = (1u32 << w) - 1;
            ((value * 255 + max / 2) / max) as u8
        }
    }
}

pub(crate) fn normalize_to_argb(
    frame: &mut FrameBuffer,
    data: &[u8],
    layout: &SourceLayout,
) -> Result<(), CaptureError> {
    if frame.format() != PixelFormat::ArgbU8 {
        return Err(CaptureError::CaptureFailed {
            reason: format!(
                "frame format {} does not match the normalized output",
                frame.format()
            ),
        });
    }

    let src_px = match layout.bits_per_pixel {
        16 => 2,
        24 => 3,
        32 => 4,
        bits => {
            return Err(CaptureError::CaptureFailed {
                reason: format!("unsupported source depth: {bits} bits per pixel"),
            })
        }
    };

    let width = frame.width() as usize;
    let height = frame.height() as usize;
    let needed = layout.stride * height;
    if data.len() < needed {
        return Err(CaptureError::CaptureFailed {
            reason: format!(
                "short image reply: {} bytes for a {needed} byte source",
                data.len()
            ),
        });
    }

    let out = frame.data_mut();
    for row in 0..height {
        let row_base = row * layout.stride;
        for col in 0..width {
            let src = row_base + col * src_px;
            let pixel = read_pixel(&data[src..src + src_px], layout.byte_order);

            let dst = (row * width + col) * 4;
            out[dst] = 0xFF;
            out[dst + 1] = scale_channel(pixel, layout.red_mask);
            out[dst + 2] = scale_channel(pixel, layout.green_mask);
            out[dst + 3] = scale_channel(pixel, layout.blue_mask);
        }
    }
    Ok(())
}

// ── Normalizing backend ─────────────────────────────────────────────────────

#[derive(Default)]
pub struct X11ArgbBackend {
    session: Option<X11Session>,
}

impl X11ArgbBackend {
    pub const NAME: &'static str = "x11-argb";

    pub fn new() -> Self {
        Self::default()
    }
}

impl CaptureBackend for X11ArgbBackend {
    fn init(&mut self) -> Result<(), CaptureError> {
        self.session = Some(open_display()?);
        Ok(())
    }

    fn deinit(&mut self) {
        if self.session.take().is_some() {
            debug!("X11 (argb) session closed");
        }
    }

    fn capture(&mut self, frame: &mut FrameBuffer, x: i32, y: i32) -> Result<(), CaptureError> {
        let sess = self.session.as_ref().ok_or_else(|| CaptureError::CaptureFailed {
            reason: "no capture session established".into(),
        })?;

        let reply = fetch_image(sess, frame, x, y)?;
        let layout = source_layout(sess, reply.depth, reply.visual, frame.width())?;
        normalize_to_argb(frame, &reply.data, &layout)
    }

    // The normalized layout never varies, so both queries are constants
    // and callable before `init`.
    fn format(&self) -> Result<PixelFormat, CaptureError> {
        Ok(PixelFormat::ArgbU8)
    }

    fn is_big_endian(&self) -> Result<bool, CaptureError> {
        Ok(true)
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }
}
