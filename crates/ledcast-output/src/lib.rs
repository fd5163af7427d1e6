//! Frame dispatch.
//!
//! A [`FrameSink`] takes finished frames off the capture loop and moves
//! them toward the LED hardware. The shipped sink, [`UdpSink`], fragments
//! each frame into datagrams a pixel mapper reassembles on the far side.

pub mod udp;

pub use udp::{UdpSink, FRAME_PORT};

use ledcast_core::{DispatchError, FrameBuffer};

/// Destination for captured frames.
///
/// Returning `Err` terminates the capture loop; a sink must not retry
/// internally.
pub trait FrameSink {
    fn dispatch(&mut self, frame: &FrameBuffer) -> Result<(), DispatchError>;
}
