//! UDP frame transport.
//!
//! Each frame travels as a burst of datagrams sharing one sequence
//! number, every datagram prefixed with a 20-byte header:
//!
//! | offset | size | field                            |
//! |--------|------|----------------------------------|
//! | 0      | 4    | magic `"LCST"`                   |
//! | 4      | 4    | frame sequence number            |
//! | 8      | 2    | fragment index                   |
//! | 10     | 2    | fragment count                   |
//! | 12     | 2    | frame width in pixels            |
//! | 14     | 2    | frame height in pixels           |
//! | 16     | 1    | pixel format code                |
//! | 17     | 1    | flags, bit 0 = big-endian pixels |
//! | 18     | 2    | reserved                         |
//!
//! All multi-byte fields are big-endian. A payload carries at most
//! 1384 bytes so every datagram fits a 1500-byte MTU with room for
//! IP and UDP headers.

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use tracing::{debug, trace};

use ledcast_core::{DispatchError, FrameBuffer};

use crate::FrameSink;

/// Default pixel-mapper port, used when a target omits one.
pub const FRAME_PORT: u16 = 19523;

const MAX_PAYLOAD_BYTES: usize = 1384;
const HEADER_SIZE: usize = 20;
const MAGIC: u32 = 0x4C43_5354; // "LCST"

// ── Wire header ─────────────────────────────────────────────────────────────

/// Per-fragment header; everything but the fragment index is shared by
/// all fragments of one frame.
#[derive(Debug)]
struct FrameHeader {
    frame_seq:  u32,
    frag_count: u16,
    width:      u16,
    height:     u16,
    format:     u8,
    flags:      u8,
}

impl FrameHeader {
    fn for_frame(frame: &FrameBuffer, frame_seq: u32) -> Result<Self, DispatchError> {
        let narrow = |what: &str, value: u32| {
            u16::try_from(value).map_err(|_| DispatchError::FrameTooLarge {
                reason: format!("{what} {value} does not fit the wire header"),
            })
        };
        let width = narrow("width", frame.width())?;
        let height = narrow("height", frame.height())?;

        let fragments = ((frame.len() + MAX_PAYLOAD_BYTES - 1) / MAX_PAYLOAD_BYTES).max(1);
        let frag_count = u16::try_from(fragments).map_err(|_| DispatchError::FrameTooLarge {
            reason: format!("{fragments} fragments do not fit the wire header"),
        })?;

        Ok(Self {
            frame_seq,
            frag_count,
            width,
            height,
            format: frame.format().code(),
            flags: u8::from(frame.is_big_endian()),
        })
    }

    fn encode(&self, frag_index: u16, out: &mut Vec<u8>) {
        out.extend_from_slice(&MAGIC.to_be_bytes());
        out.extend_from_slice(&self.frame_seq.to_be_bytes());
        out.extend_from_slice(&frag_index.to_be_bytes());
        out.extend_from_slice(&self.frag_count.to_be_bytes());
        out.extend_from_slice(&self.width.to_be_bytes());
        out.extend_from_slice(&self.height.to_be_bytes());
        out.push(self.format);
        out.push(self.flags);
        out.extend_from_slice(&[0, 0]);
    }
}

// ── Sink ────────────────────────────────────────────────────────────────────

/// Connected UDP socket that fragments frames toward one pixel mapper.
pub struct UdpSink {
    socket:      UdpSocket,
    remote_addr: SocketAddr,
    frame_seq:   u32,
}

impl UdpSink {
    /// Resolves `target` (`host:port`, or a bare host that gets
    /// [`FRAME_PORT`]) and connects an ephemeral local socket to it.
    pub fn connect(target: &str) -> Result<Self, DispatchError> {
        let remote_addr = resolve_target(target)?;
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect(remote_addr)?;
        debug!("UDP sink bound {} -> {remote_addr}", socket.local_addr()?);

        Ok(Self { socket, remote_addr, frame_seq: 0 })
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }
}

fn resolve_target(target: &str) -> Result<SocketAddr, DispatchError> {
    let mut addrs = if target.contains(':') {
        target.to_socket_addrs()?
    } else {
        (target, FRAME_PORT).to_socket_addrs()?
    };

    addrs.next().ok_or_else(|| DispatchError::InvalidTarget {
        reason: format!("target \"{target}\" did not resolve"),
    })
}

impl FrameSink for UdpSink {
    fn dispatch(&mut self, frame: &FrameBuffer) -> Result<(), DispatchError> {
        if frame.is_empty() {
            return Ok(());
        }

        let header = FrameHeader::for_frame(frame, self.frame_seq)?;
        let mut sent_bytes = 0usize;

        for (i, payload) in frame.data().chunks(MAX_PAYLOAD_BYTES).enumerate() {
            let mut packet = Vec::with_capacity(HEADER_SIZE + payload.len());
            header.encode(i as u16, &mut packet);
            packet.extend_from_slice(payload);
            sent_bytes += self.socket.send(&packet)?;
        }

        trace!(
            "sent frame seq={} frags={} bytes={sent_bytes} to {}",
            self.frame_seq,
            header.frag_count,
            self.remote_addr
        );
        self.frame_seq = self.frame_seq.wrapping_add(1);
        Ok(())
    }
}
