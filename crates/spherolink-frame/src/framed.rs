//! Tokio codec adapter for the packet format.
//!
//! ```rust,ignore
//! use tokio_util::codec::Framed;
//! use spherolink_frame::PacketCodec;
//!
//! let mut framed = Framed::new(stream, PacketCodec::new());
//! ```

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::codec::{decode_packet, encode_envelope, Envelope, Packet};
use crate::error::FrameError;

/// Decodes incoming packets and encodes outgoing envelopes.
///
/// Recoverable decode errors are logged and skipped. An unsupported-length
/// reply is the exception: it is surfaced so the caller can fail the waiter.
#[derive(Debug, Default, Clone, Copy)]
pub struct PacketCodec;

impl PacketCodec {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for PacketCodec {
    type Item = Packet;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>, FrameError> {
        loop {
            match decode_packet(src) {
                Ok(packet) => return Ok(packet),
                Err(err @ FrameError::UnsupportedLength { .. }) => return Err(err),
                Err(err) if err.is_recoverable() => {
                    warn!(error = %err, "dropping malformed packet");
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Packet>, FrameError> {
        match self.decode(src)? {
            Some(packet) => Ok(Some(packet)),
            None if src.is_empty() => Ok(None),
            None => Err(FrameError::ConnectionClosed),
        }
    }
}

impl Encoder<Envelope> for PacketCodec {
    type Error = FrameError;

    fn encode(&mut self, envelope: Envelope, dst: &mut BytesMut) -> Result<(), FrameError> {
        encode_envelope(&envelope, dst)
    }
}

impl Encoder<&Envelope> for PacketCodec {
    type Error = FrameError;

    fn encode(&mut self, envelope: &Envelope, dst: &mut BytesMut) -> Result<(), FrameError> {
        encode_envelope(envelope, dst)
    }
}
