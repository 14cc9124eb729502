//! Packet framing for the Sphero serial protocol.
//!
//! Outgoing commands are wrapped in an envelope:
//! - Two start bytes, the second saying whether a reply is wanted
//! - Device id, command id, sequence number and a one-byte length
//! - The payload and a one's-complement checksum
//!
//! Incoming traffic is either a synchronous acknowledgment (one-byte length,
//! correlated by sequence) or an asynchronous message (two-byte length,
//! identified by an event code). Corrupt packets are discarded without losing
//! the stream position.

pub mod codec;
pub mod error;
#[cfg(feature = "async")]
pub mod framed;
pub mod reader;
pub mod response;
pub mod status;
pub mod writer;

pub use codec::{
    checksum, decode_envelope, decode_packet, encode_acknowledgment, encode_async,
    encode_envelope, Acknowledgment, AsyncMessage, Envelope, Packet, MAX_ASYNC_PAYLOAD,
    MAX_PAYLOAD,
};
pub use error::{FrameError, Result};
#[cfg(feature = "async")]
pub use framed::PacketCodec;
pub use reader::PacketReader;
pub use response::{Failure, Response};
pub use status::StatusCode;
pub use writer::EnvelopeWriter;
