use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::error::{FrameError, Result};
use crate::response::{Failure, Response};
use crate::status::StatusCode;

/// Start-of-packet marker, first byte of every packet in both directions.
pub const SOP1: u8 = 0xFF;
/// Second envelope byte: the device must answer.
pub const ANSWER: u8 = 0xFF;
/// Second envelope byte: fire and forget.
pub const NO_ANSWER: u8 = 0xFE;
/// Second incoming byte: synchronous acknowledgment.
pub const ACKNOWLEDGMENT: u8 = 0xFF;
/// Second incoming byte: asynchronous message.
pub const ASYNC: u8 = 0xFE;

/// Envelope header: SOP1, SOP2, DID, CID, SEQ, DLEN.
pub const ENVELOPE_HEADER_SIZE: usize = 6;
/// Incoming header: SOP1, SOP2 and three kind-specific bytes.
pub const PACKET_HEADER_SIZE: usize = 5;

/// Largest payload a one-byte length field can describe (`0xFF` is reserved).
pub const MAX_PAYLOAD: usize = 0xFE - 1;
/// Largest payload of an async message (two-byte length).
pub const MAX_ASYNC_PAYLOAD: usize = u16::MAX as usize - 1;

/// Reply length sentinel the protocol does not support.
const UNSUPPORTED_LENGTH: u8 = 0xFF;

/// One's complement of the modulo-256 sum of `bytes`.
pub fn checksum(bytes: &[u8]) -> u8 {
    checksum_of(&[bytes])
}

fn checksum_of(parts: &[&[u8]]) -> u8 {
    let sum = parts
        .iter()
        .flat_map(|part| part.iter())
        .fold(0u8, |acc, byte| acc.wrapping_add(*byte));
    sum ^ 0xFF
}

/// One outgoing command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Virtual device the command is addressed to.
    pub device_id: u8,
    pub command_id: u8,
    /// `0` when no response is expected.
    pub sequence: u8,
    pub payload: Bytes,
    /// Whether the device should acknowledge.
    pub needs_response: bool,
}

impl Envelope {
    pub fn new(device_id: u8, command_id: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            device_id,
            command_id,
            sequence: 0,
            payload: payload.into(),
            needs_response: false,
        }
    }

    /// Request an acknowledgment correlated by `sequence`.
    pub fn expecting_response(mut self, sequence: u8) -> Self {
        self.sequence = sequence;
        self.needs_response = true;
        self
    }

    /// Total bytes on the wire.
    pub fn wire_size(&self) -> usize {
        ENVELOPE_HEADER_SIZE + self.payload.len() + 1
    }
}

/// Encode a command envelope.
///
/// Wire format:
/// ```text
/// ┌──────┬──────────┬─────┬─────┬─────┬──────┬───────────┬─────┐
/// │ 0xFF │ FF | FE  │ DID │ CID │ SEQ │ DLEN │ payload   │ CHK │
/// └──────┴──────────┴─────┴─────┴─────┴──────┴───────────┴─────┘
/// DLEN = payload + 1, CHK covers DID..payload
/// ```
pub fn encode_envelope(envelope: &Envelope, dst: &mut BytesMut) -> Result<()> {
    let payload = envelope.payload.as_ref();
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }

    let header = [
        envelope.device_id,
        envelope.command_id,
        envelope.sequence,
        (payload.len() + 1) as u8,
    ];
    dst.reserve(envelope.wire_size());
    dst.put_u8(SOP1);
    dst.put_u8(if envelope.needs_response {
        ANSWER
    } else {
        NO_ANSWER
    });
    dst.put_slice(&header);
    dst.put_slice(payload);
    dst.put_u8(checksum_of(&[&header, payload]));
    Ok(())
}

/// A synchronous reply to an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledgment {
    pub status: StatusCode,
    pub sequence: u8,
    pub payload: Bytes,
}

impl Acknowledgment {
    /// Status `0x00` yields the payload, anything else a device failure.
    pub fn into_response(self) -> Response {
        if self.status.is_ok() {
            Response::Success(self.payload)
        } else {
            Response::Failure(Failure::Device(self.status))
        }
    }
}

/// An unsolicited device message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncMessage {
    /// Event type code.
    pub event: u8,
    pub payload: Bytes,
}

/// A validated incoming packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    Acknowledgment(Acknowledgment),
    Async(AsyncMessage),
}

/// Decode the body of an acknowledgment once its header has been read.
///
/// `body` holds the `length` bytes following the header: payload then checksum.
pub fn decode_acknowledgment(
    status: u8,
    sequence: u8,
    length: u8,
    body: Bytes,
) -> Result<Acknowledgment> {
    if length == 0 || body.len() != length as usize {
        return Err(FrameError::InvalidLength(length as u16));
    }

    let payload_len = body.len() - 1;
    let received = body[payload_len];
    let expected = checksum_of(&[&[status, sequence, length], &body[..payload_len]]);
    if received != expected {
        return Err(FrameError::ChecksumMismatch { received, expected });
    }

    Ok(Acknowledgment {
        status: StatusCode::from_u8(status),
        sequence,
        payload: body.slice(..payload_len),
    })
}

/// Decode the body of an async message once its header has been read.
pub fn decode_async(event: u8, length: u16, body: Bytes) -> Result<AsyncMessage> {
    if length == 0 || body.len() != length as usize {
        return Err(FrameError::InvalidLength(length));
    }

    let payload_len = body.len() - 1;
    let received = body[payload_len];
    let [msb, lsb] = length.to_be_bytes();
    let expected = checksum_of(&[&[event, msb, lsb], &body[..payload_len]]);
    if received != expected {
        return Err(FrameError::ChecksumMismatch { received, expected });
    }

    Ok(AsyncMessage {
        event,
        payload: body.slice(..payload_len),
    })
}

/// Decode the next packet from a receive buffer.
///
/// Returns `Ok(None)` when more bytes are needed. Bytes preceding a start
/// marker are discarded. Errors are returned only after the offending bytes
/// have been consumed, so calling again resumes at the next packet.
pub fn decode_packet(src: &mut BytesMut) -> Result<Option<Packet>> {
    match src.iter().position(|byte| *byte == SOP1) {
        Some(0) => {}
        Some(skip) => {
            debug!(skip, "discarding bytes before start marker");
            src.advance(skip);
        }
        None => {
            if !src.is_empty() {
                debug!(skip = src.len(), "discarding bytes without start marker");
                src.clear();
            }
            return Ok(None);
        }
    }

    if src.len() < 2 {
        return Ok(None);
    }

    match src[1] {
        ACKNOWLEDGMENT => decode_acknowledgment_packet(src),
        ASYNC => decode_async_packet(src),
        kind => {
            src.advance(1);
            Err(FrameError::UnknownPacketKind(kind))
        }
    }
}

fn decode_acknowledgment_packet(src: &mut BytesMut) -> Result<Option<Packet>> {
    if src.len() < PACKET_HEADER_SIZE {
        return Ok(None);
    }

    let (status, sequence, length) = (src[2], src[3], src[4]);
    if length == UNSUPPORTED_LENGTH {
        src.advance(PACKET_HEADER_SIZE);
        return Err(FrameError::UnsupportedLength { sequence });
    }
    if length == 0 {
        src.advance(PACKET_HEADER_SIZE);
        return Err(FrameError::InvalidLength(0));
    }

    let total = PACKET_HEADER_SIZE + length as usize;
    if src.len() < total {
        src.reserve(total - src.len());
        return Ok(None);
    }

    src.advance(PACKET_HEADER_SIZE);
    let body = src.split_to(length as usize).freeze();
    decode_acknowledgment(status, sequence, length, body)
        .map(|ack| Some(Packet::Acknowledgment(ack)))
}

fn decode_async_packet(src: &mut BytesMut) -> Result<Option<Packet>> {
    if src.len() < PACKET_HEADER_SIZE {
        return Ok(None);
    }

    let event = src[2];
    let length = u16::from_be_bytes([src[3], src[4]]);
    if length == 0 {
        src.advance(PACKET_HEADER_SIZE);
        return Err(FrameError::InvalidLength(0));
    }

    let total = PACKET_HEADER_SIZE + length as usize;
    if src.len() < total {
        src.reserve(total - src.len());
        return Ok(None);
    }

    src.advance(PACKET_HEADER_SIZE);
    let body = src.split_to(length as usize).freeze();
    decode_async(event, length, body).map(|msg| Some(Packet::Async(msg)))
}

/// Encode an acknowledgment as the device would send it.
pub fn encode_acknowledgment(
    status: u8,
    sequence: u8,
    payload: &[u8],
    dst: &mut BytesMut,
) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }

    let header = [status, sequence, (payload.len() + 1) as u8];
    dst.reserve(PACKET_HEADER_SIZE + payload.len() + 1);
    dst.put_u8(SOP1);
    dst.put_u8(ACKNOWLEDGMENT);
    dst.put_slice(&header);
    dst.put_slice(payload);
    dst.put_u8(checksum_of(&[&header, payload]));
    Ok(())
}

/// Encode an async message as the device would send it.
pub fn encode_async(event: u8, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_ASYNC_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_ASYNC_PAYLOAD,
        });
    }

    let [msb, lsb] = ((payload.len() + 1) as u16).to_be_bytes();
    let header = [event, msb, lsb];
    dst.reserve(PACKET_HEADER_SIZE + payload.len() + 1);
    dst.put_u8(SOP1);
    dst.put_u8(ASYNC);
    dst.put_slice(&header);
    dst.put_slice(payload);
    dst.put_u8(checksum_of(&[&header, payload]));
    Ok(())
}

/// Decode the next command envelope, as a device would.
///
/// Same resynchronization contract as [`decode_packet`].
pub fn decode_envelope(src: &mut BytesMut) -> Result<Option<Envelope>> {
    match src.iter().position(|byte| *byte == SOP1) {
        Some(0) => {}
        Some(skip) => src.advance(skip),
        None => {
            src.clear();
            return Ok(None);
        }
    }

    if src.len() < ENVELOPE_HEADER_SIZE {
        return Ok(None);
    }

    let needs_response = match src[1] {
        ANSWER => true,
        NO_ANSWER => false,
        kind => {
            src.advance(1);
            return Err(FrameError::UnknownPacketKind(kind));
        }
    };

    let header = [src[2], src[3], src[4], src[5]];
    let length = header[3] as usize;
    if length == 0 {
        src.advance(ENVELOPE_HEADER_SIZE);
        return Err(FrameError::InvalidLength(0));
    }

    let total = ENVELOPE_HEADER_SIZE + length;
    if src.len() < total {
        src.reserve(total - src.len());
        return Ok(None);
    }

    src.advance(ENVELOPE_HEADER_SIZE);
    let body = src.split_to(length).freeze();
    let payload_len = length - 1;
    let received = body[payload_len];
    let expected = checksum_of(&[&header, &body[..payload_len]]);
    if received != expected {
        return Err(FrameError::ChecksumMismatch { received, expected });
    }

    Ok(Some(Envelope {
        device_id: header[0],
        command_id: header[1],
        sequence: header[2],
        payload: body.slice(..payload_len),
        needs_response,
    }))
}
