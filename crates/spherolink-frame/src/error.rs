/// Errors that can occur during packet encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The trailing checksum does not match the packet contents.
    #[error("checksum mismatch (received {received:#04x}, expected {expected:#04x})")]
    ChecksumMismatch { received: u8, expected: u8 },

    /// The byte after the start marker is neither acknowledgment nor async.
    #[error("malformed packet: unknown packet kind {0:#04x}")]
    UnknownPacketKind(u8),

    /// A declared length is impossible for the packet kind.
    #[error("malformed packet: invalid length {0}")]
    InvalidLength(u16),

    /// The device declared a reply length the protocol cannot carry in one message.
    #[error("unsupported reply length for sequence {sequence}")]
    UnsupportedLength { sequence: u8 },

    /// An outgoing payload does not fit into a single envelope.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing packets.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed.
    #[error("connection closed")]
    ConnectionClosed,
}

impl FrameError {
    /// Whether the stream is still usable after this error.
    ///
    /// Recoverable errors are reported only after the offending bytes have been
    /// consumed, so reading can simply continue with the next packet.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ChecksumMismatch { .. }
                | Self::UnknownPacketKind(_)
                | Self::InvalidLength(_)
                | Self::UnsupportedLength { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
