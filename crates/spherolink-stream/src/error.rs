/// Errors raised while configuring or decoding a data stream.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// A stream payload does not match the configured frame layout.
    #[error("stream payload length mismatch (expected {expected} bytes, got {actual})")]
    LengthMismatch { expected: usize, actual: usize },

    /// The requested sample rate cannot be expressed as a divisor of 400 Hz.
    #[error("invalid sample rate {0} Hz (must be 1..=400)")]
    InvalidSampleRate(u16),

    /// At least one frame per packet is required.
    #[error("frame count must be at least 1")]
    ZeroFrames,

    /// A group name that is not part of the catalog.
    #[error("unknown sensor group: {0}")]
    UnknownGroup(String),
}

pub type Result<T> = std::result::Result<T, StreamError>;
