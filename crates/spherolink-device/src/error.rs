/// Errors that can occur in device operations.
///
/// Device-reported failures and timeouts are not errors; they arrive as
/// [`spherolink_frame::Response::Failure`].
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// Transport-level error. The connection should be presumed dead.
    #[error("transport error: {0}")]
    Transport(#[from] spherolink_transport::TransportError),

    /// Frame-level error while encoding a command.
    #[error("frame error: {0}")]
    Frame(#[from] spherolink_frame::FrameError),

    /// Data-stream configuration error.
    #[error("stream error: {0}")]
    Stream(#[from] spherolink_stream::StreamError),

    /// A command argument is outside the range the device accepts.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Every sequence number is held by an outstanding request.
    #[error("all 255 sequence numbers are outstanding")]
    SequenceExhausted,

    /// A diagnostic dump is already being awaited.
    #[error("a diagnostic request is already pending")]
    DiagnosticPending,

    /// The receive loop has stopped; the device must be reconnected.
    #[error("device disconnected")]
    Disconnected,

    /// A successful reply carried a payload too short to parse.
    #[error("invalid {command} reply: expected {expected} bytes, got {actual}")]
    InvalidResponse {
        command: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A power level outside the documented range.
    #[error("unknown power level {0}")]
    UnknownPowerLevel(u8),

    /// The receive or handler threads could not be started.
    #[error("failed to spawn thread: {0}")]
    Spawn(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DeviceError>;
