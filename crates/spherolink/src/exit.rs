use std::fmt;
use std::io;

use spherolink_device::{DeviceError, Reply};
use spherolink_frame::{Failure, FrameError};
use spherolink_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound | io::ErrorKind::ConnectionRefused => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Connect { source, .. } | TransportError::Io(source) => {
            let mapped = io_error(context, source);
            if mapped.code == INTERNAL {
                CliError::new(TRANSPORT_ERROR, mapped.message)
            } else {
                mapped
            }
        }
        TransportError::InvalidEndpoint(_) | TransportError::PathTooLong { .. } => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::PayloadTooLarge { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FrameError::ConnectionClosed => CliError::new(TRANSPORT_ERROR, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn device_error(context: &str, err: DeviceError) -> CliError {
    match err {
        DeviceError::Transport(err) => transport_error(context, err),
        DeviceError::Frame(err) => frame_error(context, err),
        DeviceError::Stream(err) => CliError::new(USAGE, format!("{context}: {err}")),
        DeviceError::InvalidArgument(_) => CliError::new(USAGE, format!("{context}: {err}")),
        DeviceError::InvalidResponse { .. } | DeviceError::UnknownPowerLevel(_) => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        DeviceError::Disconnected => CliError::new(TRANSPORT_ERROR, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn failure(context: &str, failure: Failure) -> CliError {
    let code = match failure {
        Failure::Device(_) => FAILURE,
        Failure::Timeout(_) => TIMEOUT,
        Failure::UnsupportedLength => DATA_INVALID,
        Failure::Disconnected => TRANSPORT_ERROR,
    };
    CliError::new(code, format!("{context}: {failure}"))
}

/// Flatten a command outcome into one CLI error space.
pub fn reply<T>(context: &str, result: Result<Reply<T>, DeviceError>) -> CliResult<T> {
    result
        .map_err(|err| device_error(context, err))?
        .map_err(|err| failure(context, err))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use spherolink_frame::StatusCode;

    use super::*;

    #[test]
    fn failures_map_to_exit_codes() {
        assert_eq!(
            failure("ping", Failure::Timeout(Duration::from_secs(1))).code,
            TIMEOUT
        );
        assert_eq!(
            failure("ping", Failure::Device(StatusCode::InvalidParameter)).code,
            FAILURE
        );
        assert_eq!(failure("ping", Failure::Disconnected).code, TRANSPORT_ERROR);
    }

    #[test]
    fn reply_flattens_both_layers() {
        let ok: Result<Reply<u8>, DeviceError> = Ok(Ok(7));
        assert_eq!(reply("x", ok).unwrap(), 7);

        let rejected: Result<Reply<u8>, DeviceError> =
            Err(DeviceError::InvalidArgument("heading".into()));
        assert_eq!(reply("x", rejected).unwrap_err().code, USAGE);

        let refused = DeviceError::Transport(TransportError::Connect {
            endpoint: "unix:/nowhere".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        });
        assert_eq!(device_error("connect", refused).code, TRANSPORT_ERROR);
    }
}
