use std::fmt;
use std::time::Duration;

use bytes::Bytes;

use crate::status::StatusCode;

/// Outcome of a command as seen by the caller.
///
/// Device-reported errors and local timeouts are values, not errors: callers
/// inspect [`Response::is_success`] explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// The device acknowledged the command; holds the reply payload.
    Success(Bytes),
    /// The command did not succeed.
    Failure(Failure),
}

/// Why a command did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// The device answered with a non-zero status code.
    Device(StatusCode),
    /// No reply arrived within the response window.
    Timeout(Duration),
    /// The device declared a reply length that cannot be carried in one message.
    UnsupportedLength,
    /// The connection went away while the caller was waiting.
    Disconnected,
}

impl Response {
    /// Successful response with no payload.
    pub fn empty() -> Self {
        Self::Success(Bytes::new())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Reply payload, if the command succeeded.
    pub fn data(&self) -> Option<&Bytes> {
        match self {
            Self::Success(data) => Some(data),
            Self::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<Failure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(*failure),
        }
    }

    /// Split into the reply payload or the failure.
    pub fn into_result(self) -> std::result::Result<Bytes, Failure> {
        match self {
            Self::Success(data) => Ok(data),
            Self::Failure(failure) => Err(failure),
        }
    }

    /// Human-readable description of a failed response.
    pub fn description(&self) -> Option<String> {
        self.failure().map(|failure| failure.to_string())
    }

    /// Whether a retry could plausibly change the outcome.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Failure(Failure::Timeout(_)) | Self::Failure(Failure::Device(_))
        )
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device(status) => write!(f, "{}", status.description()),
            Self::Timeout(after) => write!(f, "no response within {after:?}"),
            Self::UnsupportedLength => write!(f, "unsupported reply length"),
            Self::Disconnected => write!(f, "device disconnected"),
        }
    }
}

impl std::error::Error for Failure {}
