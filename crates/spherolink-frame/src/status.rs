//! Message response codes carried in acknowledgment packets.

use std::fmt;

/// Response status reported by the device for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Ok,
    Error,
    ChecksumError,
    FragmentedCommand,
    UnknownCommand,
    CommandUnsupported,
    BadMessageFormat,
    InvalidParameter,
    ExecutionFailed,
    UnknownDevice,
    RamBusy,
    IncorrectPassword,
    VoltageTooLow,
    IllegalPage,
    FlashFail,
    MainAppCorrupt,
    MessageTimeout,
    /// A code this library does not know.
    Unknown(u8),
}

impl StatusCode {
    pub fn from_u8(code: u8) -> Self {
        match code {
            0x00 => Self::Ok,
            0x01 => Self::Error,
            0x02 => Self::ChecksumError,
            0x03 => Self::FragmentedCommand,
            0x04 => Self::UnknownCommand,
            0x05 => Self::CommandUnsupported,
            0x06 => Self::BadMessageFormat,
            0x07 => Self::InvalidParameter,
            0x08 => Self::ExecutionFailed,
            0x09 => Self::UnknownDevice,
            0x0A => Self::RamBusy,
            0x0B => Self::IncorrectPassword,
            0x31 => Self::VoltageTooLow,
            0x32 => Self::IllegalPage,
            0x33 => Self::FlashFail,
            0x34 => Self::MainAppCorrupt,
            0x35 => Self::MessageTimeout,
            other => Self::Unknown(other),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Self::Ok => 0x00,
            Self::Error => 0x01,
            Self::ChecksumError => 0x02,
            Self::FragmentedCommand => 0x03,
            Self::UnknownCommand => 0x04,
            Self::CommandUnsupported => 0x05,
            Self::BadMessageFormat => 0x06,
            Self::InvalidParameter => 0x07,
            Self::ExecutionFailed => 0x08,
            Self::UnknownDevice => 0x09,
            Self::RamBusy => 0x0A,
            Self::IncorrectPassword => 0x0B,
            Self::VoltageTooLow => 0x31,
            Self::IllegalPage => 0x32,
            Self::FlashFail => 0x33,
            Self::MainAppCorrupt => 0x34,
            Self::MessageTimeout => 0x35,
            Self::Unknown(code) => code,
        }
    }

    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }

    /// Human-readable description of the status.
    pub fn description(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Error => "error",
            Self::ChecksumError => "checksum error",
            Self::FragmentedCommand => "fragmented command",
            Self::UnknownCommand => "unknown command",
            Self::CommandUnsupported => "command unsupported",
            Self::BadMessageFormat => "bad message format",
            Self::InvalidParameter => "invalid parameter values",
            Self::ExecutionFailed => "failed to execute command",
            Self::UnknownDevice => "unknown device id",
            Self::RamBusy => "RAM access needed but busy",
            Self::IncorrectPassword => "incorrect password",
            Self::VoltageTooLow => "voltage too low for reflash",
            Self::IllegalPage => "illegal page number",
            Self::FlashFail => "flash fail: page did not reprogram correctly",
            Self::MainAppCorrupt => "main application corrupted",
            Self::MessageTimeout => "message state machine timed out",
            Self::Unknown(_) => "unknown error",
        }
    }
}

impl From<u8> for StatusCode {
    fn from(code: u8) -> Self {
        Self::from_u8(code)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:#04x})", self.description(), self.as_u8())
    }
}
