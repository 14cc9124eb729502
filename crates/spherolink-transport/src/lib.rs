//! Byte-stream transport boundary for spherolink.
//!
//! The protocol engine only needs a reliable, ordered byte stream. This crate
//! defines that boundary as the [`Transport`] trait and provides
//! [`SocketTransport`], which reaches the robot through a TCP or Unix-domain
//! socket bridge in front of the radio link.
//!
//! [`TransportReader`] and [`TransportWriter`] adapt any shared transport to
//! `std::io::Read` / `std::io::Write` so the framing layer stays generic.

pub mod error;
pub mod io;
pub mod socket;
pub mod traits;

pub use error::{Result, TransportError};
pub use io::{TransportReader, TransportWriter};
pub use socket::{Endpoint, SocketTransport};
pub use traits::Transport;
