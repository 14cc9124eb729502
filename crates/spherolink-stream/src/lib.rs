//! Sensor data-stream decoding.
//!
//! The device streams selected sensor groups as async packets of big-endian
//! 16-bit values. Which groups are present is fixed by two 32-bit masks sent
//! with the set-data-stream command; the firmware emits active groups in a
//! fixed order, so the masks alone determine the frame layout.

pub mod catalog;
pub mod config;
pub mod decoder;
pub mod error;

pub use catalog::{Group, Mask1, Mask2, MaskBits};
pub use config::{StreamConfig, COMMAND_PAYLOAD_SIZE, MAX_SAMPLE_RATE_HZ};
pub use decoder::{DecodedFrame, Reading, StreamDecoder};
pub use error::{Result, StreamError};
