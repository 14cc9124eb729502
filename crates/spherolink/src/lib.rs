//! Drive and monitor Sphero robots.
//!
//! spherolink speaks the robot's serial command protocol over any reliable
//! byte stream, typically a TCP or Unix-domain socket bridged to the radio.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte-stream boundary and socket transport
//! - [`frame`]: packet codec, status codes and responses
//! - [`stream`]: sensor data-stream layout and decoding
//! - [`device`]: correlation, dispatch, async events and the command surface

/// Re-export transport types.
pub mod transport {
    pub use spherolink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use spherolink_frame::*;
}

/// Re-export data-stream types.
pub mod stream {
    pub use spherolink_stream::*;
}

/// Re-export device types.
pub mod device {
    pub use spherolink_device::*;
}

pub use spherolink_device::{Device, DeviceBuilder, DeviceConfig, DeviceError, Reply};
