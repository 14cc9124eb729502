//! Command/response engine for Sphero robots.
//!
//! A [`Device`] owns one transport and three kinds of threads:
//! - Callers, which send commands and block until their acknowledgment
//!   arrives or the response window closes
//! - One receive thread, which reads packets, completes waiting callers by
//!   sequence number and hands async messages to the [`EventRouter`]
//! - A bounded [`HandlerPool`] that runs async callbacks off the receive path
//!
//! ```no_run
//! use spherolink_device::{Device, DeviceBuilder};
//! use spherolink_transport::{Endpoint, SocketTransport};
//! use std::sync::Arc;
//!
//! # fn main() -> spherolink_device::Result<()> {
//! let endpoint: Endpoint = "tcp:127.0.0.1:7000".parse()?;
//! let device = DeviceBuilder::new(Arc::new(SocketTransport::new(endpoint)))
//!     .on_power(|level| println!("battery {level}"))
//!     .connect()?;
//! if device.ping()?.is_ok() {
//!     device.roll(64, 90, false)?;
//! }
//! device.close();
//! # Ok(())
//! # }
//! ```

pub mod commands;
pub mod config;
pub mod correlator;
pub mod device;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod invoker;
pub mod options;
pub mod pool;
pub mod router;
mod sync;

pub use config::DeviceConfig;
pub use correlator::{Correlator, Pending};
pub use device::{Device, DeviceBuilder, Reply};
pub use error::{DeviceError, Result};
pub use events::{
    BluetoothInfo, CollisionEvent, Color, PacketTimes, PowerLevel, PowerState, Versioning,
    VoltageTripPoints, EVENT_COLLISION, EVENT_L1_DIAGNOSTIC, EVENT_POWER, EVENT_SENSOR_DATA,
};
pub use invoker::Invoker;
pub use options::{CollisionConfig, MotorMode, MotorValue, PermanentOptions};
pub use pool::{Backpressure, HandlerPool, Submitted};
pub use router::{EventRouter, EventRouterBuilder, Handler};
