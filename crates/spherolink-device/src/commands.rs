//! Device and command identifiers.

/// Core virtual device: link, power and diagnostics.
pub const DEVICE_CORE: u8 = 0x00;
/// Sphero virtual device: motion, lights and sensors.
pub const DEVICE_SPHERO: u8 = 0x02;

pub mod core_commands {
    pub const PING: u8 = 0x01;
    pub const GET_VERSIONING: u8 = 0x02;
    pub const SET_NAME: u8 = 0x10;
    pub const GET_BLUETOOTH_INFO: u8 = 0x11;
    pub const GET_POWER_STATE: u8 = 0x20;
    pub const SET_POWER_NOTIFICATION: u8 = 0x21;
    pub const SLEEP: u8 = 0x22;
    pub const GET_VOLTAGE_TRIP: u8 = 0x23;
    pub const SET_VOLTAGE_TRIP: u8 = 0x24;
    pub const SET_INACTIVITY_TIMEOUT: u8 = 0x25;
    pub const L1_DIAGNOSTIC: u8 = 0x40;
    pub const POLL_PACKET_TIMES: u8 = 0x51;
}

pub mod sphero_commands {
    pub const SET_HEADING: u8 = 0x01;
    pub const SET_STABILIZATION: u8 = 0x02;
    pub const SET_ROTATION_RATE: u8 = 0x03;
    pub const GET_CHASSIS_ID: u8 = 0x07;
    pub const SET_DATA_STREAM: u8 = 0x11;
    pub const CONFIGURE_COLLISION: u8 = 0x12;
    pub const SET_COLOR: u8 = 0x20;
    pub const SET_BACK_LIGHT: u8 = 0x21;
    pub const GET_COLOR: u8 = 0x22;
    pub const ROLL: u8 = 0x30;
    pub const BOOST: u8 = 0x31;
    pub const SET_RAW_MOTORS: u8 = 0x33;
    pub const SET_MOTION_TIMEOUT: u8 = 0x34;
    pub const SET_PERMANENT_OPTIONS: u8 = 0x35;
    pub const GET_PERMANENT_OPTIONS: u8 = 0x36;
    pub const SET_TEMPORARY_OPTIONS: u8 = 0x37;
    pub const GET_TEMPORARY_OPTIONS: u8 = 0x38;
}
