//! Typed payloads of async messages and command replies.

use bytes::Buf;
use serde::Serialize;

use crate::error::{DeviceError, Result};

/// Async message: battery level changed.
pub const EVENT_POWER: u8 = 0x01;
/// Async message: forwarded level-1 diagnostic dump.
pub const EVENT_L1_DIAGNOSTIC: u8 = 0x02;
/// Async message: sensor data stream.
pub const EVENT_SENSOR_DATA: u8 = 0x03;
/// Async message: collision detected.
pub const EVENT_COLLISION: u8 = 0x07;

/// Battery level as reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerLevel {
    Charging,
    Ok,
    Low,
    Critical,
}

impl PowerLevel {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Charging),
            2 => Some(Self::Ok),
            3 => Some(Self::Low),
            4 => Some(Self::Critical),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Charging => "charging",
            Self::Ok => "ok",
            Self::Low => "low",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for PowerLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a power notification payload (one byte).
pub fn parse_power_notification(payload: &[u8]) -> Result<PowerLevel> {
    let value = *payload.first().ok_or(DeviceError::InvalidResponse {
        command: "power notification",
        expected: 1,
        actual: 0,
    })?;
    PowerLevel::from_u8(value).ok_or(DeviceError::UnknownPowerLevel(value))
}

/// Reply to get-power-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PowerState {
    pub record_version: u8,
    pub level: PowerLevel,
    /// Hundredths of a volt.
    pub battery_centivolts: u16,
    /// Recharges over the device lifetime.
    pub charge_count: u16,
    /// Seconds awake since the last charge.
    pub seconds_since_charge: u16,
}

impl PowerState {
    pub const SIZE: usize = 8;

    pub fn parse(mut payload: &[u8]) -> Result<Self> {
        require("power state", payload, Self::SIZE)?;
        let record_version = payload.get_u8();
        let raw_level = payload.get_u8();
        let level = PowerLevel::from_u8(raw_level).ok_or(DeviceError::UnknownPowerLevel(raw_level))?;
        Ok(Self {
            record_version,
            level,
            battery_centivolts: payload.get_u16(),
            charge_count: payload.get_u16(),
            seconds_since_charge: payload.get_u16(),
        })
    }

    pub fn battery_volts(&self) -> f64 {
        f64::from(self.battery_centivolts) / 100.0
    }
}

/// Collision notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CollisionEvent {
    /// Impact acceleration per axis.
    pub x: i16,
    pub y: i16,
    pub z: i16,
    /// Bit 0: X axis triggered, bit 1: Y axis triggered.
    pub axis: u8,
    pub x_magnitude: i16,
    pub y_magnitude: i16,
    pub speed: u8,
    /// Device clock in milliseconds.
    pub timestamp: u32,
}

impl CollisionEvent {
    pub const SIZE: usize = 16;

    pub fn parse(mut payload: &[u8]) -> Result<Self> {
        require("collision", payload, Self::SIZE)?;
        Ok(Self {
            x: payload.get_i16(),
            y: payload.get_i16(),
            z: payload.get_i16(),
            axis: payload.get_u8(),
            x_magnitude: payload.get_i16(),
            y_magnitude: payload.get_i16(),
            speed: payload.get_u8(),
            timestamp: payload.get_u32(),
        })
    }

    pub fn x_axis(&self) -> bool {
        self.axis & 0x01 != 0
    }

    pub fn y_axis(&self) -> bool {
        self.axis & 0x02 != 0
    }
}

/// Reply to get-versioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Versioning {
    pub record_version: u8,
    pub model: u8,
    pub hardware: u8,
    pub main_app_version: u8,
    pub main_app_revision: u8,
    pub bootloader: u8,
    pub basic: u8,
    pub macro_version: u8,
}

impl Versioning {
    pub const SIZE: usize = 8;

    pub fn parse(payload: &[u8]) -> Result<Self> {
        require("versioning", payload, Self::SIZE)?;
        Ok(Self {
            record_version: payload[0],
            model: payload[1],
            hardware: payload[2],
            main_app_version: payload[3],
            main_app_revision: payload[4],
            bootloader: payload[5],
            basic: payload[6],
            macro_version: payload[7],
        })
    }
}

/// Reply to get-bluetooth-info.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BluetoothInfo {
    pub name: String,
    pub address: String,
    /// ID colors blinked while disconnected.
    pub id_colors: [u8; 3],
}

impl BluetoothInfo {
    pub const SIZE: usize = 32;

    pub fn parse(payload: &[u8]) -> Result<Self> {
        require("bluetooth info", payload, Self::SIZE)?;
        Ok(Self {
            name: nul_terminated(&payload[..16]),
            address: nul_terminated(&payload[16..28]),
            id_colors: [payload[29], payload[30], payload[31]],
        })
    }
}

/// Low and critical battery thresholds in hundredths of a volt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoltageTripPoints {
    pub low: u16,
    pub critical: u16,
}

impl VoltageTripPoints {
    pub const SIZE: usize = 4;

    pub fn parse(mut payload: &[u8]) -> Result<Self> {
        require("voltage trip points", payload, Self::SIZE)?;
        Ok(Self {
            low: payload.get_u16(),
            critical: payload.get_u16(),
        })
    }
}

/// Link latency estimate from poll-packet-times.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PacketTimes {
    /// Device clock minus host clock, milliseconds.
    pub offset_ms: f64,
    /// Round-trip delay excluding device processing, milliseconds.
    pub delay_ms: i64,
}

impl PacketTimes {
    pub const SIZE: usize = 12;

    /// `sent` and `received` are the host clock (ms, truncated to 32 bits)
    /// at transmit and at reply.
    pub fn parse(mut payload: &[u8], sent: u32, received: u32) -> Result<Self> {
        require("packet times", payload, Self::SIZE)?;
        let echoed = i64::from(payload.get_u32());
        let device_rx = i64::from(payload.get_u32());
        let device_tx = i64::from(payload.get_u32());
        if echoed != i64::from(sent) {
            tracing::debug!(echoed, sent, "device echoed a different client time");
        }
        let received = i64::from(received);
        Ok(Self {
            offset_ms: 0.5 * ((device_rx - echoed) + (device_tx - received)) as f64,
            delay_ms: (received - echoed) - (device_tx - device_rx),
        })
    }
}

/// RGB color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    pub fn parse(payload: &[u8]) -> Result<Self> {
        require("color", payload, 3)?;
        Ok(Self::new(payload[0], payload[1], payload[2]))
    }
}

impl std::str::FromStr for Color {
    type Err = DeviceError;

    /// Accepts `RRGGBB` or `#RRGGBB`.
    fn from_str(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        let value = (hex.len() == 6)
            .then(|| u32::from_str_radix(hex, 16).ok())
            .flatten()
            .ok_or_else(|| DeviceError::InvalidArgument(format!("invalid color {s:?}")))?;
        let [_, red, green, blue] = value.to_be_bytes();
        Ok(Self::new(red, green, blue))
    }
}

pub(crate) fn require(command: &'static str, payload: &[u8], expected: usize) -> Result<()> {
    if payload.len() < expected {
        return Err(DeviceError::InvalidResponse {
            command,
            expected,
            actual: payload.len(),
        });
    }
    Ok(())
}

fn nul_terminated(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_notification_levels() {
        assert_eq!(parse_power_notification(&[1]).unwrap(), PowerLevel::Charging);
        assert_eq!(parse_power_notification(&[4]).unwrap(), PowerLevel::Critical);
        assert!(parse_power_notification(&[9]).is_err());
        assert!(matches!(
            parse_power_notification(&[]),
            Err(DeviceError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn power_state_layout() {
        let payload = [0x01, 0x02, 0x02, 0xD5, 0x00, 0x2A, 0x01, 0x2C];
        let state = PowerState::parse(&payload).unwrap();
        assert_eq!(state.level, PowerLevel::Ok);
        assert_eq!(state.battery_centivolts, 725);
        assert_eq!(state.charge_count, 42);
        assert_eq!(state.seconds_since_charge, 300);
        assert!((state.battery_volts() - 7.25).abs() < 1e-9);
    }

    #[test]
    fn short_power_state_rejected() {
        let err = PowerState::parse(&[0x01, 0x02]).unwrap_err();
        assert!(matches!(
            err,
            DeviceError::InvalidResponse {
                expected: 8,
                actual: 2,
                ..
            }
        ));
    }

    #[test]
    fn collision_layout() {
        let payload = [
            0xFF, 0x9C, // x = -100
            0x00, 0x32, // y = 50
            0x00, 0x00, // z
            0x03, // both axes
            0x01, 0x00, // x magnitude 256
            0x00, 0x80, // y magnitude 128
            0x40, // speed
            0x00, 0x01, 0x00, 0x00, // timestamp 65536
        ];
        let event = CollisionEvent::parse(&payload).unwrap();
        assert_eq!(event.x, -100);
        assert_eq!(event.y, 50);
        assert!(event.x_axis() && event.y_axis());
        assert_eq!(event.x_magnitude, 256);
        assert_eq!(event.y_magnitude, 128);
        assert_eq!(event.speed, 0x40);
        assert_eq!(event.timestamp, 65_536);
        assert!(CollisionEvent::parse(&payload[..15]).is_err());
    }

    #[test]
    fn packet_times_math() {
        // Host sent at 1000, device received at 1510 and replied at 1520,
        // host received at 1040: offset 495, delay 30.
        let mut payload = Vec::new();
        payload.extend_from_slice(&1000u32.to_be_bytes());
        payload.extend_from_slice(&1510u32.to_be_bytes());
        payload.extend_from_slice(&1520u32.to_be_bytes());
        let times = PacketTimes::parse(&payload, 1000, 1040).unwrap();
        assert_eq!(times.offset_ms, 495.0);
        assert_eq!(times.delay_ms, 30);
    }

    #[test]
    fn bluetooth_info_strips_padding() {
        let mut payload = vec![0u8; 32];
        payload[..6].copy_from_slice(b"Sphero");
        payload[16..28].copy_from_slice(b"000666123456");
        payload[29..].copy_from_slice(&[1, 2, 3]);
        let info = BluetoothInfo::parse(&payload).unwrap();
        assert_eq!(info.name, "Sphero");
        assert_eq!(info.address, "000666123456");
        assert_eq!(info.id_colors, [1, 2, 3]);
    }

    #[test]
    fn color_from_hex() {
        assert_eq!("#FF8000".parse::<Color>().unwrap(), Color::new(0xFF, 0x80, 0x00));
        assert_eq!("00ff00".parse::<Color>().unwrap(), Color::new(0, 0xFF, 0));
        assert!("red".parse::<Color>().is_err());
        assert!("#12345".parse::<Color>().is_err());
    }
}
