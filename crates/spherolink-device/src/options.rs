//! Persistent settings and motor/collision parameter types.

use bitflags::bitflags;

bitflags! {
    /// Options stored in device flash; they survive power cycles.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct PermanentOptions: u64 {
        /// Do not sleep immediately when placed on the charger while connected.
        const SLEEP_ON_CHARGER = 1 << 0;
        /// Reach the new heading before rolling from a stop.
        const VECTOR_DRIVE = 1 << 1;
        /// Disable self-leveling on the charger.
        const LEVEL_ON_CHARGER = 1 << 2;
        /// Keep the tail light on.
        const TAIL_ALWAYS_ON = 1 << 3;
        /// Honor the motion timeout.
        const MOTION_TIMEOUT = 1 << 4;
        /// Retail demo mode.
        const DEMO_MODE = 1 << 5;
        /// Light double-tap wakeup sensitivity.
        const LIGHT_WAKEUP = 1 << 6;
        /// Heavy double-tap wakeup sensitivity.
        const HEAVY_WAKEUP = 1 << 7;
        /// Emit the gyro-max async message.
        const GYRO_MAX_ASYNC = 1 << 8;
    }
}

impl PermanentOptions {
    /// Select light wakeup sensitivity (clears heavy).
    pub fn with_light_wakeup(mut self) -> Self {
        self.remove(Self::HEAVY_WAKEUP);
        self.insert(Self::LIGHT_WAKEUP);
        self
    }

    /// Select heavy wakeup sensitivity (clears light).
    pub fn with_heavy_wakeup(mut self) -> Self {
        self.remove(Self::LIGHT_WAKEUP);
        self.insert(Self::HEAVY_WAKEUP);
        self
    }

    /// Names of the set flags, for display.
    pub fn names(&self) -> Vec<&'static str> {
        self.iter_names().map(|(name, _)| name).collect()
    }
}

/// Drive mode of one motor in a raw-motor command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum MotorMode {
    #[default]
    Off = 0x00,
    Forward = 0x01,
    Reverse = 0x02,
    Brake = 0x03,
    /// Leave the motor as it is.
    Ignore = 0x04,
}

/// Mode and PWM power for one motor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotorValue {
    pub mode: MotorMode,
    pub power: u8,
}

impl MotorValue {
    pub const fn new(mode: MotorMode, power: u8) -> Self {
        Self { mode, power }
    }
}

/// Collision detector thresholds.
///
/// Thresholds and speed factors apply per axis; `dead_time` is in 10 ms
/// units and suppresses repeated notifications after a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionConfig {
    pub x_threshold: u8,
    pub x_speed: u8,
    pub y_threshold: u8,
    pub y_speed: u8,
    pub dead_time: u8,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            x_threshold: 100,
            x_speed: 100,
            y_threshold: 100,
            y_speed: 100,
            dead_time: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wakeup_sensitivity_is_exclusive() {
        let options = PermanentOptions::VECTOR_DRIVE.with_light_wakeup();
        assert!(options.contains(PermanentOptions::LIGHT_WAKEUP));
        let options = options.with_heavy_wakeup();
        assert!(options.contains(PermanentOptions::HEAVY_WAKEUP));
        assert!(!options.contains(PermanentOptions::LIGHT_WAKEUP));
        assert_eq!(options.names(), vec!["VECTOR_DRIVE", "HEAVY_WAKEUP"]);
    }

    #[test]
    fn option_bits_match_firmware_layout() {
        assert_eq!(PermanentOptions::SLEEP_ON_CHARGER.bits(), 0x0001);
        assert_eq!(PermanentOptions::MOTION_TIMEOUT.bits(), 0x0010);
        assert_eq!(PermanentOptions::GYRO_MAX_ASYNC.bits(), 0x0100);
    }
}
