//! Sensor field groups the firmware can stream, in the order it emits them.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::Serialize;

use crate::error::StreamError;

bitflags! {
    /// First data-stream mask word.
    ///
    /// Each constant spans every axis of one group; the firmware only streams
    /// a group when all of its bits are set.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Mask1: u32 {
        const ACC_RAW = 0xE000_0000;
        const GYRO_RAW = 0x1C00_0000;
        const MOTOR_EMF_RAW = 0x0060_0000;
        const MOTOR_PWM_RAW = 0x0018_0000;
        const IMU_ANGLE = 0x0007_0000;
        const ACC = 0x0000_E000;
        const GYRO = 0x0000_1C00;
        const MOTOR_EMF = 0x0000_0060;
    }
}

bitflags! {
    /// Second data-stream mask word.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Mask2: u32 {
        const QUATERNION = 0xF000_0000;
        const ODOM = 0x0C00_0000;
        const ACCEL_ONE = 0x0200_0000;
        const VELOCITY = 0x0180_0000;
    }
}

/// One streamable sensor group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    AccRaw,
    GyroRaw,
    MotorEmfRaw,
    MotorPwmRaw,
    ImuAngle,
    Acc,
    Gyro,
    MotorEmf,
    Quaternion,
    Odom,
    AccelOne,
    Velocity,
}

/// Which mask word a group lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskBits {
    First(Mask1),
    Second(Mask2),
}

const DEG_TO_RAD: f64 = PI / 180.0;

const XYZ: &[&str] = &["x", "y", "z"];
const RIGHT_LEFT: &[&str] = &["right", "left"];
const LEFT_RIGHT: &[&str] = &["left", "right"];
const PITCH_ROLL_YAW: &[&str] = &["pitch", "roll", "yaw"];
const XY: &[&str] = &["x", "y"];
const XYZW: &[&str] = &["x", "y", "z", "w"];
const VALUE: &[&str] = &["value"];

impl Group {
    /// Every group in firmware emission order: all of mask 1, then mask 2.
    pub const ALL: [Group; 12] = [
        Group::AccRaw,
        Group::GyroRaw,
        Group::MotorEmfRaw,
        Group::MotorPwmRaw,
        Group::ImuAngle,
        Group::Acc,
        Group::Gyro,
        Group::MotorEmf,
        Group::Quaternion,
        Group::Odom,
        Group::AccelOne,
        Group::Velocity,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::AccRaw => "acc_raw",
            Self::GyroRaw => "gyro_raw",
            Self::MotorEmfRaw => "motor_emf_raw",
            Self::MotorPwmRaw => "motor_pwm_raw",
            Self::ImuAngle => "imu_angle",
            Self::Acc => "acc",
            Self::Gyro => "gyro",
            Self::MotorEmf => "motor_emf",
            Self::Quaternion => "quaternion",
            Self::Odom => "odom",
            Self::AccelOne => "accel_one",
            Self::Velocity => "velocity",
        }
    }

    pub fn bits(self) -> MaskBits {
        match self {
            Self::AccRaw => MaskBits::First(Mask1::ACC_RAW),
            Self::GyroRaw => MaskBits::First(Mask1::GYRO_RAW),
            Self::MotorEmfRaw => MaskBits::First(Mask1::MOTOR_EMF_RAW),
            Self::MotorPwmRaw => MaskBits::First(Mask1::MOTOR_PWM_RAW),
            Self::ImuAngle => MaskBits::First(Mask1::IMU_ANGLE),
            Self::Acc => MaskBits::First(Mask1::ACC),
            Self::Gyro => MaskBits::First(Mask1::GYRO),
            Self::MotorEmf => MaskBits::First(Mask1::MOTOR_EMF),
            Self::Quaternion => MaskBits::Second(Mask2::QUATERNION),
            Self::Odom => MaskBits::Second(Mask2::ODOM),
            Self::AccelOne => MaskBits::Second(Mask2::ACCEL_ONE),
            Self::Velocity => MaskBits::Second(Mask2::VELOCITY),
        }
    }

    /// Labels of the values this group carries, in wire order.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            Self::AccRaw | Self::GyroRaw | Self::Acc | Self::Gyro => XYZ,
            Self::MotorEmfRaw | Self::MotorEmf => RIGHT_LEFT,
            Self::MotorPwmRaw => LEFT_RIGHT,
            Self::ImuAngle => PITCH_ROLL_YAW,
            Self::Quaternion => XYZW,
            Self::Odom | Self::Velocity => XY,
            Self::AccelOne => VALUE,
        }
    }

    /// Number of 16-bit values per frame.
    pub fn arity(self) -> usize {
        self.fields().len()
    }

    /// Factor converting the raw integer into physical units.
    pub fn scale(self) -> f64 {
        match self {
            // 4 mg -> g. Raw counts, not the 1/4096 g of the filtered `acc`.
            Self::AccRaw => 4e-3,
            // 0.068 degrees -> radians
            Self::GyroRaw => 0.068 * DEG_TO_RAD,
            Self::MotorEmfRaw | Self::MotorEmf => 0.225,
            // PWM duty is unitless; the 0.225 EMF factor does not apply.
            Self::MotorPwmRaw => 1.0,
            Self::ImuAngle => DEG_TO_RAD,
            // 1/4096 g -> g
            Self::Acc => 1.0 / 4096.0,
            // 0.1 dps -> dps
            Self::Gyro => 0.1,
            Self::Quaternion => 1e-4,
            // cm -> m
            Self::Odom => 1e-2,
            // mg -> g
            Self::AccelOne => 1e-3,
            // mm/s -> m/s
            Self::Velocity => 1e-3,
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Group {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_").to_ascii_lowercase();
        Group::ALL
            .into_iter()
            .find(|group| group.name() == wanted)
            .ok_or_else(|| StreamError::UnknownGroup(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_never_overlap() {
        let mut first = 0u32;
        let mut second = 0u32;
        for group in Group::ALL {
            match group.bits() {
                MaskBits::First(bits) => {
                    assert_eq!(first & bits.bits(), 0, "{group} overlaps");
                    first |= bits.bits();
                }
                MaskBits::Second(bits) => {
                    assert_eq!(second & bits.bits(), 0, "{group} overlaps");
                    second |= bits.bits();
                }
            }
        }
    }

    #[test]
    fn arity_matches_mask_width() {
        for group in Group::ALL {
            let width = match group.bits() {
                MaskBits::First(bits) => bits.bits().count_ones(),
                MaskBits::Second(bits) => bits.bits().count_ones(),
            };
            assert_eq!(width as usize, group.arity(), "{group}");
        }
    }

    #[test]
    fn mask_one_groups_come_first() {
        let split = Group::ALL
            .iter()
            .position(|group| matches!(group.bits(), MaskBits::Second(_)))
            .unwrap();
        assert_eq!(split, 8);
        assert!(Group::ALL[split..]
            .iter()
            .all(|group| matches!(group.bits(), MaskBits::Second(_))));
    }

    #[test]
    fn parses_names() {
        assert_eq!("imu_angle".parse::<Group>().unwrap(), Group::ImuAngle);
        assert_eq!("Motor-EMF".parse::<Group>().unwrap(), Group::MotorEmf);
        assert!(matches!(
            "compass".parse::<Group>(),
            Err(StreamError::UnknownGroup(_))
        ));
    }

    #[test]
    fn scale_factors() {
        assert_eq!(Group::Acc.scale(), 1.0 / 4096.0);
        assert_eq!(Group::AccRaw.scale(), 4e-3);
        assert_eq!(Group::MotorPwmRaw.scale(), 1.0);
        assert!((Group::ImuAngle.scale() * 180.0 - PI).abs() < 1e-12);
    }
}
