use bytes::Buf;
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

use crate::catalog::Group;
use crate::config::StreamConfig;
use crate::error::{Result, StreamError};

/// Values of one group within one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub group: Group,
    /// One value per [`Group::fields`] entry.
    pub values: Vec<f64>,
}

impl Reading {
    /// Value of a named field, e.g. `"x"` or `"yaw"`.
    pub fn field(&self, name: &str) -> Option<f64> {
        self.group
            .fields()
            .iter()
            .position(|field| *field == name)
            .and_then(|index| self.values.get(index).copied())
    }
}

/// One decoded sample: every active group, in emission order.
///
/// Serializes as `{ "group": { "field": value, .. }, .. }`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedFrame {
    pub readings: Vec<Reading>,
}

impl DecodedFrame {
    pub fn get(&self, group: Group) -> Option<&Reading> {
        self.readings.iter().find(|reading| reading.group == group)
    }

    pub fn groups(&self) -> impl Iterator<Item = Group> + '_ {
        self.readings.iter().map(|reading| reading.group)
    }
}

struct Fields<'a>(&'a Reading);

impl Serialize for Fields<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let fields = self.0.group.fields();
        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for (field, value) in fields.iter().zip(&self.0.values) {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

impl Serialize for DecodedFrame {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.readings.len()))?;
        for reading in &self.readings {
            map.serialize_entry(reading.group.name(), &Fields(reading))?;
        }
        map.end()
    }
}

/// Decodes stream packets for a fixed configuration.
///
/// The active group list is computed once at construction.
#[derive(Debug, Clone)]
pub struct StreamDecoder {
    config: StreamConfig,
    groups: Vec<Group>,
    value_count: usize,
}

impl StreamDecoder {
    pub fn new(config: StreamConfig) -> Self {
        let groups = config.active_groups();
        let value_count = groups.iter().map(|group| group.arity()).sum();
        Self {
            config,
            groups,
            value_count,
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Bytes one packet must carry.
    pub fn expected_len(&self) -> usize {
        self.value_count * 2 * self.config.frame_count as usize
    }

    /// Split a stream payload into frames of big-endian `i16` values.
    pub fn decode(&self, raw: &[u8]) -> Result<Vec<DecodedFrame>> {
        let expected = self.expected_len();
        if raw.len() != expected {
            return Err(StreamError::LengthMismatch {
                expected,
                actual: raw.len(),
            });
        }

        let mut buf = raw;
        let mut frames = Vec::with_capacity(self.config.frame_count as usize);
        for _ in 0..self.config.frame_count {
            let readings = self
                .groups
                .iter()
                .map(|group| {
                    let scale = if self.config.convert {
                        group.scale()
                    } else {
                        1.0
                    };
                    let values = (0..group.arity())
                        .map(|_| f64::from(buf.get_i16()) * scale)
                        .collect();
                    Reading {
                        group: *group,
                        values,
                    }
                })
                .collect();
            frames.push(DecodedFrame { readings });
        }

        debug!(frames = frames.len(), bytes = raw.len(), "decoded stream packet");
        Ok(frames)
    }
}
