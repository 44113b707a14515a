//! Decoded sensor readings and registry entries

use std::fmt;

use crate::{NodeId, Timestamp};

/// A single sensor channel: either a measured value or the node's own
/// "sensor error" marker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SensorValue<T> {
    Value(T),
    Fault,
}

impl<T: Copy> SensorValue<T> {
    #[inline]
    pub fn is_fault(&self) -> bool {
        matches!(self, SensorValue::Fault)
    }

    #[inline]
    pub fn value(&self) -> Option<T> {
        match self {
            SensorValue::Value(v) => Some(*v),
            SensorValue::Fault => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> SensorValue<U> {
        match self {
            SensorValue::Value(v) => SensorValue::Value(f(v)),
            SensorValue::Fault => SensorValue::Fault,
        }
    }
}

impl<T> From<Option<T>> for SensorValue<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => SensorValue::Value(v),
            None => SensorValue::Fault,
        }
    }
}

impl<T: fmt::Display> fmt::Display for SensorValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorValue::Value(v) => v.fmt(f),
            SensorValue::Fault => f.write_str("error"),
        }
    }
}

/// Reading produced by the payload codec
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecodedReading {
    pub node_id: NodeId,
    /// Degrees Celsius
    pub temperature: SensorValue<f32>,
    /// Relative humidity, percent
    pub humidity: SensorValue<f32>,
    /// Lux
    pub illuminance: SensorValue<u16>,
}

impl DecodedReading {
    /// True when no channel carries the fault marker
    pub fn is_complete(&self) -> bool {
        self.fault_count() == 0
    }

    pub fn fault_count(&self) -> usize {
        [
            self.temperature.is_fault(),
            self.humidity.is_fault(),
            self.illuminance.is_fault(),
        ]
        .iter()
        .filter(|f| **f)
        .count()
    }
}

/// Registry record: the last accepted reading of one node
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeEntry {
    pub node_id: NodeId,
    pub temperature: SensorValue<f32>,
    pub humidity: SensorValue<f32>,
    pub illuminance: SensorValue<u16>,
    /// Time of the last accepted reading
    pub last_seen: Timestamp,
}

impl NodeEntry {
    pub fn from_reading(reading: &DecodedReading, last_seen: Timestamp) -> Self {
        NodeEntry {
            node_id: reading.node_id,
            temperature: reading.temperature,
            humidity: reading.humidity,
            illuminance: reading.illuminance,
            last_seen,
        }
    }

    /// The reading this entry was built from
    pub fn reading(&self) -> DecodedReading {
        DecodedReading {
            node_id: self.node_id,
            temperature: self.temperature,
            humidity: self.humidity,
            illuminance: self.illuminance,
        }
    }
}
