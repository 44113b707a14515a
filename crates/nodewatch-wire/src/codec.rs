//! Payload codec - raw broadcast bytes to typed readings

use nodewatch_core::{DecodedReading, NodewatchError, NodewatchResult, SensorValue};

use crate::{
    RawReading, DEFAULT_MANUFACTURER_ID, HUMIDITY_FAULT, ILLUMINANCE_FAULT, PAYLOAD_SIZE,
    TEMPERATURE_FAULT,
};

/// Temperature and humidity are broadcast in hundredths
const SCALE: f32 = 100.0;

/// Stateless decoder bound to one manufacturer tag
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PayloadCodec {
    manufacturer_id: u16,
}

impl PayloadCodec {
    pub fn new(manufacturer_id: u16) -> Self {
        PayloadCodec { manufacturer_id }
    }

    #[inline]
    pub fn manufacturer_id(&self) -> u16 {
        self.manufacturer_id
    }

    /// Decode a broadcast payload.
    ///
    /// Only structural problems (length, manufacturer tag) are errors; a
    /// sensor channel holding its sentinel decodes to [`SensorValue::Fault`].
    pub fn decode(&self, buf: &[u8]) -> NodewatchResult<DecodedReading> {
        let raw = RawReading::parse(buf)?;

        if raw.manufacturer_id != self.manufacturer_id {
            return Err(NodewatchError::WrongManufacturer {
                expected: self.manufacturer_id,
                actual: raw.manufacturer_id,
            });
        }

        Ok(Self::interpret(&raw))
    }

    /// Map raw channels to domain values
    pub fn interpret(raw: &RawReading) -> DecodedReading {
        let temperature = if raw.temperature == TEMPERATURE_FAULT {
            SensorValue::Fault
        } else {
            SensorValue::Value(raw.temperature as f32 / SCALE)
        };

        let humidity = if raw.humidity == HUMIDITY_FAULT {
            SensorValue::Fault
        } else {
            SensorValue::Value(raw.humidity as f32 / SCALE)
        };

        let illuminance = if raw.illuminance == ILLUMINANCE_FAULT {
            SensorValue::Fault
        } else {
            SensorValue::Value(raw.illuminance)
        };

        DecodedReading {
            node_id: raw.node_id,
            temperature,
            humidity,
            illuminance,
        }
    }

    /// Build the raw payload a node would broadcast for `reading`.
    ///
    /// Values are clamped one step below the sentinel so that a measured
    /// value never encodes as a fault. Non-finite values encode as faults.
    pub fn to_raw(&self, reading: &DecodedReading) -> RawReading {
        let temperature = match reading.temperature {
            SensorValue::Value(v) if v.is_finite() => {
                (v * SCALE).round().clamp(i16::MIN as f32, (TEMPERATURE_FAULT - 1) as f32) as i16
            }
            _ => TEMPERATURE_FAULT,
        };

        let humidity = match reading.humidity {
            SensorValue::Value(v) if v.is_finite() => {
                (v * SCALE).round().clamp(0.0, (HUMIDITY_FAULT - 1) as f32) as u16
            }
            _ => HUMIDITY_FAULT,
        };

        let illuminance = match reading.illuminance {
            SensorValue::Value(v) => v.min(ILLUMINANCE_FAULT - 1),
            SensorValue::Fault => ILLUMINANCE_FAULT,
        };

        RawReading {
            manufacturer_id: self.manufacturer_id,
            node_id: reading.node_id,
            temperature,
            humidity,
            illuminance,
        }
    }

    pub fn encode(&self, reading: &DecodedReading) -> [u8; PAYLOAD_SIZE] {
        self.to_raw(reading).to_bytes()
    }
}

impl Default for PayloadCodec {
    fn default() -> Self {
        PayloadCodec::new(DEFAULT_MANUFACTURER_ID)
    }
}
