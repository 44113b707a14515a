//! Raw broadcast payload
//!
//! Payload is exactly 9 bytes:
//! - Bytes 0-1: Manufacturer tag (LE)
//! - Byte 2: Node ID
//! - Bytes 3-4: Temperature x100 (LE, signed)
//! - Bytes 5-6: Humidity x100 (LE)
//! - Bytes 7-8: Illuminance in lux (LE)
//!
//! A channel holding its type's maximum value means the node's sensor
//! failed for that packet.

use nodewatch_core::{NodeId, NodewatchError, NodewatchResult};

/// Payload size in bytes
pub const PAYLOAD_SIZE: usize = 9;

/// Manufacturer tag used by the deployed sensor nodes
pub const DEFAULT_MANUFACTURER_ID: u16 = 0x02E5;

/// Sentinel values
pub const TEMPERATURE_FAULT: i16 = i16::MAX;
pub const HUMIDITY_FAULT: u16 = u16::MAX;
pub const ILLUMINANCE_FAULT: u16 = u16::MAX;

/// Payload exactly as broadcast
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawReading {
    pub manufacturer_id: u16,
    pub node_id: NodeId,
    pub temperature: i16,
    pub humidity: u16,
    pub illuminance: u16,
}

impl RawReading {
    /// Parse a payload; any length other than [`PAYLOAD_SIZE`] is rejected
    pub fn parse(buf: &[u8]) -> NodewatchResult<Self> {
        if buf.len() != PAYLOAD_SIZE {
            return Err(NodewatchError::MalformedPayload {
                expected: PAYLOAD_SIZE,
                actual: buf.len(),
            });
        }

        Ok(RawReading {
            manufacturer_id: u16::from_le_bytes([buf[0], buf[1]]),
            node_id: NodeId::from_byte(buf[2]),
            temperature: i16::from_le_bytes([buf[3], buf[4]]),
            humidity: u16::from_le_bytes([buf[5], buf[6]]),
            illuminance: u16::from_le_bytes([buf[7], buf[8]]),
        })
    }

    /// Serialize into the first [`PAYLOAD_SIZE`] bytes of `buf`
    pub fn serialize(&self, buf: &mut [u8]) -> NodewatchResult<()> {
        if buf.len() < PAYLOAD_SIZE {
            return Err(NodewatchError::MalformedPayload {
                expected: PAYLOAD_SIZE,
                actual: buf.len(),
            });
        }

        self.write_unchecked(buf);
        Ok(())
    }

    pub fn to_bytes(&self) -> [u8; PAYLOAD_SIZE] {
        let mut buf = [0u8; PAYLOAD_SIZE];
        self.write_unchecked(&mut buf);
        buf
    }

    // Caller guarantees buf.len() >= PAYLOAD_SIZE
    fn write_unchecked(&self, buf: &mut [u8]) {
        buf[0..2].copy_from_slice(&self.manufacturer_id.to_le_bytes());
        buf[2] = self.node_id.to_byte();
        buf[3..5].copy_from_slice(&self.temperature.to_le_bytes());
        buf[5..7].copy_from_slice(&self.humidity.to_le_bytes());
        buf[7..9].copy_from_slice(&self.illuminance.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_layout() {
        let raw = RawReading {
            manufacturer_id: DEFAULT_MANUFACTURER_ID,
            node_id: NodeId::new(5),
            temperature: 2350,
            humidity: 6120,
            illuminance: 300,
        };

        let bytes = raw.to_bytes();
        assert_eq!(bytes, [0xE5, 0x02, 0x05, 0x2E, 0x09, 0xE8, 0x17, 0x2C, 0x01]);
        assert_eq!(RawReading::parse(&bytes).unwrap(), raw);
    }

    #[test]
    fn test_negative_temperature() {
        let mut bytes = [0u8; PAYLOAD_SIZE];
        bytes[3..5].copy_from_slice(&(-1250i16).to_le_bytes());

        let raw = RawReading::parse(&bytes).unwrap();
        assert_eq!(raw.temperature, -1250);
    }

    #[test]
    fn test_payload_wrong_length() {
        let result = RawReading::parse(&[0u8; 8]);
        assert!(matches!(
            result,
            Err(NodewatchError::MalformedPayload { expected: 9, actual: 8 })
        ));

        let result = RawReading::parse(&[0u8; 10]);
        assert!(matches!(result, Err(NodewatchError::MalformedPayload { actual: 10, .. })));
    }

    #[test]
    fn test_serialize_into_short_buffer() {
        let raw = RawReading::parse(&[0u8; PAYLOAD_SIZE]).unwrap();
        let mut buf = [0u8; 4];
        assert!(raw.serialize(&mut buf).is_err());

        let mut buf = [0xFFu8; 12];
        raw.serialize(&mut buf).unwrap();
        assert_eq!(&buf[..PAYLOAD_SIZE], &[0u8; PAYLOAD_SIZE]);
        assert_eq!(&buf[PAYLOAD_SIZE..], &[0xFF; 3]);
    }
}
