#![no_main]

use libfuzzer_sys::fuzz_target;

use nodewatch_core::NodewatchError;
use nodewatch_wire::{PayloadCodec, PAYLOAD_SIZE};

fuzz_target!(|data: &[u8]| {
    let codec = PayloadCodec::default();
    match codec.decode(data) {
        Ok(reading) => {
            assert_eq!(data.len(), PAYLOAD_SIZE);
            assert_eq!(codec.encode(&reading).as_slice(), data);
        }
        Err(NodewatchError::MalformedPayload { actual, .. }) => {
            assert_eq!(actual, data.len());
            assert_ne!(actual, PAYLOAD_SIZE);
        }
        Err(NodewatchError::WrongManufacturer { .. }) => {
            assert_eq!(data.len(), PAYLOAD_SIZE);
        }
        Err(e) => panic!("unexpected decode error: {}", e),
    }
});
