//! Fuzz target: `parse_response`
//!
//! Feeds arbitrary bytes to the instrument reply parser and checks that
//! whatever it accepts is internally consistent.
//!
//! cargo fuzz run fuzz_mecom_frame

#![no_main]

use libfuzzer_sys::fuzz_target;
use tecbridge::mecom::frame::{crc16, parse_response};

fuzz_target!(|data: &[u8]| {
    if let Ok(response) = parse_response(data) {
        // Start + address + sequence + CRC + terminator surround the payload.
        assert!(response.payload.len() + 12 == data.len());
        if !response.is_ack() {
            let crc_at = data.len() - 5;
            assert_eq!(crc16(&data[..crc_at]), response.crc);
        }
        if response.device_error().is_some() {
            assert_eq!(response.payload.len(), 3);
            assert_eq!(response.payload[0], b'+');
        }
    }
});
