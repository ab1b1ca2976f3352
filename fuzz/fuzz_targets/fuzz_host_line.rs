//! Fuzz target: host byte stream → `LineBuffer` → `AppService::handle_line`
//!
//! Arbitrary bytes are assembled into lines and dispatched against inert
//! ports.  Every non-blank line must be answered with `OK` or `ERR`, and
//! the commanded pump speed must stay within 0..=100.
//!
//! cargo fuzz run fuzz_host_line

#![no_main]

use heapless::String;
use libfuzzer_sys::fuzz_target;
use tecbridge::app::line::{LineBuffer, HOST_LINE_CAPACITY};
use tecbridge::app::ports::{ActuatorPort, ParameterClient, IDENT_CAPACITY};
use tecbridge::app::service::AppService;
use tecbridge::config::SystemConfig;
use tecbridge::error::{ActuatorError, ParameterError};

struct Pump;

impl ActuatorPort for Pump {
    fn apply_pump_speed(&mut self, percent: u8) -> Result<(), ActuatorError> {
        assert!(percent <= 100);
        Ok(())
    }
}

/// Accepts writes, reads back zero.
struct Instrument;

impl ParameterClient for Instrument {
    fn read_float(&mut self, _: u16, _: u8) -> Result<f32, ParameterError> {
        Ok(0.0)
    }
    fn read_long(&mut self, _: u16, _: u8) -> Result<i32, ParameterError> {
        Ok(0)
    }
    fn write_float(&mut self, _: u16, _: u8, _: f32) -> Result<(), ParameterError> {
        Ok(())
    }
    fn write_long(&mut self, _: u16, _: u8, _: i32) -> Result<(), ParameterError> {
        Ok(())
    }
    fn identify(&mut self) -> Result<String<IDENT_CAPACITY>, ParameterError> {
        Err(ParameterError::NoReply)
    }
}

fuzz_target!(|data: &[u8]| {
    let mut app = AppService::new(SystemConfig::default());
    let mut lines = LineBuffer::<HOST_LINE_CAPACITY>::new();

    for &byte in data {
        if let Some(line) = lines.push(byte) {
            if let Some(reply) = app.handle_line(&line, &mut Pump, &mut Instrument) {
                assert!(reply.starts_with("OK ") || reply.starts_with("ERR "));
            }
        }
        assert!(lines.pending() <= HOST_LINE_CAPACITY);
    }
    assert!(app.state().pump.speed_percent() <= 100);
});
