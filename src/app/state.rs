//! Process-wide device state owned by the [`AppService`](super::service::AppService).
//!
//! Holds the two pieces of state that outlive a single telemetry cycle:
//! the commanded pump speed and the environmental fallback cache.

use crate::sensors::environment::EnvironmentCache;

/// Commanded pump speed.  Mutated only by the command dispatcher, read
/// every telemetry tick, never reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpState {
    commanded_speed_percent: u8,
}

impl PumpState {
    /// Clamp `requested` into 0..=100, store it and return the stored value.
    pub fn command(&mut self, requested: i32) -> u8 {
        let percent = requested.clamp(0, 100) as u8;
        self.commanded_speed_percent = percent;
        percent
    }

    pub fn speed_percent(&self) -> u8 {
        self.commanded_speed_percent
    }
}

#[derive(Debug, Default)]
pub struct DeviceState {
    pub pump: PumpState,
    pub environment: EnvironmentCache,
}

impl DeviceState {
    pub fn new() -> Self {
        Self::default()
    }
}
