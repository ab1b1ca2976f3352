//! Port traits: the boundary between the bridge logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (local sensors, pump, instrument client, clock) implement
//! these traits.  The [`AppService`](super::service::AppService) consumes
//! them via generics, so the loop, the dispatcher and the telemetry emitter
//! never touch hardware directly and run unchanged against test doubles.

use crate::error::{ActuatorError, ParameterError, SensorError};
use crate::sensors::environment::EnvSample;
use crate::sensors::pressure::PressureReading;
use crate::sensors::tachometer::TachReading;

/// Capacity of the instrument identification string.
pub const IDENT_CAPACITY: usize = 32;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: local peripherals → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port for the three local peripherals.
pub trait SensorPort {
    /// Snapshot the pulse counter and derive the pump speed since the
    /// previous call.  Must be called exactly once per telemetry period.
    fn read_tachometer(&mut self) -> TachReading;

    /// Poll the pressure transducer.  Never fails: transfer errors are
    /// folded into the reading's status.
    fn read_pressure(&mut self) -> PressureReading;

    /// Poll the environmental sensor.  The caller owns the fallback cache.
    fn sample_environment(&mut self) -> Result<EnvSample, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → pump)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to drive the pump.
pub trait ActuatorPort {
    /// Apply an already-clamped speed (0–100 %).
    fn apply_pump_speed(&mut self, percent: u8) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Parameter client (driven adapter: domain ↔ instrument)
// ───────────────────────────────────────────────────────────────

/// Get/set-by-id access to the instrument on the RS-485 bus.
///
/// Every `Err` means "value unavailable this cycle"; no caller treats it
/// as fatal.
pub trait ParameterClient {
    fn read_float(&mut self, id: u16, instance: u8) -> Result<f32, ParameterError>;

    fn read_long(&mut self, id: u16, instance: u8) -> Result<i32, ParameterError>;

    fn write_float(&mut self, id: u16, instance: u8, value: f32) -> Result<(), ParameterError>;

    fn write_long(&mut self, id: u16, instance: u8, value: i32) -> Result<(), ParameterError>;

    /// Instrument identification text.
    fn identify(&mut self) -> Result<heapless::String<IDENT_CAPACITY>, ParameterError>;
}

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock.
///
/// Deadlines (bus receive timeout, telemetry period) are checked against
/// this instead of a hardware timer so tests can drive time explicitly.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}
