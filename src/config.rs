//! System configuration parameters
//!
//! All tunable parameters for the bridge. Values are compile-time defaults;
//! the `CONFIG` host command reads the live copy back as JSON.

use serde::{Deserialize, Serialize};

/// Two-point linear calibration of the pressure transducer.
///
/// Raw counts between `out_min` and `out_max` map linearly onto
/// `p_min_bar..p_max_bar`; counts outside the window extrapolate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PressureCalibration {
    /// Raw count at the lower calibration point (10 % of 2^14).
    pub out_min: u16,
    /// Raw count at the upper calibration point (90 % of 2^14).
    pub out_max: u16,
    /// Pressure at `out_min` (bar).
    pub p_min_bar: f32,
    /// Pressure at `out_max` (bar).
    pub p_max_bar: f32,
}

impl Default for PressureCalibration {
    fn default() -> Self {
        Self {
            out_min: 1638,
            out_max: 14745,
            p_min_bar: 0.0,
            p_max_bar: 1.0,
        }
    }
}

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Host link ---
    /// Host UART baud rate
    pub host_baud: u32,
    /// Emit a telemetry row right after acknowledging `GET`
    pub emit_on_get: bool,

    // --- Instrument bus ---
    /// Instrument UART baud rate
    pub instrument_baud: u32,
    /// Instrument bus address (0 = whichever device answers)
    pub instrument_address: u8,
    /// Receive timeout for one instrument reply (milliseconds)
    pub bus_timeout_ms: u32,

    // --- Telemetry ---
    /// Telemetry row period (milliseconds)
    pub telemetry_period_ms: u32,

    // --- Local sensors ---
    /// Tachometer pulses per pump revolution
    pub pulses_per_revolution: u16,
    /// Pressure transducer calibration
    pub pressure: PressureCalibration,
    /// SPI clock for the pressure transducer (Hz)
    pub spi_clock_hz: u32,
    /// 7-bit I2C address of the environmental sensor
    pub env_i2c_address: u8,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            host_baud: 115_200,
            emit_on_get: false,

            instrument_baud: 57_600,
            instrument_address: 0,
            bus_timeout_ms: 100,

            telemetry_period_ms: 1000, // 1 Hz

            pulses_per_revolution: 2,
            pressure: PressureCalibration::default(),
            spi_clock_hz: 800_000,
            env_i2c_address: 0x40,
        }
    }
}

impl SystemConfig {
    /// Telemetry period in seconds, as used by the RPM derivation.
    pub fn telemetry_period_secs(&self) -> f32 {
        self.telemetry_period_ms as f32 / 1000.0
    }

    /// Reject values that would make the loop or the conversions meaningless.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.telemetry_period_ms == 0 {
            return Err("telemetry_period_ms must be non-zero");
        }
        if self.pulses_per_revolution == 0 {
            return Err("pulses_per_revolution must be non-zero");
        }
        if self.bus_timeout_ms == 0 {
            return Err("bus_timeout_ms must be non-zero");
        }
        if self.pressure.out_max == self.pressure.out_min {
            return Err("pressure calibration span is empty");
        }
        Ok(())
    }
}
