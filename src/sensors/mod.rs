//! Local sensor subsystem: individual drivers and the aggregating [`SensorHub`].
//!
//! The hub owns the three local peripherals.  The telemetry tick polls each
//! of them once per period through the [`SensorPort`](crate::app::ports::SensorPort)
//! implemented by the hardware adapter.

pub mod environment;
pub mod pressure;
pub mod tachometer;

use embedded_hal::i2c::I2c;
use embedded_hal::spi::SpiDevice;

use crate::error::SensorError;
use environment::{EnvSample, EnvironmentSensor};
use pressure::{PressureReading, PressureSensor};
use tachometer::{TachReading, Tachometer};

/// Aggregates all local sensor drivers.
pub struct SensorHub<'a, SPI, I2C> {
    pub tachometer: Tachometer<'a>,
    pub pressure: PressureSensor<SPI>,
    pub environment: EnvironmentSensor<I2C>,
}

impl<'a, SPI: SpiDevice, I2C: I2c> SensorHub<'a, SPI, I2C> {
    /// Construct a new hub.  Pass in pre-built drivers (built in main
    /// where peripheral ownership is established).
    pub fn new(
        tachometer: Tachometer<'a>,
        pressure: PressureSensor<SPI>,
        environment: EnvironmentSensor<I2C>,
    ) -> Self {
        Self {
            tachometer,
            pressure,
            environment,
        }
    }

    /// One-time sensor bring-up.  Only the environmental sensor needs it.
    pub fn init(&mut self) -> Result<(), SensorError> {
        self.environment.init()
    }

    pub fn read_tachometer(&mut self) -> TachReading {
        self.tachometer.sample()
    }

    pub fn read_pressure(&mut self) -> PressureReading {
        self.pressure.read()
    }

    pub fn sample_environment(&mut self) -> Result<EnvSample, SensorError> {
        self.environment.sample()
    }
}
