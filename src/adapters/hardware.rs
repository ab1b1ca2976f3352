//! Hardware adapter: bridges the local peripherals to domain port traits.
//!
//! Owns the [`SensorHub`] and the [`PumpDriver`], exposing them through
//! [`SensorPort`] and [`ActuatorPort`].  Generic over the embedded-hal
//! bus traits, so the same adapter wraps ESP-IDF drivers on target and
//! in-memory doubles in tests.

use embedded_hal::i2c::I2c;
use embedded_hal::pwm::SetDutyCycle;
use embedded_hal::spi::SpiDevice;
use log::info;

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::drivers::pump::PumpDriver;
use crate::error::{ActuatorError, Result, SensorError};
use crate::sensors::environment::EnvSample;
use crate::sensors::pressure::PressureReading;
use crate::sensors::tachometer::TachReading;
use crate::sensors::SensorHub;

/// Concrete adapter that combines all local hardware behind port traits.
pub struct HardwareAdapter<'a, SPI, I2C, PWM> {
    sensor_hub: SensorHub<'a, SPI, I2C>,
    pump: PumpDriver<PWM>,
}

impl<'a, SPI, I2C, PWM> HardwareAdapter<'a, SPI, I2C, PWM>
where
    SPI: SpiDevice,
    I2C: I2c,
    PWM: SetDutyCycle,
{
    pub fn new(sensor_hub: SensorHub<'a, SPI, I2C>, pump: PumpDriver<PWM>) -> Self {
        Self { sensor_hub, pump }
    }

    /// Stop the pump and start the environmental sensor.
    ///
    /// A sensor that fails to start is not fatal: its reads fail and the
    /// cache reports NaN until it answers.
    pub fn init(&mut self) -> Result<()> {
        self.pump.stop()?;
        match self.sensor_hub.init() {
            Ok(()) => info!("hardware: sensors initialised"),
            Err(e) => log::warn!("hardware: {} during sensor init, continuing", e),
        }
        Ok(())
    }

    pub fn pump_percent(&self) -> u8 {
        self.pump.current_percent()
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<SPI: SpiDevice, I2C: I2c, PWM: SetDutyCycle> SensorPort for HardwareAdapter<'_, SPI, I2C, PWM> {
    fn read_tachometer(&mut self) -> TachReading {
        self.sensor_hub.read_tachometer()
    }

    fn read_pressure(&mut self) -> PressureReading {
        self.sensor_hub.read_pressure()
    }

    fn sample_environment(&mut self) -> core::result::Result<EnvSample, SensorError> {
        self.sensor_hub.sample_environment()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<SPI: SpiDevice, I2C: I2c, PWM: SetDutyCycle> ActuatorPort
    for HardwareAdapter<'_, SPI, I2C, PWM>
{
    fn apply_pump_speed(&mut self, percent: u8) -> core::result::Result<(), ActuatorError> {
        self.pump.apply(percent)
    }
}
