//! Temperature / humidity sensor on I2C (HDC2080-style register map).
//!
//! At startup the sensor is put into 1 Hz auto-measurement mode, so each
//! poll is a plain register read: pointer byte 0x00 followed by a 4-byte
//! burst (temperature LSB/MSB, humidity LSB/MSB).
//!
//! A failed poll falls back to the last good reading held in
//! [`EnvironmentCache`].  The telemetry row cannot tell a cached value
//! from a fresh one; the `fresh` flag only reaches the log.

use embedded_hal::i2c::I2c;
use log::{debug, info, warn};

use crate::error::SensorError;

const REG_TEMPERATURE_LOW: u8 = 0x00;
const REG_DEVICE_CONFIG: u8 = 0x0E;
const REG_MEASUREMENT_CONFIG: u8 = 0x0F;

/// DEVICE_CONFIG: AMM[2:0] = 101 (1 Hz auto measurement).
const AUTO_MEASURE_1HZ: u8 = 0b0101_0000;
/// MEASUREMENT_CONFIG: temperature + humidity, MEAS_TRIG.
const MEASURE_TRIGGER: u8 = 0b0000_0001;

/// One successful conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvSample {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

impl EnvSample {
    /// Convert the 4-byte register burst.
    pub fn from_registers(buf: [u8; 4]) -> Self {
        let raw_t = u16::from_le_bytes([buf[0], buf[1]]);
        let raw_h = u16::from_le_bytes([buf[2], buf[3]]);
        Self {
            temperature_c: f32::from(raw_t) / 65536.0 * 165.0 - 40.0,
            humidity_pct: f32::from(raw_h) / 65536.0 * 100.0,
        }
    }
}

/// Value reported to telemetry for one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvReading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    /// `false` when the values came from the cache.
    pub fresh: bool,
}

/// Last good environmental reading.
///
/// Holds NaN until the first successful poll.
#[derive(Debug, Clone, Copy)]
pub struct EnvironmentCache {
    last_temperature_c: f32,
    last_humidity_pct: f32,
    consecutive_failures: u32,
}

impl EnvironmentCache {
    pub const fn new() -> Self {
        Self {
            last_temperature_c: f32::NAN,
            last_humidity_pct: f32::NAN,
            consecutive_failures: 0,
        }
    }

    /// Fold one poll result into the cache and return what to report.
    pub fn update(&mut self, result: Result<EnvSample, SensorError>) -> EnvReading {
        match result {
            Ok(sample) => {
                if self.consecutive_failures > 0 {
                    info!(
                        "environment: recovered after {} failed polls",
                        self.consecutive_failures
                    );
                }
                self.consecutive_failures = 0;
                self.last_temperature_c = sample.temperature_c;
                self.last_humidity_pct = sample.humidity_pct;
                EnvReading {
                    temperature_c: sample.temperature_c,
                    humidity_pct: sample.humidity_pct,
                    fresh: true,
                }
            }
            Err(e) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                if self.consecutive_failures == 1 {
                    warn!("environment: {}, reporting cached values", e);
                } else {
                    debug!("environment: {} (x{})", e, self.consecutive_failures);
                }
                EnvReading {
                    temperature_c: self.last_temperature_c,
                    humidity_pct: self.last_humidity_pct,
                    fresh: false,
                }
            }
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}

impl Default for EnvironmentCache {
    fn default() -> Self {
        Self::new()
    }
}

pub struct EnvironmentSensor<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> EnvironmentSensor<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Start continuous low-rate auto-measurement.
    pub fn init(&mut self) -> Result<(), SensorError> {
        self.write_register(REG_DEVICE_CONFIG, AUTO_MEASURE_1HZ)?;
        self.write_register(REG_MEASUREMENT_CONFIG, MEASURE_TRIGGER)?;
        info!("environment: auto-measurement started at 0x{:02X}", self.address);
        Ok(())
    }

    /// Pointer write then 4-byte burst read in one transaction.
    pub fn sample(&mut self) -> Result<EnvSample, SensorError> {
        let mut buf = [0u8; 4];
        self.i2c
            .write_read(self.address, &[REG_TEMPERATURE_LOW], &mut buf)
            .map_err(|_| SensorError::I2cTransactionFailed)?;
        Ok(EnvSample::from_registers(buf))
    }

    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), SensorError> {
        self.i2c
            .write(self.address, &[reg, value])
            .map_err(|_| SensorError::I2cTransactionFailed)
    }
}
