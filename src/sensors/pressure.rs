//! Board-mount pressure transducer on SPI (14-bit digital output).
//!
//! Each poll clocks out two bytes with chip-select held low for the
//! transfer only.  The top two bits of the first byte are the status code;
//! the remaining 14 bits are the bridge count.
//!
//! ```text
//!  byte 0                    byte 1
//! ┌──┬──┬──────────────────┐┌────────────────────────┐
//! │S1│S0│  count[13:8]     ││      count[7:0]        │
//! └──┴──┴──────────────────┘└────────────────────────┘
//! ```
//!
//! A non-zero status still travels to the telemetry row so the host can
//! tell "sensor said invalid" from "sensor never replied" (SPI error).

use embedded_hal::spi::SpiDevice;
use log::debug;

use crate::config::PressureCalibration;
use crate::error::SensorError;

/// Status reported by the transducer (or by the driver when the transfer
/// itself failed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressureStatus {
    /// Fresh, valid count.
    Valid,
    /// Device is in command mode.
    CommandMode,
    /// Count already read since the last conversion.
    Stale,
    /// Diagnostic condition (bridge fault).
    Diagnostic,
    /// The SPI transfer failed; nothing was read.
    NoReply,
}

impl PressureStatus {
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::Valid,
            1 => Self::CommandMode,
            2 => Self::Stale,
            _ => Self::Diagnostic,
        }
    }

    /// Numeric code printed in the telemetry row.
    pub const fn code(self) -> i8 {
        match self {
            Self::Valid => 0,
            Self::CommandMode => 1,
            Self::Stale => 2,
            Self::Diagnostic => 3,
            Self::NoReply => -1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressureReading {
    pub status: PressureStatus,
    /// 14-bit bridge count (0 when nothing was read).
    pub raw: u16,
    /// Calibrated pressure (mbar); NaN unless `status` is `Valid`.
    pub millibar: f32,
}

impl PressureReading {
    /// Split a 2-byte reply and calibrate the count.
    pub fn decode(frame: [u8; 2], cal: &PressureCalibration) -> Self {
        let status = PressureStatus::from_bits(frame[0] >> 6);
        let raw = (u16::from(frame[0] & 0x3F) << 8) | u16::from(frame[1]);
        let millibar = match status {
            PressureStatus::Valid => counts_to_millibar(raw, cal),
            _ => f32::NAN,
        };
        Self { status, raw, millibar }
    }

    pub const fn no_reply() -> Self {
        Self {
            status: PressureStatus::NoReply,
            raw: 0,
            millibar: f32::NAN,
        }
    }
}

/// Two-point linear map from counts to bar, scaled to mbar.
pub fn counts_to_millibar(raw: u16, cal: &PressureCalibration) -> f32 {
    let span_counts = f32::from(cal.out_max) - f32::from(cal.out_min);
    if span_counts == 0.0 {
        return f32::NAN;
    }
    let bar = (f32::from(raw) - f32::from(cal.out_min)) * (cal.p_max_bar - cal.p_min_bar)
        / span_counts
        + cal.p_min_bar;
    bar * 1000.0
}

pub struct PressureSensor<SPI> {
    spi: SPI,
    cal: PressureCalibration,
}

impl<SPI: SpiDevice> PressureSensor<SPI> {
    pub fn new(spi: SPI, cal: PressureCalibration) -> Self {
        Self { spi, cal }
    }

    /// Clock out one 2-byte frame.
    pub fn read_frame(&mut self) -> Result<[u8; 2], SensorError> {
        let mut frame = [0u8; 2];
        self.spi
            .read(&mut frame)
            .map_err(|_| SensorError::SpiTransferFailed)?;
        Ok(frame)
    }

    pub fn read(&mut self) -> PressureReading {
        match self.read_frame() {
            Ok(frame) => PressureReading::decode(frame, &self.cal),
            Err(e) => {
                debug!("pressure: {}", e);
                PressureReading::no_reply()
            }
        }
    }
}
