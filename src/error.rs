//! Unified error types for the TecBridge firmware.
//!
//! Every subsystem reports through a small `Copy` enum so errors can be
//! passed through the telemetry path and the dispatcher without allocation.
//! None of these are fatal at runtime: the main loop degrades the affected
//! field or reply and keeps going.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A local sensor (SPI / I2C) could not be read.
    Sensor(SensorError),
    /// An actuator command failed.
    Actuator(ActuatorError),
    /// The half-duplex instrument bus failed.
    Bus(BusError),
    /// The instrument rejected or never answered a parameter request.
    Parameter(ParameterError),
    /// The host link could not be written.
    HostLink,
    /// Configuration failed validation.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::Parameter(e) => write!(f, "parameter: {e}"),
            Self::HostLink => write!(f, "host link write failed"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// SPI transfer returned an error.
    SpiTransferFailed,
    /// I2C transaction returned an error (NAK, arbitration loss, short read).
    I2cTransactionFailed,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpiTransferFailed => write!(f, "SPI transfer failed"),
            Self::I2cTransactionFailed => write!(f, "I2C transaction failed"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// PWM duty-cycle write failed.
    PwmWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PwmWriteFailed => write!(f, "PWM write failed"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Instrument bus errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// The RS-485 direction pin could not be driven.
    Direction,
    /// The UART refused the frame or wrote it partially.
    Write,
    /// The UART could not drain its transmit FIFO.
    Flush,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direction => write!(f, "direction pin write failed"),
            Self::Write => write!(f, "UART write failed"),
            Self::Flush => write!(f, "UART flush failed"),
        }
    }
}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

// ---------------------------------------------------------------------------
// Parameter client errors
// ---------------------------------------------------------------------------

/// Why a parameter request produced no usable value.
///
/// Callers treat every variant the same way ("unavailable this cycle");
/// the distinction only feeds the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterError {
    /// The request could not be put on the bus.
    Bus(BusError),
    /// Nothing came back before the receive timeout.
    NoReply,
    /// The reply was not a well-formed response frame.
    Malformed,
    /// The reply checksum did not match its contents.
    Checksum,
    /// The reply belonged to a different request (sequence or address).
    Mismatch,
    /// The instrument answered with an error code.
    Device(u8),
}

impl ParameterError {
    /// Human-readable name of an instrument error code.
    pub const fn device_code_name(code: u8) -> &'static str {
        match code {
            1 => "command not available",
            2 => "device busy",
            3 => "general communication error",
            4 => "format error",
            5 => "parameter not available",
            6 => "parameter not writable",
            7 => "parameter out of range",
            8 => "instance not available",
            _ => "unknown device error",
        }
    }
}

impl fmt::Display for ParameterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "{e}"),
            Self::NoReply => write!(f, "no reply"),
            Self::Malformed => write!(f, "malformed reply"),
            Self::Checksum => write!(f, "reply checksum mismatch"),
            Self::Mismatch => write!(f, "reply for another request"),
            Self::Device(code) => {
                write!(f, "device error {code} ({})", Self::device_code_name(*code))
            }
        }
    }
}

impl From<BusError> for ParameterError {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

impl From<ParameterError> for Error {
    fn from(e: ParameterError) -> Self {
        Self::Parameter(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
