//! Instrument parameter map.
//!
//! Single source of truth for every parameter id/instance the firmware
//! touches, in the same spirit as [`pins`](crate::pins).  The telemetry
//! schema and the command dispatcher reference these constants only.

/// One addressable value on the instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamId {
    pub id: u16,
    pub instance: u8,
}

const fn p(id: u16) -> ParamId {
    ParamId { id, instance: 1 }
}

// ---------------------------------------------------------------------------
// Error report
// ---------------------------------------------------------------------------

pub const ERROR_NUMBER: ParamId = p(105);
pub const ERROR_INSTANCE: ParamId = p(106);
pub const ERROR_PARAMETER: ParamId = p(107);

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Writing 1 restarts the instrument.
pub const RESET_TRIGGER: ParamId = p(108);
/// Laser-driver current setpoint (A).
pub const CURRENT_SETPOINT: ParamId = p(2000);
/// Thermal object temperature setpoint (°C).
pub const TEMPERATURE_SETPOINT: ParamId = p(3000);

// ---------------------------------------------------------------------------
// Laser driver
// ---------------------------------------------------------------------------

pub const LASER_CURRENT: ParamId = p(1100);
pub const LASER_VOLTAGE: ParamId = p(1101);
pub const LASER_CURRENT_RAW: ParamId = p(1102);
pub const LASER_AUX_VOLTAGE_1: ParamId = p(1103);
pub const LASER_AUX_VOLTAGE_2: ParamId = p(1104);
pub const LASER_CURRENT_RAMP: ParamId = p(1105);

// ---------------------------------------------------------------------------
// Thermal control
// ---------------------------------------------------------------------------

pub const OBJECT_TEMPERATURE: ParamId = p(1000);
pub const SINK_TEMPERATURE: ParamId = p(1001);
pub const TARGET_TEMPERATURE: ParamId = p(1010);
pub const RAMP_TEMPERATURE: ParamId = p(1011);
pub const MODEL_CURRENT: ParamId = p(1012);
pub const ACTUAL_CURRENT: ParamId = p(1020);
pub const ACTUAL_VOLTAGE: ParamId = p(1021);

// ---------------------------------------------------------------------------
// Auxiliary analog input and optical output
// ---------------------------------------------------------------------------

pub const ANALOG_INPUT_RAW: ParamId = p(1200);
pub const ANALOG_INPUT_SCALED: ParamId = p(1201);
pub const OPTICAL_POWER: ParamId = p(1300);
pub const PHOTODIODE_CURRENT: ParamId = p(1301);

// ---------------------------------------------------------------------------
// Supplies and internal temperatures
// ---------------------------------------------------------------------------

pub const INPUT_SUPPLY: ParamId = p(1060);
pub const MEDIUM_SUPPLY: ParamId = p(1061);
pub const SUPPLY_3V3: ParamId = p(1062);
pub const BASE_TEMPERATURE: ParamId = p(1063);
pub const DEVICE_TEMPERATURE: ParamId = p(1064);
