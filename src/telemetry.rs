//! Periodic CSV telemetry.
//!
//! One row per period, fixed schema:
//!
//! ```text
//! err_num,err_inst,err_param,err_text, <instrument channels...>, pump_rpm,pressure_mb,temp_c,humidity_pct,pump_pct,pressure_status
//! ```
//!
//! The header and every row are generated from the same tables
//! ([`INSTRUMENT_CHANNELS`], [`LOCAL_FIELDS`]), so the field count can
//! never drift between them.  A failed instrument read prints its sentinel
//! (`nan` for floats, `-1` for longs); a failed local read prints `nan`.

use core::fmt::{self, Write};

use log::debug;

use crate::app::ports::{ParameterClient, SensorPort};
use crate::app::state::DeviceState;
use crate::params::{self, ParamId};
use crate::sensors::environment::EnvReading;
use crate::sensors::pressure::PressureReading;
use crate::sensors::tachometer::TachReading;

/// Capacity of one formatted row (header or data).
pub const ROW_CAPACITY: usize = 1024;

pub type Row = heapless::String<ROW_CAPACITY>;

// ───────────────────────────────────────────────────────────────
// Schema
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Float,
    Long,
}

/// One instrument column.
#[derive(Debug, Clone, Copy)]
pub struct ChannelSpec {
    pub name: &'static str,
    pub param: ParamId,
    pub kind: ValueKind,
    /// Digits after the decimal point (floats only).
    pub decimals: usize,
}

const fn float(name: &'static str, param: ParamId, decimals: usize) -> ChannelSpec {
    ChannelSpec {
        name,
        param,
        kind: ValueKind::Float,
        decimals,
    }
}

const fn long(name: &'static str, param: ParamId) -> ChannelSpec {
    ChannelSpec {
        name,
        param,
        kind: ValueKind::Long,
        decimals: 0,
    }
}

pub const ERROR_FIELDS: [&str; 4] = ["err_num", "err_inst", "err_param", "err_text"];

/// Instrument channels, read in this order every tick.
pub const INSTRUMENT_CHANNELS: [ChannelSpec; 22] = [
    float("ldd_current_a", params::LASER_CURRENT, 3),
    float("ldd_voltage_v", params::LASER_VOLTAGE, 3),
    long("ldd_current_raw", params::LASER_CURRENT_RAW),
    float("ldd_aux1_v", params::LASER_AUX_VOLTAGE_1, 3),
    float("ldd_aux2_v", params::LASER_AUX_VOLTAGE_2, 3),
    float("ldd_ramp_a", params::LASER_CURRENT_RAMP, 3),
    float("tec_target_c", params::TARGET_TEMPERATURE, 2),
    float("tec_ramp_c", params::RAMP_TEMPERATURE, 2),
    float("tec_model_current_a", params::MODEL_CURRENT, 3),
    float("tec_current_a", params::ACTUAL_CURRENT, 3),
    float("tec_voltage_v", params::ACTUAL_VOLTAGE, 3),
    float("tec_object_c", params::OBJECT_TEMPERATURE, 3),
    float("tec_sink_c", params::SINK_TEMPERATURE, 2),
    long("ain_raw", params::ANALOG_INPUT_RAW),
    float("ain_scaled", params::ANALOG_INPUT_SCALED, 4),
    float("optical_power_mw", params::OPTICAL_POWER, 3),
    float("pd_current_ma", params::PHOTODIODE_CURRENT, 6),
    float("v_input", params::INPUT_SUPPLY, 2),
    float("v_medium", params::MEDIUM_SUPPLY, 2),
    float("v_3v3", params::SUPPLY_3V3, 3),
    float("base_temp_c", params::BASE_TEMPERATURE, 1),
    float("device_temp_c", params::DEVICE_TEMPERATURE, 1),
];

pub const LOCAL_FIELDS: [&str; 6] = [
    "pump_rpm",
    "pressure_mb",
    "temp_c",
    "humidity_pct",
    "pump_pct",
    "pressure_status",
];

/// Fields per header and per row.
pub const FIELD_COUNT: usize = ERROR_FIELDS.len() + INSTRUMENT_CHANNELS.len() + LOCAL_FIELDS.len();

// ───────────────────────────────────────────────────────────────
// Snapshot
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterValue {
    Float(f32),
    Long(i32),
}

/// Result of one instrument query.  `ok == false` means `value` holds the
/// sentinel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterReading {
    pub id: u16,
    pub instance: u8,
    pub value: ParameterValue,
    pub ok: bool,
}

impl ParameterReading {
    pub const FLOAT_SENTINEL: f32 = f32::NAN;
    pub const LONG_SENTINEL: i32 = -1;

    /// Query `param` as `kind`, substituting the sentinel on failure.
    pub fn query(client: &mut impl ParameterClient, param: ParamId, kind: ValueKind) -> Self {
        let (value, ok) = match kind {
            ValueKind::Float => match client.read_float(param.id, param.instance) {
                Ok(v) => (ParameterValue::Float(v), true),
                Err(_) => (ParameterValue::Float(Self::FLOAT_SENTINEL), false),
            },
            ValueKind::Long => match client.read_long(param.id, param.instance) {
                Ok(v) => (ParameterValue::Long(v), true),
                Err(_) => (ParameterValue::Long(Self::LONG_SENTINEL), false),
            },
        };
        Self {
            id: param.id,
            instance: param.instance,
            value,
            ok,
        }
    }

    fn as_long(&self) -> i32 {
        match self.value {
            ParameterValue::Long(v) => v,
            ParameterValue::Float(v) if v.is_finite() => v as i32,
            ParameterValue::Float(_) => Self::LONG_SENTINEL,
        }
    }
}

/// Everything printed in one row.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySnapshot {
    pub error_number: ParameterReading,
    pub error_instance: ParameterReading,
    pub error_parameter: ParameterReading,
    pub channels: [ParameterReading; INSTRUMENT_CHANNELS.len()],
    pub tachometer: TachReading,
    pub pressure: PressureReading,
    pub environment: EnvReading,
    pub pump_percent: u8,
}

impl TelemetrySnapshot {
    /// Text for the `err_text` column.
    pub fn error_text(&self) -> &'static str {
        error_text(self.error_number.ok.then(|| self.error_number.as_long()))
    }
}

/// `none` for 0, `fault` for a positive error number, `unknown` when the
/// number is unavailable or negative.
pub fn error_text(error_number: Option<i32>) -> &'static str {
    match error_number {
        Some(0) => "none",
        Some(n) if n > 0 => "fault",
        _ => "unknown",
    }
}

/// Poll every source in the fixed order: tachometer, pressure,
/// environment, error triple, instrument channels.
pub fn collect(
    sensors: &mut impl SensorPort,
    client: &mut impl ParameterClient,
    state: &mut DeviceState,
) -> TelemetrySnapshot {
    let tachometer = sensors.read_tachometer();
    let pressure = sensors.read_pressure();
    let environment = state.environment.update(sensors.sample_environment());

    let error_number = ParameterReading::query(client, params::ERROR_NUMBER, ValueKind::Long);
    let error_instance = ParameterReading::query(client, params::ERROR_INSTANCE, ValueKind::Long);
    let error_parameter =
        ParameterReading::query(client, params::ERROR_PARAMETER, ValueKind::Long);

    let channels = INSTRUMENT_CHANNELS.map(|ch| ParameterReading::query(client, ch.param, ch.kind));
    let failed = channels.iter().filter(|r| !r.ok).count();
    if failed > 0 {
        debug!(
            "telemetry: {}/{} instrument reads unavailable",
            failed,
            channels.len()
        );
    }

    TelemetrySnapshot {
        error_number,
        error_instance,
        error_parameter,
        channels,
        tachometer,
        pressure,
        environment,
        pump_percent: state.pump.speed_percent(),
    }
}

// ───────────────────────────────────────────────────────────────
// Formatting
// ───────────────────────────────────────────────────────────────

/// Write the header (no line terminator).
pub fn write_header(out: &mut impl Write) -> fmt::Result {
    let names = ERROR_FIELDS
        .iter()
        .copied()
        .chain(INSTRUMENT_CHANNELS.iter().map(|ch| ch.name))
        .chain(LOCAL_FIELDS.iter().copied());
    for (i, name) in names.enumerate() {
        if i > 0 {
            out.write_char(',')?;
        }
        out.write_str(name)?;
    }
    Ok(())
}

/// Write one data row (no line terminator).
pub fn write_row(out: &mut impl Write, snap: &TelemetrySnapshot) -> fmt::Result {
    write_reading(out, &snap.error_number, 0)?;
    out.write_char(',')?;
    write_reading(out, &snap.error_instance, 0)?;
    out.write_char(',')?;
    write_reading(out, &snap.error_parameter, 0)?;
    out.write_char(',')?;
    out.write_str(snap.error_text())?;

    for (reading, channel) in snap.channels.iter().zip(INSTRUMENT_CHANNELS.iter()) {
        out.write_char(',')?;
        write_reading(out, reading, channel.decimals)?;
    }

    out.write_char(',')?;
    write_float(out, snap.tachometer.rpm, 1)?;
    out.write_char(',')?;
    write_float(out, snap.pressure.millibar, 2)?;
    out.write_char(',')?;
    write_float(out, snap.environment.temperature_c, 2)?;
    out.write_char(',')?;
    write_float(out, snap.environment.humidity_pct, 1)?;
    write!(
        out,
        ",{},{}",
        snap.pump_percent,
        snap.pressure.status.code()
    )
}

fn write_reading(out: &mut impl Write, reading: &ParameterReading, decimals: usize) -> fmt::Result {
    match reading.value {
        ParameterValue::Long(v) => write!(out, "{}", v),
        ParameterValue::Float(v) => write_float(out, v, decimals),
    }
}

/// Fixed-precision float; NaN prints as `nan`.
pub fn write_float(out: &mut impl Write, value: f32, decimals: usize) -> fmt::Result {
    if value.is_nan() {
        out.write_str("nan")
    } else {
        write!(out, "{:.*}", decimals, value)
    }
}

// ───────────────────────────────────────────────────────────────
// Schedule
// ───────────────────────────────────────────────────────────────

/// Fires once every `period_ms`, measured from the previous firing.
#[derive(Debug, Clone, Copy)]
pub struct EmitSchedule {
    period_ms: u64,
    last_emit_ms: u64,
}

impl EmitSchedule {
    pub fn new(period_ms: u32, now_ms: u64) -> Self {
        Self {
            period_ms: u64::from(period_ms),
            last_emit_ms: now_ms,
        }
    }

    /// `true` when the period has elapsed; the next period starts at `now_ms`.
    pub fn due(&mut self, now_ms: u64) -> bool {
        if now_ms.saturating_sub(self.last_emit_ms) >= self.period_ms {
            self.last_emit_ms = now_ms;
            true
        } else {
            false
        }
    }

    /// Start a fresh period at `now_ms` (after an out-of-schedule row).
    pub fn restart(&mut self, now_ms: u64) {
        self.last_emit_ms = now_ms;
    }
}
