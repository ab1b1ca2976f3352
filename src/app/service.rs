//! Application service: the bridge core.
//!
//! [`AppService`] owns the device state, the host line assembler and the
//! telemetry schedule.  It exposes a hardware-agnostic API; all I/O flows
//! through port traits injected at call sites, so the whole loop runs
//! against mock adapters in host tests.
//!
//! ```text
//!  host Transport ──▶ ┌──────────────────────────┐ ──▶ host Transport
//!      (lines)        │        AppService        │     (replies, rows)
//!   SensorPort ──────▶│ LineBuffer · DeviceState │◀──▶ ParameterClient
//! ActuatorPort ◀──────│ EmitSchedule             │
//!                     └──────────────────────────┘
//! ```

use core::fmt::{self, Write};

use log::{debug, info, warn};

use crate::app::commands::{float_argument, integer_argument, Command, Verb};
use crate::app::line::{LineBuffer, HOST_LINE_CAPACITY};
use crate::app::ports::{ActuatorPort, Clock, ParameterClient, SensorPort};
use crate::app::state::DeviceState;
use crate::config::SystemConfig;
use crate::error::Error;
use crate::params;
use crate::telemetry::{self, EmitSchedule, Row};
use crate::transport::Transport;

/// Capacity of one reply line (without terminator).
pub const REPLY_CAPACITY: usize = 512;

/// One reply line, always prefixed `OK ` or `ERR `.
pub type Reply = heapless::String<REPLY_CAPACITY>;

/// Host bytes drained per read call.
const HOST_READ_CHUNK: usize = 64;

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService {
    config: SystemConfig,
    state: DeviceState,
    line: LineBuffer<HOST_LINE_CAPACITY>,
    schedule: EmitSchedule,
    /// Set by `GET` when `emit_on_get` is enabled; served on the same poll
    /// in place of any scheduled row.
    emit_requested: bool,
    rows_emitted: u64,
}

impl AppService {
    /// Construct the service.  Call [`start`](Self::start) before the
    /// first [`poll`](Self::poll).
    pub fn new(config: SystemConfig) -> Self {
        let schedule = EmitSchedule::new(config.telemetry_period_ms, 0);
        Self {
            config,
            state: DeviceState::new(),
            line: LineBuffer::new(),
            schedule,
            emit_requested: false,
            rows_emitted: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Stop the pump, print the CSV header and log the instrument identity.
    /// The first telemetry period starts now.
    pub fn start(
        &mut self,
        host: &mut impl Transport,
        hw: &mut impl ActuatorPort,
        client: &mut impl ParameterClient,
        clock: &impl Clock,
    ) {
        let stopped = self.state.pump.command(0);
        if let Err(e) = hw.apply_pump_speed(stopped) {
            warn!("start: could not stop pump: {}", e);
        }

        let mut header = Row::new();
        if telemetry::write_header(&mut header).is_ok() {
            let _ = send_line(host, &header);
        } else {
            warn!("start: telemetry header exceeds {} bytes", telemetry::ROW_CAPACITY);
        }

        match client.identify() {
            Ok(ident) => info!("instrument: {}", ident),
            Err(e) => warn!("instrument: identify failed: {}", e),
        }

        self.schedule = EmitSchedule::new(self.config.telemetry_period_ms, clock.now_ms());
        info!(
            "AppService started: {} fields every {} ms",
            telemetry::FIELD_COUNT,
            self.config.telemetry_period_ms
        );
    }

    // ── Main loop body ────────────────────────────────────────

    /// One loop iteration: dispatch every complete host line, then emit a
    /// telemetry row if one was requested or the period has elapsed.
    ///
    /// `hw` satisfies both [`SensorPort`] and [`ActuatorPort`] so commands
    /// and telemetry share one hardware adapter without a double borrow.
    pub fn poll(
        &mut self,
        host: &mut impl Transport,
        hw: &mut (impl SensorPort + ActuatorPort),
        client: &mut impl ParameterClient,
        clock: &impl Clock,
    ) {
        self.drain_host(host, hw, client);

        if self.emit_requested {
            self.emit_requested = false;
            self.emit_telemetry(host, hw, client);
            // The row consumed the tach delta; the next one covers a full period.
            self.schedule.restart(clock.now_ms());
        }

        if self.schedule.due(clock.now_ms()) {
            self.emit_telemetry(host, hw, client);
        }
    }

    fn drain_host(
        &mut self,
        host: &mut impl Transport,
        hw: &mut impl ActuatorPort,
        client: &mut impl ParameterClient,
    ) {
        let mut chunk = [0u8; HOST_READ_CHUNK];
        loop {
            let n = match host.read(&mut chunk) {
                Ok(0) => return,
                Ok(n) => n,
                Err(e) => {
                    warn!("host: read error {:?}", e);
                    return;
                }
            };
            for &byte in &chunk[..n] {
                let Some(line) = self.line.push(byte) else {
                    continue;
                };
                if let Some(reply) = self.handle_line(&line, hw, client) {
                    let _ = send_line(host, &reply);
                }
            }
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Parse and execute one host line.  Blank lines produce no reply.
    pub fn handle_line(
        &mut self,
        line: &str,
        hw: &mut impl ActuatorPort,
        client: &mut impl ParameterClient,
    ) -> Option<Reply> {
        let cmd = Command::parse(line)?;
        debug!("host: {:?} {:?}", cmd.verb, cmd.argument);
        Some(self.handle_command(&cmd, hw, client))
    }

    /// Execute one parsed command and build its reply.
    pub fn handle_command(
        &mut self,
        cmd: &Command<'_>,
        hw: &mut impl ActuatorPort,
        client: &mut impl ParameterClient,
    ) -> Reply {
        let verb = cmd.verb.name();
        match &cmd.verb {
            Verb::Ping => reply(format_args!("OK PONG")),

            Verb::Get => {
                self.emit_requested = self.config.emit_on_get;
                reply(format_args!("OK GET"))
            }

            Verb::Reset => {
                let p = params::RESET_TRIGGER;
                match client.write_long(p.id, p.instance, 1) {
                    Ok(()) => {
                        info!("instrument reset requested");
                        reply(format_args!("OK RESET"))
                    }
                    Err(e) => {
                        warn!("RESET failed: {}", e);
                        reply(format_args!("ERR RESET"))
                    }
                }
            }

            Verb::SetCurrent | Verb::SetTemperature => {
                let (p, decimals) = if cmd.verb == Verb::SetCurrent {
                    (params::CURRENT_SETPOINT, 3)
                } else {
                    (params::TEMPERATURE_SETPOINT, 2)
                };
                let value = match float_argument(cmd.argument) {
                    Ok(v) => v,
                    Err(e) => return reply(format_args!("ERR {} {}", verb, e.reason())),
                };
                match client.write_float(p.id, p.instance, value) {
                    Ok(()) => reply(format_args!("OK {} {:.*}", verb, decimals, value)),
                    Err(e) => {
                        warn!("{} {} failed: {}", verb, value, e);
                        reply(format_args!("ERR {}", verb))
                    }
                }
            }

            Verb::SetPower => {
                let requested = match integer_argument(cmd.argument) {
                    Ok(v) => v,
                    Err(e) => return reply(format_args!("ERR {} {}", verb, e.reason())),
                };
                let percent = self.state.pump.command(requested);
                if let Err(e) = hw.apply_pump_speed(percent) {
                    warn!("pump: {}", e);
                }
                reply(format_args!("OK {} {}", verb, percent))
            }

            Verb::Identify => match client.identify() {
                Ok(ident) => reply(format_args!("OK ID {}", ident)),
                Err(e) => {
                    warn!("ID failed: {}", e);
                    reply(format_args!("ERR ID"))
                }
            },

            Verb::Config => match serde_json::to_string(&self.config) {
                Ok(json) => reply(format_args!("OK CONFIG {}", json)),
                Err(_) => reply(format_args!("ERR CONFIG")),
            },

            Verb::Unknown(token) => reply(format_args!("ERR unknown_cmd {}", token)),
        }
    }

    // ── Telemetry ─────────────────────────────────────────────

    /// Collect a snapshot and print one CSV row.  Returns `false` if the
    /// row could not be formatted or written.
    pub fn emit_telemetry(
        &mut self,
        host: &mut impl Transport,
        sensors: &mut impl SensorPort,
        client: &mut impl ParameterClient,
    ) -> bool {
        let snapshot = telemetry::collect(sensors, client, &mut self.state);
        if !snapshot.environment.fresh {
            debug!("telemetry: environment values are cached");
        }

        let mut row = Row::new();
        if telemetry::write_row(&mut row, &snapshot).is_err() {
            warn!("telemetry: row exceeds {} bytes, dropped", telemetry::ROW_CAPACITY);
            return false;
        }
        if send_line(host, &row).is_err() {
            return false;
        }
        self.rows_emitted += 1;
        true
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Rows successfully written since startup.
    pub fn rows_emitted(&self) -> u64 {
        self.rows_emitted
    }
}

/// Format a reply, truncating at [`REPLY_CAPACITY`].
fn reply(args: fmt::Arguments<'_>) -> Reply {
    let mut out = Truncating(Reply::new());
    // Truncating never reports an error.
    let _ = out.write_fmt(args);
    out.0
}

/// `fmt::Write` adapter that drops whatever does not fit.
struct Truncating(Reply);

impl Write for Truncating {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

/// Write `text` plus `'\n'` to the host.  Failures are logged here;
/// callers only decide whether the line counts as delivered.
fn send_line(host: &mut impl Transport, text: &str) -> crate::error::Result<()> {
    let result = host
        .write_all(text.as_bytes())
        .and_then(|ok| if ok { host.write_all(b"\n") } else { Ok(false) });
    match result {
        Ok(true) => Ok(()),
        Ok(false) => {
            warn!("host: link stalled, line dropped");
            Err(Error::HostLink)
        }
        Err(e) => {
            warn!("host: write error {:?}", e);
            Err(Error::HostLink)
        }
    }
}
