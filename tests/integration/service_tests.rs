//! Integration tests for the full AppService loop.
//!
//! Drives `start` + `poll` with a fake clock and checks what reaches the
//! host link: header first, rows on schedule, replies interleaved in
//! arrival order.

use crate::mock_hw::{FakeClock, MockHardware, MockHost, MockInstrument};

use tecbridge::app::service::AppService;
use tecbridge::config::SystemConfig;
use tecbridge::error::SensorError;
use tecbridge::telemetry::{FIELD_COUNT, INSTRUMENT_CHANNELS, ValueKind};

struct Rig {
    app: AppService,
    host: MockHost,
    hw: MockHardware,
    client: MockInstrument,
    clock: FakeClock,
}

impl Rig {
    fn new(config: SystemConfig, client: MockInstrument) -> Self {
        let mut rig = Self {
            app: AppService::new(config),
            host: MockHost::new(),
            hw: MockHardware::new(),
            client,
            clock: FakeClock::new(),
        };
        rig.app
            .start(&mut rig.host, &mut rig.hw, &mut rig.client, &rig.clock);
        rig
    }

    fn poll(&mut self) {
        self.app
            .poll(&mut self.host, &mut self.hw, &mut self.client, &self.clock);
    }

    /// Advance one full period and poll.
    fn tick(&mut self) {
        self.clock.advance(u64::from(self.app.config().telemetry_period_ms));
        self.poll();
    }
}

fn default_rig() -> Rig {
    Rig::new(SystemConfig::default(), MockInstrument::populated())
}

fn fields(line: &str) -> Vec<&str> {
    line.split(',').collect()
}

fn is_header(line: &str) -> bool {
    line.starts_with("err_num,")
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn start_stops_pump_and_prints_header_only() {
    let mut rig = default_rig();
    assert_eq!(rig.hw.pump_calls, [0]);

    let lines = rig.host.take_lines();
    assert_eq!(lines.len(), 1);
    assert!(is_header(&lines[0]));
    assert_eq!(fields(&lines[0]).len(), FIELD_COUNT);
}

#[test]
fn header_is_never_repeated() {
    let mut rig = default_rig();
    for _ in 0..5 {
        rig.tick();
    }
    let lines = rig.host.take_lines();
    assert_eq!(lines.len(), 6);
    assert!(is_header(&lines[0]));
    assert_eq!(lines.iter().filter(|l| is_header(l)).count(), 1);
}

// ── Schedule ──────────────────────────────────────────────────

#[test]
fn no_row_before_the_period_elapses() {
    let mut rig = default_rig();
    rig.host.take_lines();

    rig.clock.advance(999);
    rig.poll();
    assert!(rig.host.take_lines().is_empty());

    rig.clock.advance(1);
    rig.poll();
    assert_eq!(rig.host.take_lines().len(), 1);
    assert_eq!(rig.app.rows_emitted(), 1);
}

#[test]
fn one_row_per_period_however_often_polled() {
    let mut rig = default_rig();
    rig.host.take_lines();

    for _ in 0..3000 {
        rig.clock.advance(1);
        rig.poll();
    }
    assert_eq!(rig.host.take_lines().len(), 3);
    assert_eq!(rig.app.rows_emitted(), 3);
}

// ── Row content ───────────────────────────────────────────────

#[test]
fn offline_instrument_still_yields_full_rows() {
    let mut rig = Rig::new(SystemConfig::default(), MockInstrument::offline());
    rig.host.take_lines();
    rig.tick();

    let lines = rig.host.take_lines();
    let row = fields(&lines[0]);
    assert_eq!(row.len(), FIELD_COUNT);
    assert_eq!(&row[..4], ["-1", "-1", "-1", "unknown"]);
    for (value, channel) in row[4..].iter().zip(INSTRUMENT_CHANNELS.iter()) {
        let sentinel = match channel.kind {
            ValueKind::Float => "nan",
            ValueKind::Long => "-1",
        };
        assert_eq!(*value, sentinel, "{}", channel.name);
    }
}

#[test]
fn healthy_instrument_reports_no_error() {
    let mut rig = default_rig();
    rig.host.take_lines();
    rig.tick();

    let lines = rig.host.take_lines();
    let row = fields(&lines[0]);
    assert_eq!(&row[..4], ["0", "0", "0", "none"]);
    assert_eq!(row[4], "1.500");
    assert_eq!(row[6], "42");
}

#[test]
fn instrument_fault_is_labelled() {
    let mut client = MockInstrument::populated();
    let p = tecbridge::params::ERROR_NUMBER;
    client.longs.insert((p.id, p.instance), 17);
    let mut rig = Rig::new(SystemConfig::default(), client);
    rig.host.take_lines();
    rig.tick();

    let lines = rig.host.take_lines();
    let row = fields(&lines[0]);
    assert_eq!(row[0], "17");
    assert_eq!(row[3], "fault");
}

#[test]
fn rpm_comes_from_pulses_in_the_period() {
    let mut rig = default_rig();
    rig.host.take_lines();

    // Two pulses per revolution, 1 s period: 4 pulses = 120 rpm.
    rig.hw.pulse(4);
    rig.tick();
    rig.tick();

    let lines = rig.host.take_lines();
    assert_eq!(fields(&lines[0])[FIELD_COUNT - 6], "120.0");
    assert_eq!(fields(&lines[1])[FIELD_COUNT - 6], "0.0");
}

#[test]
fn spi_failure_prints_nan_and_status_minus_one() {
    let mut rig = default_rig();
    rig.host.take_lines();
    rig.hw.pressure_frame = None;
    rig.tick();

    let lines = rig.host.take_lines();
    let row = fields(&lines[0]);
    assert_eq!(row[FIELD_COUNT - 5], "nan");
    assert_eq!(row[FIELD_COUNT - 1], "-1");
}

#[test]
fn environment_failure_repeats_last_good_values() {
    let mut rig = default_rig();
    rig.host.take_lines();

    rig.tick();
    rig.hw.environment = Err(SensorError::I2cTransactionFailed);
    rig.tick();

    let lines = rig.host.take_lines();
    let first = fields(&lines[0]);
    let second = fields(&lines[1]);
    assert_eq!(&first[FIELD_COUNT - 4..FIELD_COUNT - 2], ["22.50", "45.0"]);
    assert_eq!(&second[FIELD_COUNT - 4..FIELD_COUNT - 2], ["22.50", "45.0"]);
    assert_eq!(rig.app.state().environment.consecutive_failures(), 1);
}

#[test]
fn environment_never_read_prints_nan() {
    let mut rig = default_rig();
    rig.host.take_lines();
    rig.hw.environment = Err(SensorError::I2cTransactionFailed);
    rig.tick();

    let lines = rig.host.take_lines();
    let row = fields(&lines[0]);
    assert_eq!(&row[FIELD_COUNT - 4..FIELD_COUNT - 2], ["nan", "nan"]);
}

#[test]
fn pump_column_tracks_last_command() {
    let mut rig = default_rig();
    rig.host.feed("SETPWR 55\n");
    rig.tick();

    let lines = rig.host.take_lines();
    assert_eq!(lines[1], "OK SETPWR 55");
    assert_eq!(fields(&lines[2])[FIELD_COUNT - 2], "55");
}

// ── Host commands through the loop ────────────────────────────

#[test]
fn replies_arrive_in_command_order() {
    let mut rig = default_rig();
    rig.host.take_lines();
    rig.host.feed("PING\r\nSETPWR 150\r\nFOO\r\n");
    rig.poll();

    assert_eq!(
        rig.host.take_lines(),
        ["OK PONG", "OK SETPWR 100", "ERR unknown_cmd FOO"]
    );
    assert_eq!(rig.hw.pump_calls, [0, 100]);
}

#[test]
fn command_split_across_reads_is_reassembled() {
    let mut rig = default_rig();
    rig.host.take_lines();
    rig.host.read_chunk = 1;

    rig.host.feed("SET");
    rig.poll();
    assert!(rig.host.take_lines().is_empty());

    rig.host.feed("PWR 5");
    rig.poll();
    assert!(rig.host.take_lines().is_empty());

    rig.host.feed("5\n");
    rig.poll();
    assert_eq!(rig.host.take_lines(), ["OK SETPWR 55"]);
}

#[test]
fn get_emits_a_row_immediately_when_enabled() {
    let config = SystemConfig {
        emit_on_get: true,
        ..SystemConfig::default()
    };
    let mut rig = Rig::new(config, MockInstrument::populated());
    rig.host.take_lines();

    rig.host.feed("GET\n");
    rig.poll();

    let lines = rig.host.take_lines();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "OK GET");
    assert_eq!(fields(&lines[1]).len(), FIELD_COUNT);
}

#[test]
fn get_on_a_due_tick_prints_one_row_and_restarts_the_period() {
    let config = SystemConfig {
        emit_on_get: true,
        ..SystemConfig::default()
    };
    let mut rig = Rig::new(config, MockInstrument::populated());
    rig.host.take_lines();

    rig.host.feed("GET\n");
    rig.tick();
    let lines = rig.host.take_lines();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "OK GET");
    assert_eq!(rig.app.rows_emitted(), 1);

    rig.hw.pulse(4);
    rig.clock.advance(999);
    rig.poll();
    assert!(rig.host.take_lines().is_empty());

    rig.clock.advance(1);
    rig.poll();
    let lines = rig.host.take_lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(fields(&lines[0])[FIELD_COUNT - 6], "120.0");
}

#[test]
fn get_only_acknowledges_by_default() {
    let mut rig = default_rig();
    rig.host.take_lines();

    rig.host.feed("GET\n");
    rig.poll();
    assert_eq!(rig.host.take_lines(), ["OK GET"]);
    assert_eq!(rig.app.rows_emitted(), 0);
}

#[test]
fn pump_failure_does_not_stop_the_loop() {
    let mut rig = default_rig();
    rig.host.take_lines();
    rig.hw.fail_pump = true;

    rig.host.feed("SETPWR 30\n");
    rig.tick();

    let lines = rig.host.take_lines();
    assert_eq!(lines[0], "OK SETPWR 30");
    assert_eq!(lines.len(), 2);
    assert_eq!(rig.app.state().pump.speed_percent(), 30);
}
