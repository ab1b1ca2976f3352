//! Integration tests for host command dispatch.
//!
//! Each test feeds one line through `AppService::handle_line` and checks
//! the reply text plus the side effects recorded by the mocks.

use crate::mock_hw::{MockHardware, MockInstrument, ParamWrite};

use tecbridge::app::service::AppService;
use tecbridge::config::SystemConfig;
use tecbridge::params;

fn run(line: &str) -> (Option<String>, MockHardware, MockInstrument) {
    let mut app = AppService::new(SystemConfig::default());
    let mut hw = MockHardware::new();
    let mut client = MockInstrument::populated();
    let reply = app
        .handle_line(line, &mut hw, &mut client)
        .map(|r| r.as_str().to_owned());
    (reply, hw, client)
}

fn reply(line: &str) -> String {
    run(line).0.expect("non-blank line must be answered")
}

// ── PING / unknown / blank ────────────────────────────────────

#[test]
fn ping_is_case_insensitive() {
    assert_eq!(reply("PING"), "OK PONG");
    assert_eq!(reply("ping"), "OK PONG");
    assert_eq!(reply("  PiNg  "), "OK PONG");
}

#[test]
fn unknown_verb_echoes_upper_cased_token() {
    assert_eq!(reply("hello world"), "ERR unknown_cmd HELLO");
}

#[test]
fn overlong_verb_is_truncated_in_the_reply() {
    let r = reply("ABCDEFGHIJKLMNOPQRSTUVWXYZ");
    assert_eq!(r, "ERR unknown_cmd ABCDEFGHIJKLMNOP");
}

#[test]
fn blank_line_is_ignored() {
    let (r, hw, client) = run("\t  ");
    assert_eq!(r, None);
    assert!(hw.pump_calls.is_empty());
    assert!(client.writes.is_empty());
}

// ── SETPWR ────────────────────────────────────────────────────

#[test]
fn setpwr_clamps_into_range() {
    for (input, expected) in [("-5", 0u8), ("150", 100), ("55", 55), ("0", 0), ("100", 100)] {
        let (r, hw, _) = run(&format!("SETPWR {}", input));
        assert_eq!(r.as_deref(), Some(format!("OK SETPWR {}", expected).as_str()));
        assert_eq!(hw.pump_calls, [expected]);
    }
}

#[test]
fn setpower_alias_and_decimal_argument() {
    let (r, hw, _) = run("SetPower 42.9");
    assert_eq!(r.as_deref(), Some("OK SETPWR 42"));
    assert_eq!(hw.pump_calls, [42]);
}

#[test]
fn setpwr_without_value_leaves_pump_alone() {
    let (r, hw, _) = run("SETPWR");
    assert_eq!(r.as_deref(), Some("ERR SETPWR missing_value"));
    assert!(hw.pump_calls.is_empty());
}

#[test]
fn setpwr_with_garbage_is_rejected() {
    let (r, hw, _) = run("SETPWR fast");
    assert_eq!(r.as_deref(), Some("ERR SETPWR bad_value"));
    assert!(hw.pump_calls.is_empty());
}

#[test]
fn pump_state_survives_between_commands() {
    let mut app = AppService::new(SystemConfig::default());
    let mut hw = MockHardware::new();
    let mut client = MockInstrument::populated();
    app.handle_line("SETPWR 70", &mut hw, &mut client);
    app.handle_line("SETPWR nope", &mut hw, &mut client);
    assert_eq!(app.state().pump.speed_percent(), 70);
}

// ── SETC / SETT ───────────────────────────────────────────────

#[test]
fn setc_writes_current_setpoint() {
    let (r, _, client) = run("SETC 1.25");
    assert_eq!(r.as_deref(), Some("OK SETC 1.250"));
    let p = params::CURRENT_SETPOINT;
    assert_eq!(
        client.writes,
        [ParamWrite::Float {
            id: p.id,
            instance: p.instance,
            value: 1.25
        }]
    );
}

#[test]
fn sett_writes_temperature_setpoint() {
    let (r, _, client) = run("sett -10.5");
    assert_eq!(r.as_deref(), Some("OK SETT -10.50"));
    let p = params::TEMPERATURE_SETPOINT;
    assert_eq!(
        client.writes,
        [ParamWrite::Float {
            id: p.id,
            instance: p.instance,
            value: -10.5
        }]
    );
}

#[test]
fn setpoint_without_value_never_reaches_the_bus() {
    for verb in ["SETC", "SETT"] {
        let (r, _, client) = run(verb);
        assert_eq!(r, Some(format!("ERR {} missing_value", verb)));
        assert!(client.writes.is_empty());
    }
}

#[test]
fn setpoint_rejects_non_numbers() {
    for arg in ["abc", "nan", "inf"] {
        let (r, _, client) = run(&format!("SETC {}", arg));
        assert_eq!(r.as_deref(), Some("ERR SETC bad_value"), "{}", arg);
        assert!(client.writes.is_empty());
    }
}

#[test]
fn rejected_setpoint_write_is_reported() {
    let mut app = AppService::new(SystemConfig::default());
    let mut client = MockInstrument::populated();
    client.reject_writes = true;
    let r = app.handle_line("SETT 25", &mut MockHardware::new(), &mut client);
    assert_eq!(r.as_deref(), Some("ERR SETT"));
    assert_eq!(client.writes.len(), 1);
}

// ── RESET / GET / ID / CONFIG ─────────────────────────────────

#[test]
fn reset_triggers_device_reset() {
    let (r, _, client) = run("RESET");
    assert_eq!(r.as_deref(), Some("OK RESET"));
    let p = params::RESET_TRIGGER;
    assert_eq!(
        client.writes,
        [ParamWrite::Long {
            id: p.id,
            instance: p.instance,
            value: 1
        }]
    );
}

#[test]
fn reset_against_silent_instrument_fails() {
    let mut app = AppService::new(SystemConfig::default());
    let r = app.handle_line("RESET", &mut MockHardware::new(), &mut MockInstrument::offline());
    assert_eq!(r.as_deref(), Some("ERR RESET"));
}

#[test]
fn get_has_no_side_effects() {
    let (r, hw, client) = run("GET");
    assert_eq!(r.as_deref(), Some("OK GET"));
    assert!(hw.pump_calls.is_empty());
    assert!(client.writes.is_empty());
    assert!(client.reads.is_empty());
}

#[test]
fn id_reports_instrument_text() {
    assert_eq!(reply("ID"), "OK ID TEC-1092 mock");

    let mut app = AppService::new(SystemConfig::default());
    let r = app.handle_line("ID", &mut MockHardware::new(), &mut MockInstrument::offline());
    assert_eq!(r.as_deref(), Some("ERR ID"));
}

#[test]
fn config_dumps_live_values() {
    let config = SystemConfig {
        telemetry_period_ms: 250,
        emit_on_get: true,
        ..SystemConfig::default()
    };
    let mut app = AppService::new(config);
    let r = app
        .handle_line("CONFIG", &mut MockHardware::new(), &mut MockInstrument::new())
        .expect("reply");
    let json = r.strip_prefix("OK CONFIG ").expect("OK prefix");
    let parsed: SystemConfig = serde_json::from_str(json).expect("valid JSON");
    assert_eq!(parsed.telemetry_period_ms, 250);
    assert!(parsed.emit_on_get);
}
