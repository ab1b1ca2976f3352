//! End-to-end tests: `MeComClient` → `HalfDuplexBus` → emulated instrument.
//!
//! The emulator sits behind the UART `Transport`.  When the bus flushes a
//! request it decodes the frame, applies it to a parameter table and queues
//! the reply bytes, so the client's encoder, the bus adapter and the reply
//! parser are all exercised together.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, OutputPin};

use crate::mock_hw::{FakeClock, MockHardware};

use tecbridge::app::ports::ParameterClient;
use tecbridge::app::service::AppService;
use tecbridge::config::SystemConfig;
use tecbridge::drivers::rs485::HalfDuplexBus;
use tecbridge::error::ParameterError;
use tecbridge::mecom::frame::crc16;
use tecbridge::mecom::MeComClient;
use tecbridge::params;
use tecbridge::transport::Transport;

// ── Instrument emulator ───────────────────────────────────────

#[derive(Default)]
struct Emulator {
    values: HashMap<(u16, u8), u32>,
    ident: &'static str,
    /// Transceiver driving the line (true = bridge transmitting).
    driving: bool,
    /// Bytes written while the transceiver was in receive mode.
    stray_bytes: usize,
    request: Vec<u8>,
    reply: VecDeque<u8>,
    sequences: Vec<u16>,
    silent: bool,
    corrupt: bool,
    /// Hold the next reply back until `deliver_late` is called.
    late: bool,
    held: Vec<u8>,
}

impl Emulator {
    fn answer(&mut self) {
        let frame = std::mem::take(&mut self.request);
        if self.silent {
            return;
        }
        let text = std::str::from_utf8(&frame).expect("ASCII request");
        let body = text
            .strip_prefix('#')
            .and_then(|t| t.strip_suffix('\r'))
            .expect("request framing");
        let (head, crc_hex) = body.split_at(body.len() - 4);
        let request_crc = u16::from_str_radix(crc_hex, 16).expect("hex CRC");
        assert_eq!(crc16(&frame[..frame.len() - 5]), request_crc, "request CRC");

        let (address, rest) = head.split_at(2);
        let (sequence, payload) = rest.split_at(4);
        self.sequences
            .push(u16::from_str_radix(sequence, 16).expect("hex sequence"));

        let key = |args: &str| {
            (
                u16::from_str_radix(&args[0..4], 16).expect("id"),
                u8::from_str_radix(&args[4..6], 16).expect("instance"),
            )
        };
        let (reply_payload, ack) = if let Some(args) = payload.strip_prefix("?VR") {
            match self.values.get(&key(args)) {
                Some(v) => (format!("{:08X}", v), false),
                None => ("+05".to_owned(), false),
            }
        } else if let Some(args) = payload.strip_prefix("VS") {
            let value = u32::from_str_radix(&args[6..14], 16).expect("value");
            self.values.insert(key(args), value);
            (String::new(), true)
        } else if payload == "?IF" {
            (self.ident.to_owned(), false)
        } else {
            ("+01".to_owned(), false)
        };

        let mut out = format!("!{}{}{}", address, sequence, reply_payload);
        let mut crc = if ack { request_crc } else { crc16(out.as_bytes()) };
        if self.corrupt {
            crc ^= 0x0001;
        }
        out.push_str(&format!("{:04X}\r", crc));
        if std::mem::take(&mut self.late) {
            self.held.extend(out.bytes());
        } else {
            self.reply.extend(out.bytes());
        }
    }

    /// The held reply finally reaches the bridge, after its deadline.
    fn deliver_late(&mut self) {
        let held = std::mem::take(&mut self.held);
        self.reply.extend(held);
    }
}

type Shared = Rc<RefCell<Emulator>>;

struct Wire(Shared);

impl Transport for Wire {
    type Error = ();

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
        match self.0.borrow_mut().reply.pop_front() {
            Some(b) => {
                buf[0] = b;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        let mut emu = self.0.borrow_mut();
        if !emu.driving {
            emu.stray_bytes += data.len();
        }
        emu.request.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), ()> {
        self.0.borrow_mut().answer();
        Ok(())
    }

    fn available(&self) -> bool {
        !self.0.borrow().reply.is_empty()
    }
}

struct Direction(Shared);

impl ErrorType for Direction {
    type Error = Infallible;
}

impl OutputPin for Direction {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().driving = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().driving = true;
        Ok(())
    }
}

type Client = MeComClient<HalfDuplexBus<Wire, Direction, FakeClock>>;

fn connect(address: u8) -> (Client, Shared) {
    let emu = Rc::new(RefCell::new(Emulator {
        ident: "TEC-1092 v4.20",
        ..Emulator::default()
    }));
    let bus = HalfDuplexBus::new(
        Wire(emu.clone()),
        Direction(emu.clone()),
        FakeClock::stepping(1),
        100,
    )
    .expect("direction pin");
    (MeComClient::new(bus, address), emu)
}

// ── Parameter access ──────────────────────────────────────────

#[test]
fn float_read_round_trips_through_the_wire() {
    let (mut client, emu) = connect(0);
    emu.borrow_mut().values.insert((1000, 1), 25.5f32.to_bits());
    assert_eq!(client.read_float(1000, 1), Ok(25.5));
}

#[test]
fn negative_long_survives_the_hex_encoding() {
    let (mut client, emu) = connect(0);
    emu.borrow_mut().values.insert((1200, 1), (-3i32) as u32);
    assert_eq!(client.read_long(1200, 1), Ok(-3));
}

#[test]
fn write_then_read_back() {
    let (mut client, _emu) = connect(2);
    assert_eq!(client.write_float(3000, 1, -12.75), Ok(()));
    assert_eq!(client.read_float(3000, 1), Ok(-12.75));
    assert_eq!(client.write_long(108, 1, 1), Ok(()));
    assert_eq!(client.read_long(108, 1), Ok(1));
}

#[test]
fn unknown_parameter_is_a_device_error() {
    let (mut client, _emu) = connect(0);
    assert_eq!(client.read_float(4242, 1), Err(ParameterError::Device(5)));
}

#[test]
fn silent_instrument_times_out() {
    let (mut client, emu) = connect(0);
    emu.borrow_mut().silent = true;
    assert_eq!(client.read_float(1000, 1), Err(ParameterError::NoReply));
}

#[test]
fn corrupted_replies_are_rejected() {
    let (mut client, emu) = connect(0);
    emu.borrow_mut().values.insert((1000, 1), 1.0f32.to_bits());
    emu.borrow_mut().corrupt = true;
    assert_eq!(client.read_float(1000, 1), Err(ParameterError::Checksum));
    assert_eq!(client.write_float(1000, 1, 2.0), Err(ParameterError::Checksum));
}

#[test]
fn leftover_frame_in_receive_buffer_is_discarded() {
    let (mut client, emu) = connect(0);
    {
        let mut emu = emu.borrow_mut();
        emu.values.insert((1000, 1), 25.5f32.to_bits());
        let mut stale = String::from("!00FFFF00000000");
        let crc = crc16(stale.as_bytes());
        stale.push_str(&format!("{:04X}\r", crc));
        emu.reply.extend(stale.bytes());
    }
    for _ in 0..5 {
        assert_eq!(client.read_float(1000, 1), Ok(25.5));
    }
}

#[test]
fn late_reply_costs_one_exchange_only() {
    let (mut client, emu) = connect(0);
    {
        let mut emu = emu.borrow_mut();
        emu.values.insert((1000, 1), 1.0f32.to_bits());
        emu.values.insert((1001, 1), 2.0f32.to_bits());
        emu.late = true;
    }
    assert_eq!(client.read_float(1000, 1), Err(ParameterError::NoReply));
    emu.borrow_mut().deliver_late();

    assert_eq!(client.read_float(1001, 1), Ok(2.0));
    assert_eq!(client.read_float(1000, 1), Ok(1.0));
    assert!(emu.borrow().reply.is_empty());
}

#[test]
fn identify_returns_instrument_text() {
    let (mut client, _emu) = connect(0);
    let ident = client.identify().expect("identify");
    assert_eq!(ident.as_str(), "TEC-1092 v4.20");
}

#[test]
fn every_request_gets_a_fresh_sequence_number() {
    let (mut client, emu) = connect(0);
    emu.borrow_mut().values.insert((1000, 1), 0);
    for _ in 0..3 {
        let _ = client.read_float(1000, 1);
    }
    assert_eq!(emu.borrow().sequences, [1, 2, 3]);
}

#[test]
fn transceiver_only_drives_while_sending() {
    let (mut client, emu) = connect(0);
    emu.borrow_mut().values.insert((1000, 1), 0);
    for _ in 0..5 {
        let _ = client.read_float(1000, 1);
    }
    let emu = emu.borrow();
    assert_eq!(emu.stray_bytes, 0);
    assert!(!emu.driving, "bus must be left in receive mode");
}

// ── Full bridge over the emulated bus ─────────────────────────

#[test]
fn host_setpoint_reaches_the_instrument() {
    let (mut client, emu) = connect(0);
    let mut app = AppService::new(SystemConfig::default());
    let reply = app
        .handle_line("SETC 0.5", &mut MockHardware::new(), &mut client)
        .expect("reply");
    assert_eq!(reply.as_str(), "OK SETC 0.500");

    let p = params::CURRENT_SETPOINT;
    assert_eq!(
        emu.borrow().values.get(&(p.id, p.instance)),
        Some(&0.5f32.to_bits())
    );
}

#[test]
fn telemetry_row_is_complete_over_the_real_client() {
    let (mut client, emu) = connect(0);
    {
        let mut emu = emu.borrow_mut();
        emu.values.insert((params::ERROR_NUMBER.id, 1), 0);
        emu.values.insert((params::OBJECT_TEMPERATURE.id, 1), 24.125f32.to_bits());
    }
    let mut app = AppService::new(SystemConfig::default());
    let mut host = crate::mock_hw::MockHost::new();
    assert!(app.emit_telemetry(&mut host, &mut MockHardware::new(), &mut client));

    let lines = host.take_lines();
    let fields: Vec<&str> = lines[0].split(',').collect();
    assert_eq!(fields.len(), tecbridge::telemetry::FIELD_COUNT);
    assert_eq!(fields[0], "0");
    assert_eq!(fields[3], "none");
    let object = tecbridge::telemetry::INSTRUMENT_CHANNELS
        .iter()
        .position(|ch| ch.name == "tec_object_c")
        .expect("object channel");
    assert_eq!(fields[4 + object], "24.125");
}
