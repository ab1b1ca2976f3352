//! Half-duplex RS-485 adapter for the instrument bus.
//!
//! The transceiver shares one differential pair for both directions; a
//! dedicated driver-enable pin selects transmit (HIGH) or receive (LOW).
//!
//! ```text
//!  send():    drain rx ─▶ DE=HIGH ─▶ write frame ─▶ flush ─▶ DE=LOW
//!  receive(): ┌─ read byte ─┐  until '\r' | buffer full | deadline
//!             └─────────────┘
//! ```
//!
//! Frames are `'\r'`-terminated.  A receive that hits capacity returns the
//! truncated frame without signalling it; the parameter client's checksum
//! rejects it downstream.  An empty frame means nothing arrived before the
//! deadline.  There is no queue and no retry: callers pair each `send`
//! with one `receive`.  Bytes still waiting when the next `send` starts
//! belong to an earlier exchange (a reply that missed its deadline) and
//! are discarded, so a late reply never shifts later exchanges by one.

use embedded_hal::digital::OutputPin;
use heapless::Vec;
use log::{debug, warn};

use crate::app::ports::Clock;
use crate::error::BusError;
use crate::transport::Transport;

/// Largest frame accepted from the instrument.
pub const RX_FRAME_CAPACITY: usize = 100;

/// Frame terminator.
pub const FRAME_END: u8 = b'\r';

/// Upper bound on stale bytes discarded before one request.
const DRAIN_LIMIT: usize = 4 * RX_FRAME_CAPACITY;

/// One received frame (possibly empty, possibly truncated).
pub type Frame = Vec<u8, RX_FRAME_CAPACITY>;

/// Request/response access to the instrument bus.
pub trait FrameBus {
    /// Put one complete frame on the bus.
    fn send(&mut self, frame: &[u8]) -> Result<(), BusError>;

    /// Collect one reply frame, bounded by the receive timeout.
    fn receive(&mut self) -> Frame;
}

pub struct HalfDuplexBus<T, DE, C> {
    uart: T,
    de: DE,
    clock: C,
    timeout_ms: u64,
}

impl<T: Transport, DE: OutputPin, C: Clock> HalfDuplexBus<T, DE, C> {
    /// Construct the adapter and park the transceiver in receive mode.
    pub fn new(uart: T, mut de: DE, clock: C, timeout_ms: u32) -> Result<Self, BusError> {
        de.set_low().map_err(|_| BusError::Direction)?;
        Ok(Self {
            uart,
            de,
            clock,
            timeout_ms: u64::from(timeout_ms),
        })
    }

    /// Throw away whatever is waiting in the receive buffer.
    fn drain_stale(&mut self) {
        let mut scratch = [0u8; 16];
        let mut dropped = 0;
        while dropped < DRAIN_LIMIT && self.uart.available() {
            match self.uart.read(&mut scratch) {
                Ok(0) => break,
                Ok(n) => dropped += n,
                Err(e) => {
                    debug!("rs485: read error {:?} while draining", e);
                    break;
                }
            }
        }
        if dropped > 0 {
            warn!("rs485: discarded {} stale byte(s) before request", dropped);
        }
    }

    fn transmit(&mut self, frame: &[u8]) -> Result<(), BusError> {
        match self.uart.write_all(frame) {
            Ok(true) => {}
            Ok(false) => return Err(BusError::Write),
            Err(e) => {
                debug!("rs485: write error {:?}", e);
                return Err(BusError::Write);
            }
        }
        self.uart.flush().map_err(|e| {
            debug!("rs485: flush error {:?}", e);
            BusError::Flush
        })
    }
}

impl<T: Transport, DE: OutputPin, C: Clock> FrameBus for HalfDuplexBus<T, DE, C> {
    fn send(&mut self, frame: &[u8]) -> Result<(), BusError> {
        self.drain_stale();
        self.de.set_high().map_err(|_| BusError::Direction)?;
        let sent = self.transmit(frame);
        // Release the line whatever happened, or the instrument can never answer.
        let released = self.de.set_low().map_err(|_| BusError::Direction);
        sent.and(released)
    }

    fn receive(&mut self) -> Frame {
        let mut frame = Frame::new();
        let start = self.clock.now_ms();
        loop {
            let mut byte = [0u8; 1];
            match self.uart.read(&mut byte) {
                Ok(0) => {}
                Ok(_) => {
                    // Cannot fail: capacity is checked right below.
                    let _ = frame.push(byte[0]);
                    if byte[0] == FRAME_END || frame.is_full() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("rs485: read error {:?}, dropping rest of frame", e);
                    break;
                }
            }
            if self.clock.now_ms().saturating_sub(start) >= self.timeout_ms {
                break;
            }
        }
        frame
    }
}
