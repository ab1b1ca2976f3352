//! Instrument parameter client over the RS-485 bus.
//!
//! Implements [`ParameterClient`] with a request/response exchange per
//! call:
//!
//! ```text
//! read_*   ──▶ "?VR" id inst           ◀── 8 hex digits (raw 32-bit value)
//! write_*  ──▶ "VS"  id inst value     ◀── ACK (empty payload, echoed CRC)
//! identify ──▶ "?IF"                   ◀── ASCII text
//!                                      ◀── "+ee" device error (any request)
//! ```
//!
//! Floats travel as their IEEE-754 bit pattern.  Every failure is returned
//! as a [`ParameterError`] and logged once at debug level; the caller
//! substitutes the sentinel.

pub mod frame;

use core::fmt::Write;

use heapless::String;
use log::{debug, warn};

use crate::app::ports::{ParameterClient, IDENT_CAPACITY};
use crate::drivers::rs485::{Frame, FrameBus};
use crate::error::ParameterError;
use frame::{encode_request, parse_response};

/// Longest payload built by this client.
const PAYLOAD_CAPACITY: usize = 24;

pub struct MeComClient<B> {
    bus: B,
    address: u8,
    sequence: u16,
}

impl<B: FrameBus> MeComClient<B> {
    /// `address` 0 accepts a reply from whichever device answers.
    pub fn new(bus: B, address: u8) -> Self {
        Self {
            bus,
            address,
            sequence: 0,
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Send one request and return the validated reply payload.
    ///
    /// An acknowledgement yields an empty payload.
    fn exchange(&mut self, payload: &str) -> Result<Frame, ParameterError> {
        self.sequence = self.sequence.wrapping_add(1);
        let sequence = self.sequence;
        let (request, request_crc) =
            encode_request(self.address, sequence, payload).ok_or(ParameterError::Malformed)?;

        self.bus.send(&request)?;
        let reply = self.bus.receive();
        let response = parse_response(&reply)?;

        if response.sequence != sequence {
            debug!(
                "mecom: sequence {:04X} answered with {:04X}",
                sequence, response.sequence
            );
            return Err(ParameterError::Mismatch);
        }
        if self.address != 0 && response.address != self.address {
            debug!(
                "mecom: addressed {:02X}, reply from {:02X}",
                self.address, response.address
            );
            return Err(ParameterError::Mismatch);
        }
        if response.is_ack() && response.crc != request_crc {
            return Err(ParameterError::Checksum);
        }
        if let Some(code) = response.device_error() {
            warn!(
                "mecom: {} -> device error {} ({})",
                payload,
                code,
                ParameterError::device_code_name(code)
            );
            return Err(ParameterError::Device(code));
        }

        Frame::from_slice(response.payload).map_err(|_| ParameterError::Malformed)
    }

    fn query_value(&mut self, id: u16, instance: u8) -> Result<u32, ParameterError> {
        let mut payload: String<PAYLOAD_CAPACITY> = String::new();
        write!(payload, "?VR{:04X}{:02X}", id, instance).map_err(|_| ParameterError::Malformed)?;
        let reply = self.exchange(&payload).inspect_err(|e| {
            debug!("mecom: read {}.{} failed: {}", id, instance, e);
        })?;
        if reply.len() != 8 {
            return Err(ParameterError::Malformed);
        }
        frame::hex_value(&reply).ok_or(ParameterError::Malformed)
    }

    fn set_value(&mut self, id: u16, instance: u8, bits: u32) -> Result<(), ParameterError> {
        let mut payload: String<PAYLOAD_CAPACITY> = String::new();
        write!(payload, "VS{:04X}{:02X}{:08X}", id, instance, bits)
            .map_err(|_| ParameterError::Malformed)?;
        let reply = self.exchange(&payload).inspect_err(|e| {
            debug!("mecom: write {}.{} failed: {}", id, instance, e);
        })?;
        if !reply.is_empty() {
            return Err(ParameterError::Malformed);
        }
        Ok(())
    }
}

impl<B: FrameBus> ParameterClient for MeComClient<B> {
    fn read_float(&mut self, id: u16, instance: u8) -> Result<f32, ParameterError> {
        self.query_value(id, instance).map(f32::from_bits)
    }

    fn read_long(&mut self, id: u16, instance: u8) -> Result<i32, ParameterError> {
        self.query_value(id, instance).map(|bits| bits as i32)
    }

    fn write_float(&mut self, id: u16, instance: u8, value: f32) -> Result<(), ParameterError> {
        self.set_value(id, instance, value.to_bits())
    }

    fn write_long(&mut self, id: u16, instance: u8, value: i32) -> Result<(), ParameterError> {
        self.set_value(id, instance, value as u32)
    }

    fn identify(&mut self) -> Result<String<IDENT_CAPACITY>, ParameterError> {
        let reply = self.exchange("?IF")?;
        let mut text = String::new();
        for &b in reply.iter().take(IDENT_CAPACITY) {
            let c = if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '?'
            };
            // Cannot overflow: at most IDENT_CAPACITY single-byte chars.
            let _ = text.push(c);
        }
        Ok(text)
    }
}
