//! ASCII frame codec for the instrument parameter protocol.
//!
//! Wire format (all numbers upper-case hex):
//! ```text
//! ┌─────┬──────┬──────┬───────────────┬──────┬────┐
//! │ '#' │ ADDR │ SEQ  │ payload       │ CRC  │ \r │   request
//! │ '!' │ 2 ch │ 4 ch │ 0..N chars    │ 4 ch │    │   response
//! └─────┴──────┴──────┴───────────────┴──────┴────┘
//! ```
//!
//! The CRC is CRC-16/XMODEM over everything from the start character up to
//! the end of the payload.  An acknowledgement has an empty payload and
//! echoes the request's CRC instead of computing its own, so
//! [`parse_response`] leaves that comparison to the caller.

use core::fmt::Write;

use heapless::{String, Vec};

use crate::error::ParameterError;

pub const REQUEST_START: u8 = b'#';
pub const RESPONSE_START: u8 = b'!';
pub const FRAME_END: u8 = b'\r';

/// Largest request this client ever builds (`VS` with a 32-bit value).
pub const MAX_REQUEST_LEN: usize = 40;

/// Start + address + sequence.
const HEADER_LEN: usize = 1 + 2 + 4;
const CRC_LEN: usize = 4;

pub type RequestFrame = Vec<u8, MAX_REQUEST_LEN>;

/// CRC-16/XMODEM (poly 0x1021, init 0, no reflection, no final xor).
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Build one request frame.  Returns the frame and its CRC (needed to
/// validate the acknowledgement).
///
/// Returns `None` if `payload` does not fit in [`MAX_REQUEST_LEN`].
pub fn encode_request(address: u8, sequence: u16, payload: &str) -> Option<(RequestFrame, u16)> {
    let mut text: String<MAX_REQUEST_LEN> = String::new();
    write!(text, "#{:02X}{:04X}{}", address, sequence, payload).ok()?;
    let crc = crc16(text.as_bytes());
    write!(text, "{:04X}\r", crc).ok()?;
    Some((Vec::from_slice(text.as_bytes()).ok()?, crc))
}

/// A response frame split into its fields.  Borrows the received bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response<'a> {
    pub address: u8,
    pub sequence: u16,
    pub payload: &'a [u8],
    /// Raw CRC field.  Verified here for non-empty payloads; for an
    /// acknowledgement it is the echoed request CRC.
    pub crc: u16,
}

impl Response<'_> {
    pub fn is_ack(&self) -> bool {
        self.payload.is_empty()
    }

    /// Device error code if the payload is a `+ee` error report.
    pub fn device_error(&self) -> Option<u8> {
        match self.payload {
            [b'+', hi, lo] => hex_value(&[*hi, *lo]).map(|v| v as u8),
            _ => None,
        }
    }
}

/// Split and check one received frame.
///
/// An empty frame is [`ParameterError::NoReply`]; a frame without the
/// terminator (timeout or truncation) is [`ParameterError::Malformed`].
pub fn parse_response(frame: &[u8]) -> Result<Response<'_>, ParameterError> {
    if frame.is_empty() {
        return Err(ParameterError::NoReply);
    }
    let body = match frame.split_last() {
        Some((&FRAME_END, body)) => body,
        _ => return Err(ParameterError::Malformed),
    };
    if body.len() < HEADER_LEN + CRC_LEN || body[0] != RESPONSE_START {
        return Err(ParameterError::Malformed);
    }

    let crc_at = body.len() - CRC_LEN;
    let address = hex_value(&body[1..3]).ok_or(ParameterError::Malformed)? as u8;
    let sequence = hex_value(&body[3..HEADER_LEN]).ok_or(ParameterError::Malformed)? as u16;
    let crc = hex_value(&body[crc_at..]).ok_or(ParameterError::Malformed)? as u16;
    let payload = &body[HEADER_LEN..crc_at];

    if !payload.is_empty() && crc16(&body[..crc_at]) != crc {
        return Err(ParameterError::Checksum);
    }

    Ok(Response {
        address,
        sequence,
        payload,
        crc,
    })
}

/// Parse up to 8 hex digits (either case).
pub fn hex_value(digits: &[u8]) -> Option<u32> {
    if digits.is_empty() || digits.len() > 8 {
        return None;
    }
    digits.iter().try_fold(0u32, |acc, &d| {
        let nibble = (d as char).to_digit(16)?;
        Some((acc << 4) | nibble)
    })
}
