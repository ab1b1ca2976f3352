//! Host command parsing.
//!
//! One terminated line becomes one [`Command`]: an upper-cased verb plus
//! the raw argument text, borrowed from the original line so numeric and
//! string arguments keep their case.  Execution lives in
//! [`AppService::handle_command`](super::service::AppService::handle_command).

use heapless::String;

/// Verb tokens longer than this are truncated before matching.
pub const MAX_VERB_LEN: usize = 16;

/// Commands the host can send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    Ping,
    Get,
    Reset,
    /// Laser-driver current setpoint (A).
    SetCurrent,
    /// Thermal setpoint (°C).
    SetTemperature,
    /// Pump speed (%).  Accepted as `SETPWR` or `SETPOWER`.
    SetPower,
    /// Instrument identification.
    Identify,
    /// Live configuration read-back.
    Config,
    /// Anything else; carries the upper-cased token for the error reply.
    Unknown(String<MAX_VERB_LEN>),
}

impl Verb {
    fn from_token(token: &str) -> Self {
        let mut upper: String<MAX_VERB_LEN> = String::new();
        for c in token.chars() {
            if upper.push(c.to_ascii_uppercase()).is_err() {
                break;
            }
        }
        match upper.as_str() {
            "PING" => Self::Ping,
            "GET" => Self::Get,
            "RESET" => Self::Reset,
            "SETC" => Self::SetCurrent,
            "SETT" => Self::SetTemperature,
            "SETPWR" | "SETPOWER" => Self::SetPower,
            "ID" => Self::Identify,
            "CONFIG" => Self::Config,
            _ => Self::Unknown(upper),
        }
    }

    /// Token used in replies.
    pub fn name(&self) -> &str {
        match self {
            Self::Ping => "PING",
            Self::Get => "GET",
            Self::Reset => "RESET",
            Self::SetCurrent => "SETC",
            Self::SetTemperature => "SETT",
            Self::SetPower => "SETPWR",
            Self::Identify => "ID",
            Self::Config => "CONFIG",
            Self::Unknown(token) => token.as_str(),
        }
    }
}

/// One parsed host command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command<'a> {
    pub verb: Verb,
    pub argument: Option<&'a str>,
}

impl<'a> Command<'a> {
    /// Split a line into verb and argument.  Returns `None` for a blank
    /// line.
    pub fn parse(line: &'a str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let (token, rest) = match line.find(char::is_whitespace) {
            Some(at) => (&line[..at], line[at..].trim_start()),
            None => (line, ""),
        };
        Some(Self {
            verb: Verb::from_token(token),
            argument: (!rest.is_empty()).then_some(rest),
        })
    }
}

/// Why an argument could not be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentError {
    Missing,
    Invalid,
}

impl ArgumentError {
    /// Reason token appended to the `ERR` reply.
    pub const fn reason(self) -> &'static str {
        match self {
            Self::Missing => "missing_value",
            Self::Invalid => "bad_value",
        }
    }
}

/// Parse a float argument.  Non-finite values are refused.
pub fn float_argument(argument: Option<&str>) -> Result<f32, ArgumentError> {
    let text = argument.ok_or(ArgumentError::Missing)?;
    match text.parse::<f32>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ArgumentError::Invalid),
    }
}

/// Parse an integer argument, accepting a decimal and truncating it toward
/// zero (`"42.9"` is 42).
pub fn integer_argument(argument: Option<&str>) -> Result<i32, ArgumentError> {
    let text = argument.ok_or(ArgumentError::Missing)?;
    if let Ok(v) = text.parse::<i32>() {
        return Ok(v);
    }
    match text.parse::<f64>() {
        // `as` saturates out-of-range values; the caller clamps anyway.
        Ok(v) if v.is_finite() => Ok(v.trunc() as i32),
        _ => Err(ArgumentError::Invalid),
    }
}
