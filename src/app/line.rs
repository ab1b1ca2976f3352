//! Host line assembly.
//!
//! Turns the raw byte stream from the host link into terminated command
//! lines.  `'\n'` ends a line and `'\r'` is ignored, so both LF and CRLF
//! hosts work.  Lines longer than the buffer are truncated: excess bytes
//! are dropped until the next terminator.  Non-ASCII bytes become `'?'`
//! so the dispatcher only ever sees ASCII.

use heapless::String;

/// Default host line capacity.
pub const HOST_LINE_CAPACITY: usize = 128;

pub struct LineBuffer<const N: usize> {
    buf: String<N>,
    overflowed: bool,
}

impl<const N: usize> LineBuffer<N> {
    pub const fn new() -> Self {
        Self {
            buf: String::new(),
            overflowed: false,
        }
    }

    /// Feed one byte.  Returns the completed line when `byte` is the
    /// terminator.
    pub fn push(&mut self, byte: u8) -> Option<String<N>> {
        match byte {
            b'\n' => {
                if self.overflowed {
                    log::warn!("host: line longer than {} bytes truncated", N);
                }
                self.overflowed = false;
                Some(core::mem::take(&mut self.buf))
            }
            b'\r' => None,
            _ => {
                let c = if byte.is_ascii() { byte as char } else { '?' };
                if self.buf.push(c).is_err() {
                    self.overflowed = true;
                }
                None
            }
        }
    }

    /// Bytes collected for the current, unterminated line.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

impl<const N: usize> Default for LineBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
