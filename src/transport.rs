//! Transport abstraction: any byte-oriented serial channel.
//!
//! Concrete implementations:
//! - ESP-IDF UART driver (host link on UART2, instrument bus on UART1)
//! - in-memory buffers in the host test suite
//!
//! The host command loop and the RS-485 bus adapter are both generic over
//! `Transport`, so they never see the UART peripheral directly.

/// Byte-oriented transport channel.
pub trait Transport {
    /// Error type for this transport.
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes into `buf`.
    /// Returns the number of bytes actually read.
    /// Returns 0 if no data is available (non-blocking).
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write `data` to the transport.
    /// Returns the number of bytes actually written.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Block until every buffered byte has left the wire.
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Check if data is available for reading.
    fn available(&self) -> bool;

    /// Write all of `data`, looping over short writes.
    ///
    /// Returns `Ok(false)` if the transport stopped accepting bytes
    /// (a zero-length write) before everything was queued.
    fn write_all(&mut self, mut data: &[u8]) -> Result<bool, Self::Error> {
        while !data.is_empty() {
            let n = self.write(data)?;
            if n == 0 {
                return Ok(false);
            }
            data = &data[n.min(data.len())..];
        }
        Ok(true)
    }
}
