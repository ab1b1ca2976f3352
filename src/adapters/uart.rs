//! UART transport over the ESP-IDF UART driver.
//!
//! Used for both serial links: the host link on UART2 and the instrument
//! bus on UART1 (wrapped by [`HalfDuplexBus`](crate::drivers::rs485::HalfDuplexBus)).
//! Reads never block; the caller owns every deadline.

use esp_idf_hal::delay::{BLOCK, NON_BLOCK};
use esp_idf_hal::sys::EspError;
use esp_idf_hal::uart::UartDriver;

use crate::transport::Transport;

pub struct UartTransport<'d> {
    uart: UartDriver<'d>,
}

impl<'d> UartTransport<'d> {
    pub fn new(uart: UartDriver<'d>) -> Self {
        Self { uart }
    }
}

impl Transport for UartTransport<'_> {
    type Error = EspError;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, EspError> {
        self.uart.read(buf, NON_BLOCK)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, EspError> {
        self.uart.write(data)
    }

    /// Wait until the TX FIFO and shift register are empty, so the RS-485
    /// direction pin is never released mid-byte.
    fn flush(&mut self) -> Result<(), EspError> {
        self.uart.wait_tx_done(BLOCK)
    }

    fn available(&self) -> bool {
        self.uart.remaining_read().is_ok_and(|n| n > 0)
    }
}
