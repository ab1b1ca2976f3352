//! GPIO / peripheral pin assignments for the TecBridge carrier board.
//!
//! The HAL hands out pins as distinct types, so `main` takes each GPIO by
//! name and checks it against the constant here at bring-up.  Moving a pin
//! means changing both places; a mismatch stops the firmware before any
//! peripheral is driven.

// ---------------------------------------------------------------------------
// Host link (UART2, external USB-serial bridge)
// ---------------------------------------------------------------------------
// UART0 (GPIO43/44) stays the ESP-IDF console so log output never mixes
// with replies and telemetry rows.

pub const HOST_UART_TX_GPIO: i32 = 1;
pub const HOST_UART_RX_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// Instrument bus (UART1 + RS-485 transceiver)
// ---------------------------------------------------------------------------

pub const BUS_UART_TX_GPIO: i32 = 17;
pub const BUS_UART_RX_GPIO: i32 = 18;
/// Digital output: RS-485 driver enable. LOW = receive, HIGH = transmit.
pub const BUS_DIR_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// Pressure transducer (SPI2)
// ---------------------------------------------------------------------------

pub const SPI_SCLK_GPIO: i32 = 12;
pub const SPI_MISO_GPIO: i32 = 13;
pub const SPI_MOSI_GPIO: i32 = 11;
pub const PRESSURE_CS_GPIO: i32 = 10;

// ---------------------------------------------------------------------------
// Environmental sensor (I2C0)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 8;
pub const I2C_SCL_GPIO: i32 = 9;
/// I2C bus clock (100 kHz standard mode).
pub const I2C_FREQ_HZ: u32 = 100_000;

// ---------------------------------------------------------------------------
// Pump
// ---------------------------------------------------------------------------

/// LEDC PWM output driving the pump controller's speed input.
pub const PUMP_PWM_GPIO: i32 = 5;
/// Open-collector tachometer output, interrupt on falling edge.
pub const TACH_GPIO: i32 = 6;

/// LEDC base frequency for the pump speed input (25 kHz, inaudible).
pub const PUMP_PWM_FREQ_HZ: u32 = 25_000;
