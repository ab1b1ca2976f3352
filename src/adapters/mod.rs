//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements                 | Connects to                 |
//! |------------|----------------------------|-----------------------------|
//! | `hardware` | SensorPort, ActuatorPort   | SPI, I2C, LEDC, tach ISR    |
//! | `time`     | Clock                      | ESP32 high-resolution timer |
//! | `uart`     | Transport                  | ESP-IDF UART driver         |
//!
//! The instrument [`ParameterClient`](crate::app::ports::ParameterClient)
//! adapter lives in [`mecom`](crate::mecom) on top of
//! [`drivers::rs485`](crate::drivers::rs485).

pub mod hardware;
pub mod time;
#[cfg(target_os = "espidf")]
pub mod uart;
