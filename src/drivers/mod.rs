//! Actuator and bus drivers, plus one-shot hardware initialisation.

pub mod hw_init;
pub mod pump;
pub mod rs485;
