//! Application core: pure bridge logic, zero direct I/O.
//!
//! Command parsing and dispatch, device state, host line assembly and the
//! loop body.  All interaction with hardware happens through **port
//! traits** defined in [`ports`], keeping this layer testable without
//! real peripherals.

pub mod commands;
pub mod line;
pub mod ports;
pub mod service;
pub mod state;
