//! TecBridge firmware library.
//!
//! Exposes the pure-logic modules for integration testing and for the
//! firmware binary. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod mecom;
pub mod params;
pub mod pins;
pub mod telemetry;
pub mod transport;

// Hardware-facing modules compile on the host too; the ESP-IDF pieces
// inside them are cfg-gated.
pub mod adapters;
pub mod drivers;
pub mod sensors;
