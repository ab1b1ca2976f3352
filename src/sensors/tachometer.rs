//! Pump tachometer: interrupt-driven pulse counter.
//!
//! The pump's open-collector tach output pulls the input low a fixed number
//! of times per revolution.  A falling-edge ISR increments a shared counter;
//! once per telemetry period the main loop snapshots it and turns the
//! difference into revolutions per minute.
//!
//! The counter exposes exactly two operations:
//!
//! - [`PulseCounter::increment`]: ISR context only, one atomic add.
//! - [`PulseCounter::snapshot_since`]: main loop only, one word read
//!   inside a critical section, then the subtraction.
//!
//! The counter wraps on overflow; the wrapping subtraction keeps the delta
//! correct across the wrap as long as fewer than 2^32 pulses arrive in one
//! period.

use core::sync::atomic::{AtomicU32, Ordering};

/// Pulse counter shared between the tach ISR and the telemetry tick.
pub struct PulseCounter {
    pulses: AtomicU32,
}

impl PulseCounter {
    pub const fn new() -> Self {
        Self {
            pulses: AtomicU32::new(0),
        }
    }

    /// Count one falling edge.  Called from the GPIO ISR; no debouncing.
    pub fn increment(&self) {
        self.pulses.fetch_add(1, Ordering::Relaxed);
    }

    /// Read the cumulative count with interrupts masked for the duration of
    /// the single load.
    fn snapshot(&self) -> u32 {
        critical_section::with(|_| self.pulses.load(Ordering::Acquire))
    }

    /// Snapshot the counter, return the pulses since `last_sampled`, and
    /// advance `last_sampled` to the snapshot.
    pub fn snapshot_since(&self, last_sampled: &mut u32) -> u32 {
        let now = self.snapshot();
        let delta = now.wrapping_sub(*last_sampled);
        *last_sampled = now;
        delta
    }
}

impl Default for PulseCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// The board's tachometer counter.
/// `static` because ESP-IDF ISR callbacks cannot capture state.
pub static TACH_PULSES: PulseCounter = PulseCounter::new();

/// Called from the GPIO ISR on each falling edge of the tach input.
pub fn tach_isr_handler() {
    TACH_PULSES.increment();
}

/// Result of one tachometer sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TachReading {
    /// Pulses counted since the previous sample.
    pub delta: u32,
    /// Derived pump speed (rev/min).
    pub rpm: f32,
}

/// Consumer side of the tachometer: owns `last_sampled_pulses`.
pub struct Tachometer<'a> {
    counter: &'a PulseCounter,
    last_sampled: u32,
    pulses_per_revolution: u16,
    period_secs: f32,
}

impl<'a> Tachometer<'a> {
    /// `period_secs` is the nominal interval between [`sample`](Self::sample)
    /// calls.  Scheduling jitter is not corrected for.
    pub fn new(counter: &'a PulseCounter, pulses_per_revolution: u16, period_secs: f32) -> Self {
        Self {
            counter,
            last_sampled: 0,
            pulses_per_revolution: pulses_per_revolution.max(1),
            period_secs,
        }
    }

    pub fn sample(&mut self) -> TachReading {
        let delta = self.counter.snapshot_since(&mut self.last_sampled);
        TachReading {
            delta,
            rpm: rpm_from_delta(delta, self.pulses_per_revolution, self.period_secs),
        }
    }
}

/// Revolutions per minute from the pulses seen during one nominal period.
pub fn rpm_from_delta(delta: u32, pulses_per_revolution: u16, period_secs: f32) -> f32 {
    if period_secs <= 0.0 || pulses_per_revolution == 0 {
        return 0.0;
    }
    delta as f32 * 60.0 / (pulses_per_revolution as f32 * period_secs)
}
