//! Sample pump speed driver.
//!
//! The pump controller's speed input is active-low: full duty stops the
//! pump, zero duty runs it flat out.  Commanded speed (0–100 %) is mapped
//! inversely onto the PWM duty range.  Open loop; the tachometer only
//! reports, it never feeds back.
//!
//! ## Dual-target design
//!
//! Generic over [`SetDutyCycle`]: an LEDC channel on ESP-IDF, an in-memory
//! recorder in tests.

use embedded_hal::pwm::SetDutyCycle;
use log::debug;

use crate::error::ActuatorError;

pub struct PumpDriver<PWM> {
    pwm: PWM,
    hw_percent: u8,
}

impl<PWM: SetDutyCycle> PumpDriver<PWM> {
    pub fn new(pwm: PWM) -> Self {
        Self { pwm, hw_percent: 0 }
    }

    /// Drive the output for `percent` (clamped to 100).
    pub fn apply(&mut self, percent: u8) -> Result<(), ActuatorError> {
        let percent = percent.min(100);
        let duty = inverse_duty(percent, self.pwm.max_duty_cycle());
        self.pwm
            .set_duty_cycle(duty)
            .map_err(|_| ActuatorError::PwmWriteFailed)?;
        debug!("pump: {}% -> duty {}", percent, duty);
        self.hw_percent = percent;
        Ok(())
    }

    /// Stop the pump (maximum duty).
    pub fn stop(&mut self) -> Result<(), ActuatorError> {
        self.apply(0)
    }

    /// Speed currently on the output.
    pub fn current_percent(&self) -> u8 {
        self.hw_percent
    }
}

/// 0 % → `max_duty` (stopped), 100 % → 0 (full speed).
pub fn inverse_duty(percent: u8, max_duty: u16) -> u16 {
    let percent = u32::from(percent.min(100));
    let max = u32::from(max_duty);
    (max - percent * max / 100) as u16
}
