//! One-shot raw peripheral setup that the HAL drivers do not cover.
//!
//! Only the tachometer input lives here: the HAL's pin-interrupt helper
//! disables the interrupt after every edge, which would cost pulses
//! between re-arms.  The raw ESP-IDF GPIO ISR service keeps the edge
//! interrupt armed permanently.  Called once from `main()` before the
//! loop starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
    IsrHandlerFailed(i32),
    IsrEnableFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
            Self::IsrHandlerFailed(rc) => write!(f, "GPIO ISR handler add failed (rc={})", rc),
            Self::IsrEnableFailed(rc) => write!(f, "GPIO interrupt enable failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

/// Map an `esp_err_t` to `Ok` (`ESP_OK` is 0) or the given error.
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
fn check(rc: i32, err: fn(i32) -> HwInitError) -> Result<(), HwInitError> {
    if rc == 0 {
        Ok(())
    } else {
        Err(err(rc))
    }
}

// ── Tachometer ISR ────────────────────────────────────────────

#[cfg(target_os = "espidf")]
use crate::sensors::tachometer::tach_isr_handler;

#[cfg(target_os = "espidf")]
unsafe extern "C" fn tach_gpio_isr(_arg: *mut core::ffi::c_void) {
    tach_isr_handler();
}

/// Configure the tach pin (input, pull-up, falling edge) and register its
/// ISR with the per-pin GPIO ISR service.
#[cfg(target_os = "espidf")]
pub fn init_tach_isr() -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::TACH_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_NEGEDGE,
    };
    // SAFETY: called once from main() before the loop; the handler only
    // performs one atomic increment and touches no bus.
    unsafe {
        check(gpio_config(&cfg), HwInitError::GpioConfigFailed)?;

        // ESP_ERR_INVALID_STATE: service already installed.
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        check(
            gpio_isr_handler_add(pins::TACH_GPIO, Some(tach_gpio_isr), core::ptr::null_mut()),
            HwInitError::IsrHandlerFailed,
        )?;
        check(gpio_intr_enable(pins::TACH_GPIO), HwInitError::IsrEnableFailed)?;
    }

    info!("hw_init: tach ISR on GPIO{} (falling edge)", pins::TACH_GPIO);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_tach_isr() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): tach ISR skipped");
    Ok(())
}
