//! TecBridge Firmware: Main Entry Point
//!
//! Hexagonal architecture, single cooperative loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter      UartTransport (host)   Esp32TimeAdapter  │
//! │  (Sensor+Actuator)    (Transport)            (Clock)           │
//! │  MeComClient ── HalfDuplexBus ── UartTransport (instrument)    │
//! │  (ParameterClient)    (FrameBus)                               │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  commands · DeviceState · telemetry schedule           │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  tach ISR ──▶ TACH_PULSES (atomic, snapshot in critical section)│
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyIOPin, Pin, PinDriver};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::ledc::{config::TimerConfig, LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::spi::{config::Config as SpiConfig, config::MODE_0, SpiDeviceDriver, SpiDriver, SpiDriverConfig};
use esp_idf_hal::uart::{config::Config as UartConfig, UartDriver};
use esp_idf_hal::units::Hertz;
use log::info;

use tecbridge::adapters::hardware::HardwareAdapter;
use tecbridge::adapters::time::Esp32TimeAdapter;
use tecbridge::adapters::uart::UartTransport;
use tecbridge::app::service::AppService;
use tecbridge::config::SystemConfig;
use tecbridge::drivers::hw_init;
use tecbridge::drivers::pump::PumpDriver;
use tecbridge::drivers::rs485::HalfDuplexBus;
use tecbridge::error::Error;
use tecbridge::mecom::MeComClient;
use tecbridge::pins;
use tecbridge::sensors::environment::EnvironmentSensor;
use tecbridge::sensors::pressure::PressureSensor;
use tecbridge::sensors::tachometer::{Tachometer, TACH_PULSES};
use tecbridge::sensors::SensorHub;

// ── Main ──────────────────────────────────────────────────────

/// Fail bring-up if a GPIO taken below differs from its `pins` constant.
fn wired(signal: &str, pin: &impl Pin, expected: i32) -> Result<()> {
    let actual = i32::from(pin.pin());
    if actual != expected {
        anyhow::bail!("{signal}: wired to GPIO{actual}, pins.rs says GPIO{expected}");
    }
    Ok(())
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  TecBridge v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration (compile-time defaults) ──────────────
    let config = SystemConfig::default();
    config.validate().map_err(Error::Config)?;

    let peripherals = Peripherals::take()?;
    let gpio = peripherals.pins;
    let clock = Esp32TimeAdapter::new();

    wired("host tx", &gpio.gpio1, pins::HOST_UART_TX_GPIO)?;
    wired("host rx", &gpio.gpio2, pins::HOST_UART_RX_GPIO)?;
    wired("bus tx", &gpio.gpio17, pins::BUS_UART_TX_GPIO)?;
    wired("bus rx", &gpio.gpio18, pins::BUS_UART_RX_GPIO)?;
    wired("bus dir", &gpio.gpio4, pins::BUS_DIR_GPIO)?;
    wired("spi sclk", &gpio.gpio12, pins::SPI_SCLK_GPIO)?;
    wired("spi mosi", &gpio.gpio11, pins::SPI_MOSI_GPIO)?;
    wired("spi miso", &gpio.gpio13, pins::SPI_MISO_GPIO)?;
    wired("pressure cs", &gpio.gpio10, pins::PRESSURE_CS_GPIO)?;
    wired("i2c sda", &gpio.gpio8, pins::I2C_SDA_GPIO)?;
    wired("i2c scl", &gpio.gpio9, pins::I2C_SCL_GPIO)?;
    wired("pump pwm", &gpio.gpio5, pins::PUMP_PWM_GPIO)?;
    wired("tach", &gpio.gpio6, pins::TACH_GPIO)?;

    // ── 3. Host link ──────────────────────────────────────────
    let mut host = UartTransport::new(UartDriver::new(
        peripherals.uart2,
        gpio.gpio1,
        gpio.gpio2,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &UartConfig::default().baudrate(Hertz(config.host_baud)),
    )?);
    info!(
        "host link: UART2 tx={} rx={} @ {} baud",
        pins::HOST_UART_TX_GPIO,
        pins::HOST_UART_RX_GPIO,
        config.host_baud
    );

    // ── 4. Instrument bus ─────────────────────────────────────
    let bus_uart = UartTransport::new(UartDriver::new(
        peripherals.uart1,
        gpio.gpio17,
        gpio.gpio18,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &UartConfig::default().baudrate(Hertz(config.instrument_baud)),
    )?);
    let direction = PinDriver::output(gpio.gpio4)?;
    let bus = HalfDuplexBus::new(bus_uart, direction, &clock, config.bus_timeout_ms)
        .map_err(Error::from)?;
    let mut client = MeComClient::new(bus, config.instrument_address);
    info!(
        "instrument bus: UART1 @ {} baud, dir=GPIO{}, address {}",
        config.instrument_baud,
        pins::BUS_DIR_GPIO,
        client.address()
    );

    // ── 5. Local peripherals ──────────────────────────────────
    let spi = SpiDriver::new(
        peripherals.spi2,
        gpio.gpio12,
        gpio.gpio11,
        Some(gpio.gpio13),
        &SpiDriverConfig::new(),
    )?;
    let pressure_spi = SpiDeviceDriver::new(
        spi,
        Some(gpio.gpio10),
        &SpiConfig::new()
            .baudrate(Hertz(config.spi_clock_hz))
            .data_mode(MODE_0),
    )?;

    let i2c = I2cDriver::new(
        peripherals.i2c0,
        gpio.gpio8,
        gpio.gpio9,
        &I2cConfig::new().baudrate(Hertz(pins::I2C_FREQ_HZ)),
    )?;

    let pwm_timer = LedcTimerDriver::new(
        peripherals.ledc.timer0,
        &TimerConfig::new()
            .frequency(Hertz(pins::PUMP_PWM_FREQ_HZ))
            .resolution(Resolution::Bits8),
    )?;
    let pump_pwm = LedcDriver::new(peripherals.ledc.channel0, &pwm_timer, gpio.gpio5)?;

    hw_init::init_tach_isr()?;

    let sensor_hub = SensorHub::new(
        Tachometer::new(
            &TACH_PULSES,
            config.pulses_per_revolution,
            config.telemetry_period_secs(),
        ),
        PressureSensor::new(pressure_spi, config.pressure),
        EnvironmentSensor::new(i2c, config.env_i2c_address),
    );
    let mut hw = HardwareAdapter::new(sensor_hub, PumpDriver::new(pump_pwm));
    hw.init()?;

    // ── 6. Run ────────────────────────────────────────────────
    let mut app = AppService::new(config);
    app.start(&mut host, &mut hw, &mut client, &clock);

    loop {
        app.poll(&mut host, &mut hw, &mut client, &clock);
        // One tick so the idle task can feed the task watchdog.
        FreeRtos::delay_ms(1);
    }
}
