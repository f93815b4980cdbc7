//! AirVent Firmware — Main Entry Point
//!
//! Hexagonal architecture around a single cooperative poll loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter      IrReceiver     NvsAdapter   LogEventSink │
//! │  (Servo+Relay+LED     (Decoder)      (Limits+     (EventSink)  │
//! │   +Clock)                             Config)                  │
//! │  WifiAdapter          ThingSpeakClient                         │
//! │  (Connectivity)       (Telemetry)                              │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Actuator · Calibration · Connectivity · Indicator     │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::prelude::Peripherals;
use log::{error, info, warn};

use airvent::adapters::hardware::HardwareAdapter;
use airvent::adapters::log_sink::LogEventSink;
use airvent::adapters::nvs::NvsAdapter;
use airvent::adapters::thingspeak::ThingSpeakClient;
use airvent::adapters::time::{SystemClock, halt, monotonic_us};
use airvent::adapters::wifi::WifiAdapter;
use airvent::app::ports::ConfigPort;
use airvent::app::service::AppService;
use airvent::config::DeviceConfig;
use airvent::drivers::hw_init::{self, GpioOutput, LedcPwm};
use airvent::drivers::ir_receiver::{IR_EDGES, IrReceiver};
use airvent::drivers::relay::RelayDriver;
use airvent::drivers::servo::ServoDriver;
use airvent::drivers::status_led::StatusLed;
use airvent::drivers::watchdog::Watchdog;
use airvent::error::Error;
use airvent::pins;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  AirVent v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Peripherals ────────────────────────────────────────
    if let Err(e) = hw_init::init_peripherals().map_err(Error::from) {
        // No relay or servo outputs to drive.
        halt(&e, FreeRtos::delay_ms);
    }
    if let Err(e) = hw_init::init_isr_service() {
        error!("{}, remote control disabled", Error::from(e));
    }

    // ── 3. Persistent state ───────────────────────────────────
    let mut nvs = NvsAdapter::new().map_err(Error::from)?;
    let config = match nvs.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("{}, using defaults", Error::from(e));
            DeviceConfig::default()
        }
    };

    // ── 4. Adapters ───────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let mut wifi = WifiAdapter::new(peripherals.modem, sysloop, config.network.hostname.as_str())?;
    let mut cloud = ThingSpeakClient::new();

    let mut hw = HardwareAdapter::new(
        ServoDriver::new(LedcPwm::new(pins::SERVO_LEDC_CHANNEL, pins::SERVO_PWM_RESOLUTION_BITS)),
        RelayDriver::new(GpioOutput::new(pins::RELAY_GPIO)),
        StatusLed::new(GpioOutput::new(pins::LED_GPIO), pins::LED_ACTIVE_LOW),
        SystemClock::new(Watchdog::default()),
    );
    let mut ir = IrReceiver::new(&IR_EDGES, monotonic_us);
    let mut log_sink = LogEventSink::new();

    // ── 5. App service ────────────────────────────────────────
    let mut app = AppService::new(config, &nvs);
    app.start(&mut hw, &mut log_sink);

    info!("System ready. Entering event loop.");

    // ── 6. Event loop ─────────────────────────────────────────
    loop {
        app.poll(&mut hw, &mut ir, &mut wifi, &mut nvs, &mut log_sink);
        app.poll_telemetry(hw.clock(), &wifi, &mut cloud, &mut log_sink);
    }
}
