//! System clock adapter.
//!
//! Implements [`ClockPort`] for the main task.
//!
//! - **`target_os = "espidf"`**: wraps `esp_timer_get_time()` (microsecond,
//!   monotonic) and FreeRTOS delays.
//! - **`not(target_os = "espidf")`**: uses `std::time::Instant` and
//!   `std::thread::sleep` for host-side simulation.
//!
//! Every delay and yield feeds the task watchdog.

use core::fmt::Display;

use log::error;

use crate::app::ports::ClockPort;
use crate::drivers::watchdog::Watchdog;

/// Period of the reminder logged while halted.
pub const HALT_LOG_INTERVAL_MS: u32 = 10_000;

/// Microseconds since boot.  Plain function so ISR-side consumers can hold
/// it as a `fn() -> u64`.
#[cfg(target_os = "espidf")]
pub fn monotonic_us() -> u64 {
    (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
}

/// Microseconds since the first call.
#[cfg(not(target_os = "espidf"))]
pub fn monotonic_us() -> u64 {
    use std::sync::OnceLock;
    static START: OnceLock<std::time::Instant> = OnceLock::new();
    START.get_or_init(std::time::Instant::now).elapsed().as_micros() as u64
}

/// Park the task forever after an unrecoverable error.  Every round blocks
/// in `delay_ms`, so the idle task keeps running.
pub fn halt(reason: &dyn Display, mut delay_ms: impl FnMut(u32)) -> ! {
    error!("{}, halting", reason);
    loop {
        delay_ms(HALT_LOG_INTERVAL_MS);
        error!("halted: {}", reason);
    }
}

pub struct SystemClock {
    watchdog: Watchdog,
}

impl SystemClock {
    pub fn new(watchdog: Watchdog) -> Self {
        Self { watchdog }
    }

    pub fn uptime_secs(&self) -> u64 {
        monotonic_us() / 1_000_000
    }

    pub fn watchdog(&self) -> &Watchdog {
        &self.watchdog
    }
}

impl ClockPort for SystemClock {
    fn now_ms(&self) -> u64 {
        monotonic_us() / 1_000
    }

    #[cfg(target_os = "espidf")]
    fn delay_ms(&mut self, ms: u32) {
        self.watchdog.feed();
        esp_idf_hal::delay::FreeRtos::delay_ms(ms);
    }

    #[cfg(not(target_os = "espidf"))]
    fn delay_ms(&mut self, ms: u32) {
        self.watchdog.feed();
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }

    fn yield_now(&mut self) {
        self.watchdog.feed();
        // One tick lets IDLE run and the WiFi task make progress.
        #[cfg(target_os = "espidf")]
        esp_idf_hal::delay::FreeRtos::delay_ms(1);
        #[cfg(not(target_os = "espidf"))]
        std::thread::yield_now();
    }
}
