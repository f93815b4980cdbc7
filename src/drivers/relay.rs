//! Servo supply relay.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: the pin is a [`GpioOutput`](super::hw_init::GpioOutput).
//! On host/test: any `OutputPin` mock.

use embedded_hal::digital::OutputPin;
use log::warn;

pub struct RelayDriver<P: OutputPin> {
    pin: P,
    on: bool,
}

impl<P: OutputPin> RelayDriver<P> {
    pub fn new(pin: P) -> Self {
        Self { pin, on: false }
    }

    pub fn set(&mut self, on: bool) {
        let result = if on { self.pin.set_high() } else { self.pin.set_low() };
        match result {
            Ok(()) => self.on = on,
            Err(e) => warn!("Relay: pin write failed: {:?}", e),
        }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}
