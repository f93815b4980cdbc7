//! Single-colour status LED.
//!
//! Polarity is resolved here so the rest of the firmware only deals with
//! "lit" / "dark".

use embedded_hal::digital::OutputPin;
use log::warn;

pub struct StatusLed<P: OutputPin> {
    pin: P,
    active_low: bool,
    lit: bool,
}

impl<P: OutputPin> StatusLed<P> {
    pub fn new(pin: P, active_low: bool) -> Self {
        Self { pin, active_low, lit: false }
    }

    pub fn set(&mut self, lit: bool) {
        let high = lit != self.active_low;
        let result = if high { self.pin.set_high() } else { self.pin.set_low() };
        match result {
            Ok(()) => self.lit = lit,
            Err(e) => warn!("StatusLed: pin write failed: {:?}", e),
        }
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }
}
