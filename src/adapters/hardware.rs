//! Hardware adapter — bridges the board's peripherals to domain port traits.
//!
//! Owns the servo, relay and LED drivers plus the system clock, so the
//! service sees a single [`Board`](crate::app::ports::Board).  Generic over
//! the `embedded-hal` pin types; `main` plugs in the LEDC/GPIO wrappers
//! from [`hw_init`](crate::drivers::hw_init).

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;

use crate::adapters::time::SystemClock;
use crate::app::ports::{ClockPort, IndicatorPort, RelayPort, ServoPort};
use crate::drivers::relay::RelayDriver;
use crate::drivers::servo::ServoDriver;
use crate::drivers::status_led::StatusLed;

pub struct HardwareAdapter<S: SetDutyCycle, R: OutputPin, L: OutputPin> {
    servo: ServoDriver<S>,
    relay: RelayDriver<R>,
    led: StatusLed<L>,
    clock: SystemClock,
}

impl<S: SetDutyCycle, R: OutputPin, L: OutputPin> HardwareAdapter<S, R, L> {
    pub fn new(
        servo: ServoDriver<S>,
        relay: RelayDriver<R>,
        led: StatusLed<L>,
        clock: SystemClock,
    ) -> Self {
        Self {
            servo,
            relay,
            led,
            clock,
        }
    }

    pub fn servo_angle(&self) -> Option<u8> {
        self.servo.angle()
    }

    pub fn relay_on(&self) -> bool {
        self.relay.is_on()
    }

    pub fn led_lit(&self) -> bool {
        self.led.is_lit()
    }

    pub fn clock(&self) -> &SystemClock {
        &self.clock
    }
}

// ── Actuator ports ────────────────────────────────────────────

impl<S: SetDutyCycle, R: OutputPin, L: OutputPin> ServoPort for HardwareAdapter<S, R, L> {
    fn set_angle(&mut self, degrees: u8) {
        self.servo.set_angle(degrees);
    }
}

impl<S: SetDutyCycle, R: OutputPin, L: OutputPin> RelayPort for HardwareAdapter<S, R, L> {
    fn set_relay(&mut self, on: bool) {
        self.relay.set(on);
    }
}

impl<S: SetDutyCycle, R: OutputPin, L: OutputPin> IndicatorPort for HardwareAdapter<S, R, L> {
    fn set_indicator(&mut self, lit: bool) {
        self.led.set(lit);
    }
}

// ── Clock port ────────────────────────────────────────────────

impl<S: SetDutyCycle, R: OutputPin, L: OutputPin> ClockPort for HardwareAdapter<S, R, L> {
    fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    fn delay_ms(&mut self, ms: u32) {
        self.clock.delay_ms(ms);
    }

    fn yield_now(&mut self) {
        self.clock.yield_now();
    }
}
