//! Hobby servo driver over a 50 Hz PWM channel.
//!
//! Pulse width maps linearly from 544 µs at 0° to 2400 µs at 180°, the
//! range the damper linkage was set up with.

use embedded_hal::pwm::SetDutyCycle;
use log::warn;

const MIN_PULSE_US: u32 = 544;
const MAX_PULSE_US: u32 = 2_400;
/// 50 Hz frame.
const PERIOD_US: u32 = 20_000;

/// Convert an angle (0–180, saturating) to a duty value for a PWM channel
/// whose full scale is `max_duty`.
pub fn angle_to_duty(angle: u8, max_duty: u16) -> u16 {
    let angle = angle.min(180) as u32;
    let pulse_us = MIN_PULSE_US + (angle * (MAX_PULSE_US - MIN_PULSE_US)) / 180;
    ((pulse_us * max_duty as u32) / PERIOD_US) as u16
}

pub struct ServoDriver<P: SetDutyCycle> {
    pwm: P,
    angle: Option<u8>,
}

impl<P: SetDutyCycle> ServoDriver<P> {
    pub fn new(pwm: P) -> Self {
        Self { pwm, angle: None }
    }

    /// Command the servo.  A failed duty write is logged; the last good
    /// angle is kept.
    pub fn set_angle(&mut self, angle: u8) {
        let angle = angle.min(180);
        let duty = angle_to_duty(angle, self.pwm.max_duty_cycle());
        match self.pwm.set_duty_cycle(duty) {
            Ok(()) => self.angle = Some(angle),
            Err(e) => warn!("Servo: duty write failed: {:?}", e),
        }
    }

    /// Last commanded angle, `None` before the first move.
    pub fn angle(&self) -> Option<u8> {
        self.angle
    }

    pub fn pwm(&self) -> &P {
        &self.pwm
    }
}
