//! GPIO / peripheral pin assignments for the AirVent controller board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Damper servo (LEDC PWM)
// ---------------------------------------------------------------------------

/// Servo signal line.
pub const SERVO_GPIO: i32 = 18;
/// LEDC channel driving the servo.
pub const SERVO_LEDC_CHANNEL: u32 = 0;
/// Standard hobby-servo frame rate.
pub const SERVO_PWM_FREQ_HZ: u32 = 50;
/// LEDC resolution for the servo timer.  14 bits gives ~1.2 µs steps at 50 Hz.
pub const SERVO_PWM_RESOLUTION_BITS: u32 = 14;

// ---------------------------------------------------------------------------
// Relay (servo supply)
// ---------------------------------------------------------------------------

/// Digital output: HIGH = relay energised.
pub const RELAY_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// Status LED
// ---------------------------------------------------------------------------

/// Status LED, wired to 3V3 through a resistor.
pub const LED_GPIO: i32 = 2;
/// LED lights when the pin is driven LOW.
pub const LED_ACTIVE_LOW: bool = true;

// ---------------------------------------------------------------------------
// IR receiver (TSOP38238 demodulated output, idles HIGH)
// ---------------------------------------------------------------------------

/// Demodulated IR input, interrupt on both edges.
pub const IR_RX_GPIO: i32 = 27;
