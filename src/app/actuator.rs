//! Damper actuator: angle limits, servo positioning, relay auto-off.
//!
//! The relay gates the servo supply.  Every motion engages it and restarts
//! the idle window; [`ActuatorController::tick_idle_relay`] releases it once
//! the window expires.
//!
//! ```text
//!   move_by / move_to ──▶ relay ON ──(settle)──▶ servo
//!                              │
//!        tick_idle_relay ──────┴──(idle ≥ 3 s)──▶ relay OFF
//! ```

use log::{debug, warn};

use crate::config::TimingConfig;

use super::ports::{ClockPort, LimitStorePort, RelayPort, ServoPort, SLOT_CLOSED, SLOT_OPEN};

/// Full mechanical servo range.
pub const SERVO_MAX_DEG: u8 = 180;

// ───────────────────────────────────────────────────────────────
// AngleLimits
// ───────────────────────────────────────────────────────────────

/// Persisted damper travel limits.  Always `closed <= open <= 180`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AngleLimits {
    closed: u8,
    open: u8,
}

impl Default for AngleLimits {
    fn default() -> Self {
        Self { closed: 80, open: 100 }
    }
}

impl AngleLimits {
    /// Build limits, returning `None` if the pair breaks the ordering.
    pub fn new(closed: u8, open: u8) -> Option<Self> {
        (closed <= open && open <= SERVO_MAX_DEG).then_some(Self { closed, open })
    }

    /// Read both slots.  Erased or inconsistent flash falls back to the
    /// narrow default range.
    pub fn load(store: &impl LimitStorePort) -> Self {
        let closed = store.read_byte(SLOT_CLOSED);
        let open = store.read_byte(SLOT_OPEN);
        Self::new(closed, open).unwrap_or_else(|| {
            let fallback = Self::default();
            warn!(
                "Stored limits invalid (closed={}, open={}), using {}..{}",
                closed, open, fallback.closed, fallback.open
            );
            fallback
        })
    }

    pub fn closed(&self) -> u8 {
        self.closed
    }

    pub fn open(&self) -> u8 {
        self.open
    }

    /// Clamp `angle` into `[closed, open]`.
    pub fn clamp(&self, angle: i16) -> u8 {
        angle.clamp(self.closed as i16, self.open as i16) as u8
    }

    /// Replace the open limit if the result keeps the ordering.
    pub fn with_open(self, open: u8) -> Option<Self> {
        Self::new(self.closed, open)
    }

    /// Replace the closed limit if the result keeps the ordering.
    pub fn with_closed(self, closed: u8) -> Option<Self> {
        Self::new(closed, self.open)
    }
}

// ───────────────────────────────────────────────────────────────
// ActuatorController
// ───────────────────────────────────────────────────────────────

/// Logical damper position and relay timer.
#[derive(Debug, Clone)]
pub struct ActuatorController {
    current_angle: u8,
    relay_engaged: bool,
    relay_activated_at_ms: u64,
    relay_idle_ms: u64,
    settle_ms: u32,
}

impl ActuatorController {
    pub fn new(timing: &TimingConfig, limits: &AngleLimits) -> Self {
        Self {
            current_angle: limits.clamp(timing.initial_angle_deg as i16),
            relay_engaged: false,
            relay_activated_at_ms: 0,
            relay_idle_ms: timing.relay_idle_ms as u64,
            settle_ms: timing.relay_settle_ms,
        }
    }

    pub fn current_angle(&self) -> u8 {
        self.current_angle
    }

    pub fn relay_engaged(&self) -> bool {
        self.relay_engaged
    }

    /// Step by `delta` degrees, clamped to the limits.  Returns the new angle.
    pub fn move_by<H>(&mut self, delta: i16, limits: &AngleLimits, hw: &mut H) -> u8
    where
        H: ServoPort + RelayPort + ClockPort,
    {
        self.engage_relay(hw);
        self.current_angle = limits.clamp(self.current_angle as i16 + delta);
        hw.set_angle(self.current_angle);
        debug!("Actuator: move_by {:+} -> {}°", delta, self.current_angle);
        self.current_angle
    }

    /// Drive to an absolute angle.  The relay settles before the servo
    /// moves so it never draws current through an open contact.
    pub fn move_to<H>(&mut self, target: u8, limits: &AngleLimits, hw: &mut H) -> u8
    where
        H: ServoPort + RelayPort + ClockPort,
    {
        self.engage_relay(hw);
        hw.delay_ms(self.settle_ms);
        self.current_angle = limits.clamp(target as i16);
        hw.set_angle(self.current_angle);
        debug!("Actuator: move_to {}°", self.current_angle);
        self.current_angle
    }

    /// Release the relay once the idle window has elapsed.  Returns `true`
    /// on the iteration that releases it.
    pub fn tick_idle_relay(&mut self, now_ms: u64, hw: &mut impl RelayPort) -> bool {
        if self.relay_engaged && now_ms.saturating_sub(self.relay_activated_at_ms) >= self.relay_idle_ms {
            self.release_relay(hw);
            return true;
        }
        false
    }

    /// Engage the relay and restart the idle window.
    pub fn engage_relay<H>(&mut self, hw: &mut H)
    where
        H: RelayPort + ClockPort,
    {
        hw.set_relay(true);
        self.relay_engaged = true;
        self.relay_activated_at_ms = hw.now_ms();
    }

    pub fn release_relay(&mut self, hw: &mut impl RelayPort) {
        hw.set_relay(false);
        self.relay_engaged = false;
    }

    /// Command the servo without the limit clamp.  Calibration only; the
    /// caller restores the clamp with [`reclamp`](Self::reclamp).
    pub fn drive_unclamped(&mut self, angle: u8, hw: &mut impl ServoPort) {
        self.current_angle = angle.min(SERVO_MAX_DEG);
        hw.set_angle(self.current_angle);
    }

    /// Pull the logical position back inside new limits without moving.
    pub fn reclamp(&mut self, limits: &AngleLimits) {
        self.current_angle = limits.clamp(self.current_angle as i16);
    }
}
