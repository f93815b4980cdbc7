//! Status LED state.
//!
//! ## Priority (highest first)
//!
//! 1. **Session hold**: solid on while a modal session owns the remote
//! 2. **Fault**: square-wave blink, 250 ms half-period
//! 3. **Idle**: off
//!
//! The connectivity controller also toggles the LED directly on each
//! association poll; the next housekeeping tick restores the mode above.

use super::ports::IndicatorPort;

/// Display mode selected by [`StatusIndicator::mode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorMode {
    Off,
    Blink,
    Solid,
}

#[derive(Debug, Clone)]
pub struct StatusIndicator {
    lit: bool,
    held: bool,
    blinking: bool,
    last_toggle_ms: u64,
    interval_ms: u64,
}

impl StatusIndicator {
    pub fn new(interval_ms: u32) -> Self {
        Self {
            lit: false,
            held: false,
            blinking: false,
            last_toggle_ms: 0,
            interval_ms: interval_ms as u64,
        }
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }

    pub fn mode(&self) -> IndicatorMode {
        if self.held {
            IndicatorMode::Solid
        } else if self.blinking {
            IndicatorMode::Blink
        } else {
            IndicatorMode::Off
        }
    }

    /// Solid on until [`release`](Self::release).
    pub fn hold(&mut self, hw: &mut impl IndicatorPort) {
        self.held = true;
        self.set(true, hw);
    }

    /// Drop the session hold and switch off; blinking resumes on the next
    /// tick if a fault is still raised.
    pub fn release(&mut self, hw: &mut impl IndicatorPort) {
        self.held = false;
        self.set(false, hw);
    }

    /// Invert the LED immediately.
    pub fn toggle(&mut self, hw: &mut impl IndicatorPort) {
        self.set(!self.lit, hw);
    }

    /// Housekeeping: advance the blink phase while `fault` is raised,
    /// otherwise make sure the LED is off.
    pub fn tick(&mut self, now_ms: u64, fault: bool, hw: &mut impl IndicatorPort) {
        if self.held {
            return;
        }
        if !fault {
            self.blinking = false;
            if self.lit {
                self.set(false, hw);
            }
            return;
        }
        if !self.blinking {
            self.blinking = true;
            self.last_toggle_ms = now_ms;
            self.set(true, hw);
            return;
        }
        if now_ms.saturating_sub(self.last_toggle_ms) >= self.interval_ms {
            self.last_toggle_ms = now_ms;
            self.toggle(hw);
        }
    }

    fn set(&mut self, lit: bool, hw: &mut impl IndicatorPort) {
        self.lit = lit;
        hw.set_indicator(lit);
    }
}
