//! Limit calibration session.
//!
//! Two-phase state machine that owns key dispatch while it is active.
//! It is pure: the service feeds it keys and clock ticks and applies the
//! returned [`Step`] to the hardware and the limit store.
//!
//! ```text
//!                 confirm key                 UP / DOWN
//!  AwaitingConfirm ──────────▶ Adjusting ─────────────────▶ Committed
//!        │  other key / 2 s        │ OFF
//!        ▼                         ▼
//!    Cancelled                  Aborted
//! ```
//!
//! Phase 1 guards against a stray press wiping the limits.  Phase 2 is
//! unbounded and clamps to the full servo range, since its purpose is to
//! find the limits.

use log::{debug, info};

use crate::config::TimingConfig;

use super::actuator::SERVO_MAX_DEG;
use super::keymap::RemoteKey;

/// Key that approves entering adjustment.
pub const CONFIRM_KEY: RemoteKey = RemoteKey::Smooth;

/// A frame of the accepted protocol, as seen by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionInput {
    Key(RemoteKey),
    /// Code not in the key map.
    Unmapped,
}

/// Which persisted limit a commit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitSlot {
    Closed,
    Open,
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Phase 1: a key other than confirm was pressed.
    Cancelled,
    /// Phase 1: confirm window expired.
    TimedOut,
    /// Phase 2: cancel key.
    Aborted,
}

/// What the service must do after feeding the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Nothing to apply.
    Stay,
    /// Phase 2 entered: engage relay and move to `midpoint`.
    Approved { midpoint: u8 },
    /// Working angle changed: move servo.
    Nudged(u8),
    /// Persist `angle` as `slot` and end the session.  If the service
    /// rejects the value the session remains in adjustment.
    Commit { slot: LimitSlot, angle: u8 },
    /// Session over without persistence.
    Finished(SessionEnd),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingConfirm { deadline_ms: u64 },
    Adjusting { working: u8 },
}

/// Transient state of one calibration invocation.
#[derive(Debug, Clone)]
pub struct CalibrationSession {
    phase: Phase,
    fine: i16,
    coarse: i16,
    midpoint: u8,
}

impl CalibrationSession {
    /// Open the confirm window at `now_ms`.
    pub fn begin(now_ms: u64, timing: &TimingConfig) -> Self {
        info!("Calibration: awaiting confirm ({} ms)", timing.confirm_window_ms);
        Self {
            phase: Phase::AwaitingConfirm {
                deadline_ms: now_ms + timing.confirm_window_ms as u64,
            },
            fine: timing.fine_step_deg as i16,
            coarse: timing.coarse_step_deg as i16,
            midpoint: timing.calibration_midpoint_deg.min(SERVO_MAX_DEG),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_approved(&self) -> bool {
        matches!(self.phase, Phase::Adjusting { .. })
    }

    /// Working angle during adjustment.
    pub fn working_angle(&self) -> Option<u8> {
        match self.phase {
            Phase::Adjusting { working } => Some(working),
            Phase::AwaitingConfirm { .. } => None,
        }
    }

    /// Expire the confirm window.  Adjustment never times out.
    pub fn on_tick(&mut self, now_ms: u64) -> Step {
        match self.phase {
            Phase::AwaitingConfirm { deadline_ms } if now_ms > deadline_ms => {
                info!("Calibration: confirm window expired");
                Step::Finished(SessionEnd::TimedOut)
            }
            _ => Step::Stay,
        }
    }

    /// Feed one accepted-protocol frame.
    pub fn on_input(&mut self, input: SessionInput) -> Step {
        match self.phase {
            Phase::AwaitingConfirm { .. } => {
                if input == SessionInput::Key(CONFIRM_KEY) {
                    self.phase = Phase::Adjusting { working: self.midpoint };
                    info!("Calibration: approved, adjusting from {}°", self.midpoint);
                    Step::Approved { midpoint: self.midpoint }
                } else {
                    info!("Calibration: cancelled by {:?}", input);
                    Step::Finished(SessionEnd::Cancelled)
                }
            }
            Phase::Adjusting { working } => {
                let SessionInput::Key(key) = input else {
                    return Step::Stay;
                };
                match key {
                    RemoteKey::Up => Step::Commit { slot: LimitSlot::Open, angle: working },
                    RemoteKey::Down => Step::Commit { slot: LimitSlot::Closed, angle: working },
                    RemoteKey::Off => {
                        info!("Calibration: aborted at {}°", working);
                        Step::Finished(SessionEnd::Aborted)
                    }
                    RemoteKey::Flash => self.nudge(working, self.coarse),
                    RemoteKey::Strobe => self.nudge(working, self.fine),
                    RemoteKey::Fade => self.nudge(working, -self.fine),
                    RemoteKey::Smooth => self.nudge(working, -self.coarse),
                    _ => Step::Stay,
                }
            }
        }
    }

    fn nudge(&mut self, working: u8, delta: i16) -> Step {
        let next = (working as i16 + delta).clamp(0, SERVO_MAX_DEG as i16) as u8;
        self.phase = Phase::Adjusting { working: next };
        debug!("Calibration: {:+} -> {}°", delta, next);
        Step::Nudged(next)
    }
}
