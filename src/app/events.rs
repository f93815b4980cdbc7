//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use crate::error::{Fault, IgnoredSignal};

use super::calibration::{LimitSlot, SessionEnd};
use super::ports::{ConnectivityError, FieldReading, StoreError};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Service started with the loaded limits.
    Started { closed: u8, open: u8, angle: u8 },

    /// Servo commanded to a new damper position.
    Moved { angle: u8 },

    /// Relay released by the idle timer.
    RelayReleased,

    /// Calibration confirm window opened.
    CalibrationStarted,
    /// Confirm key received; adjustment running from `midpoint`.
    CalibrationApproved { midpoint: u8 },
    /// Working angle changed during adjustment.
    CalibrationNudged { angle: u8 },
    /// Limit written.  `persisted` is false when the store commit failed.
    LimitCommitted { slot: LimitSlot, angle: u8, persisted: bool },
    /// Commit refused because it would invert closed/open.
    LimitRejected { slot: LimitSlot, angle: u8 },
    /// Session ended without persistence.
    CalibrationEnded(SessionEnd),

    /// Env-control selector opened.
    EnvSelectStarted,
    /// Env-control flag chosen.
    EnvControlChanged(bool),

    Connected,
    Disconnected,
    ConnectFailed(ConnectivityError),
    /// Keep-alive re-association issued.
    Reconnecting,

    FaultRaised(Fault),
    FaultCleared(Fault),
    PersistFailed(StoreError),

    /// Decoded frame that was not dispatched.
    SignalIgnored(IgnoredSignal),

    /// Cloud field reading.
    SensorReading(FieldReading),
}
