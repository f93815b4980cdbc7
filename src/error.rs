//! Unified error types for the AirVent firmware.
//!
//! A single `Error` enum that every subsystem converts into keeps the
//! top-level error handling uniform.  Runtime faults that the user should
//! see on the status LED are tracked separately as a [`FaultFlags`]
//! bitmask so connectivity and persistence problems stay distinguishable.

use core::fmt;

use crate::app::keymap::Protocol;
use crate::app::ports::{ConfigError, ConnectivityError, StoreError, TelemetryError};
use crate::drivers::hw_init::HwInitError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Network association or link management failed.
    Connectivity(ConnectivityError),
    /// The limit store could not be written or committed.
    Persistence(StoreError),
    /// A cloud telemetry read failed.
    Telemetry(TelemetryError),
    /// Peripheral initialisation failed.
    Init(HwInitError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connectivity(e) => write!(f, "connectivity: {e}"),
            Self::Persistence(e) => write!(f, "persistence: {e}"),
            Self::Telemetry(e) => write!(f, "telemetry: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<ConnectivityError> for Error {
    fn from(e: ConnectivityError) -> Self {
        Self::Connectivity(e)
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::Persistence(e)
    }
}

impl From<TelemetryError> for Error {
    fn from(e: TelemetryError) -> Self {
        Self::Telemetry(e)
    }
}

impl From<HwInitError> for Error {
    fn from(e: HwInitError) -> Self {
        Self::Init(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// User-visible faults
// ---------------------------------------------------------------------------

/// Faults surfaced through the status LED blink.  Accumulated in a
/// bitfield so each can be raised and cleared by its own subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Fault {
    /// Wrong credentials, empty credentials, or association timeout.
    Connectivity = 0b0000_0001,
    /// Limit store commit failed; memory and flash may disagree.
    Persistence = 0b0000_0010,
}

impl Fault {
    /// Return the bitmask for this fault.
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connectivity => write!(f, "connectivity failure"),
            Self::Persistence => write!(f, "persistence failure"),
        }
    }
}

/// Set of currently raised [`Fault`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultFlags(u8);

impl FaultFlags {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn raise(&mut self, fault: Fault) {
        self.0 |= fault.mask();
    }

    pub fn clear(&mut self, fault: Fault) {
        self.0 &= !fault.mask();
    }

    pub fn contains(self, fault: Fault) -> bool {
        self.0 & fault.mask() != 0
    }

    pub fn any(self) -> bool {
        self.0 != 0
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Ignored decode outcomes
// ---------------------------------------------------------------------------

/// A decoded frame that was deliberately not dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredSignal {
    /// Accepted protocol, but the code is not in the key map.
    Unrecognized(u64),
    /// Frame from a protocol family the controller does not accept.
    ProtocolMismatch(Protocol),
}

impl fmt::Display for IgnoredSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unrecognized(code) => write!(f, "unrecognized code 0x{code:06X}"),
            Self::ProtocolMismatch(p) => write!(f, "unsupported protocol {p:?}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
