//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (IR receiver, servo, relay, LED, store, WiFi, cloud)
//! implement these traits.  The [`AppService`](super::service::AppService)
//! consumes them via generics, so the domain core never touches hardware
//! directly.

use core::fmt;

use crate::config::DeviceConfig;

use super::keymap::DecodedSignal;

// ───────────────────────────────────────────────────────────────
// Decoder port (driven adapter: IR receiver → domain)
// ───────────────────────────────────────────────────────────────

/// Source of decoded remote-control frames.
///
/// After `try_decode` yields a frame the receiver holds its buffer until
/// `resume` is called.  The service wraps the pair in a scope guard so
/// every dispatch path resumes exactly once.
pub trait DecoderPort {
    fn try_decode(&mut self) -> Option<DecodedSignal>;
    fn resume(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Actuator ports (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Damper servo.  Commands are assumed to succeed.
pub trait ServoPort {
    /// Move to `degrees` (0–180).
    fn set_angle(&mut self, degrees: u8);
}

/// Auxiliary relay gating the servo supply.
pub trait RelayPort {
    fn set_relay(&mut self, on: bool);
}

/// Single status LED.  `lit` is the visible state; polarity is the
/// adapter's concern.
pub trait IndicatorPort {
    fn set_indicator(&mut self, lit: bool);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time plus the two blocking primitives used by the bounded
/// wait loops.
pub trait ClockPort {
    /// Milliseconds since boot.
    fn now_ms(&self) -> u64;

    /// Block for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);

    /// Cooperative yield inside a busy-wait loop (feeds the watchdog).
    fn yield_now(&mut self);
}

/// Everything the service drives on the board itself.
pub trait Board: ServoPort + RelayPort + IndicatorPort + ClockPort {}

impl<T: ServoPort + RelayPort + IndicatorPort + ClockPort> Board for T {}

// ───────────────────────────────────────────────────────────────
// Limit store port (driven adapter: domain ↔ flash)
// ───────────────────────────────────────────────────────────────

/// Slot holding the closed limit.
pub const SLOT_CLOSED: usize = 0;
/// Slot holding the open limit.
pub const SLOT_OPEN: usize = 1;

/// EEPROM-style byte store.  Writes are staged until `commit`.
pub trait LimitStorePort {
    fn read_byte(&self, slot: usize) -> u8;
    fn write_byte(&mut self, slot: usize, value: u8);
    fn commit(&mut self) -> Result<(), StoreError>;
}

// ───────────────────────────────────────────────────────────────
// Connectivity port (driven adapter: domain ↔ WiFi station)
// ───────────────────────────────────────────────────────────────

/// Link state as reported by the station driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Connected,
    WrongCredentials,
    /// Idle, associating, or dropped for any other reason.
    Disconnected,
}

pub trait ConnectivityPort {
    /// Start association.  Returns once the request is issued; progress
    /// is observed through [`status`](Self::status).
    fn connect(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError>;

    fn disconnect(&mut self);

    /// Re-issue association with the last credentials.
    fn reconnect(&mut self);

    fn status(&self) -> LinkStatus;

    fn is_connected(&self) -> bool {
        self.status() == LinkStatus::Connected
    }
}

// ───────────────────────────────────────────────────────────────
// Telemetry port (driven adapter: domain ↔ cloud)
// ───────────────────────────────────────────────────────────────

/// One value read back from the telemetry channel.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldReading {
    pub value: f32,
    /// Server timestamp of the entry (ISO-8601).
    pub created_at: heapless::String<32>,
}

pub trait TelemetryPort {
    fn read_field(
        &mut self,
        channel: u32,
        field: u8,
        api_key: &str,
    ) -> Result<FieldReading, TelemetryError>;

    /// HTTP status of the most recent request (0 before the first one).
    fn last_status(&self) -> u16;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists device configuration.
///
/// Implementations MUST validate before persisting and return
/// [`ConfigError::ValidationFailed`] instead of clamping.
pub trait ConfigPort {
    /// Returns [`DeviceConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<DeviceConfig, ConfigError>;

    fn save(&self, config: &DeviceConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    IoError,
}

/// Errors from [`LimitStorePort::commit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    CommitFailed,
    IoError,
}

/// Errors from association attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    /// SSID or password is empty.
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    WrongCredentials,
    /// Not associated within the connect timeout.
    Timeout,
    /// The driver refused the request.
    ConnectionFailed,
}

/// Errors from [`TelemetryPort`] and the telemetry poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryError {
    NotConnected,
    /// Called again before the minimum interval elapsed.
    RateLimited,
    /// Non-200 HTTP status.
    Status(u16),
    /// Body missing or not a number.
    Malformed,
    Transport,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CommitFailed => write!(f, "commit failed"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes)"),
            Self::WrongCredentials => write!(f, "access point rejected credentials"),
            Self::Timeout => write!(f, "association timed out"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
        }
    }
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "link down"),
            Self::RateLimited => write!(f, "rate limited"),
            Self::Status(code) => write!(f, "HTTP status {}", code),
            Self::Malformed => write!(f, "malformed response"),
            Self::Transport => write!(f, "transport error"),
        }
    }
}
