//! Device configuration parameters.
//!
//! Timing constants, motion steps, and the credentials for the optional
//! network features.  Credentials default from the build environment
//! (`AIRVENT_WIFI_SSID`, `AIRVENT_WIFI_PASSWORD`, `AIRVENT_TS_CHANNEL`,
//! `AIRVENT_TS_FIELD`, `AIRVENT_TS_READ_KEY`) and can be overridden by a
//! config blob in NVS.

use heapless::String;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

pub const SSID_CAP: usize = 32;
pub const PASSWORD_CAP: usize = 64;
pub const API_KEY_CAP: usize = 32;

const fn env_len(value: Option<&str>) -> usize {
    match value {
        Some(s) => s.len(),
        None => 0,
    }
}

// Over-long build credentials fail the build instead of being cut short.
const _: () = assert!(
    env_len(option_env!("AIRVENT_WIFI_SSID")) <= SSID_CAP,
    "AIRVENT_WIFI_SSID is longer than 32 bytes"
);
const _: () = assert!(
    env_len(option_env!("AIRVENT_WIFI_PASSWORD")) <= PASSWORD_CAP,
    "AIRVENT_WIFI_PASSWORD is longer than 64 bytes"
);
const _: () = assert!(
    env_len(option_env!("AIRVENT_TS_READ_KEY")) <= API_KEY_CAP,
    "AIRVENT_TS_READ_KEY is longer than 32 bytes"
);

/// Loop and session timing, plus motion step sizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Relay is released this long after the last motion command.
    pub relay_idle_ms: u32,
    /// Delay between engaging the relay and commanding the servo.
    pub relay_settle_ms: u32,
    /// Status LED blink half-period while a fault is raised.
    pub blink_interval_ms: u32,
    /// Window for the calibration confirm key.
    pub confirm_window_ms: u32,
    /// Association gives up after this long.
    pub connect_timeout_ms: u32,
    /// Association status poll period.
    pub connect_poll_ms: u32,
    /// Minimum spacing of keep-alive reconnect attempts.
    pub reconnect_interval_ms: u32,
    /// Minimum spacing of telemetry reads.
    pub telemetry_interval_ms: u32,

    // --- Motion ---
    /// UP/DOWN step in normal mode (degrees).
    pub step_deg: u8,
    /// Small calibration step (degrees).
    pub fine_step_deg: u8,
    /// Large calibration step (degrees).
    pub coarse_step_deg: u8,
    /// Servo position when calibration adjustment starts.
    pub calibration_midpoint_deg: u8,
    /// Logical damper position at boot.
    pub initial_angle_deg: u8,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            relay_idle_ms: 3_000,
            relay_settle_ms: 100,
            blink_interval_ms: 250,
            confirm_window_ms: 2_000,
            connect_timeout_ms: 10_000,
            connect_poll_ms: 1_000,
            reconnect_interval_ms: 5_000,
            telemetry_interval_ms: 15_000,

            step_deg: 5,
            fine_step_deg: 1,
            coarse_step_deg: 5,
            calibration_midpoint_deg: 90,
            initial_angle_deg: 90,
        }
    }
}

/// WiFi station settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub ssid: String<SSID_CAP>,
    pub password: String<PASSWORD_CAP>,
    pub hostname: String<32>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            ssid: bounded(option_env!("AIRVENT_WIFI_SSID").unwrap_or("")),
            password: bounded(option_env!("AIRVENT_WIFI_PASSWORD").unwrap_or("")),
            hostname: bounded("airvent"),
        }
    }
}

/// ThingSpeak channel used for the environment reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub channel_id: u32,
    pub field: u8,
    pub read_api_key: String<API_KEY_CAP>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            channel_id: option_env!("AIRVENT_TS_CHANNEL")
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            field: option_env!("AIRVENT_TS_FIELD")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1),
            read_api_key: bounded(option_env!("AIRVENT_TS_READ_KEY").unwrap_or("")),
        }
    }
}

/// Complete device configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub timing: TimingConfig,
    pub network: NetworkConfig,
    pub telemetry: TelemetryConfig,
}

impl DeviceConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.timing;
        if t.relay_idle_ms == 0 || t.blink_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "relay_idle_ms and blink_interval_ms must be non-zero",
            ));
        }
        if t.relay_settle_ms >= t.relay_idle_ms {
            return Err(ConfigError::ValidationFailed(
                "relay_settle_ms must be shorter than relay_idle_ms",
            ));
        }
        if t.connect_poll_ms == 0 || t.connect_poll_ms >= t.connect_timeout_ms {
            return Err(ConfigError::ValidationFailed(
                "connect_poll_ms must be 1..connect_timeout_ms",
            ));
        }
        if t.confirm_window_ms == 0 {
            return Err(ConfigError::ValidationFailed("confirm_window_ms must be non-zero"));
        }
        if t.step_deg == 0 || t.fine_step_deg == 0 || t.coarse_step_deg == 0 {
            return Err(ConfigError::ValidationFailed("step sizes must be non-zero"));
        }
        if t.step_deg > 90 || t.coarse_step_deg > 90 {
            return Err(ConfigError::ValidationFailed("step sizes must be at most 90"));
        }
        if t.calibration_midpoint_deg > 180 || t.initial_angle_deg > 180 {
            return Err(ConfigError::ValidationFailed("angles must be 0–180"));
        }
        if self.telemetry.field == 0 || self.telemetry.field > 8 {
            return Err(ConfigError::ValidationFailed("telemetry field must be 1–8"));
        }
        Ok(())
    }
}

/// Copy `s` into a fixed-capacity string, or fail if it does not fit.
pub fn try_bounded<const N: usize>(s: &str) -> Result<String<N>, ConfigError> {
    String::try_from(s).map_err(|_| ConfigError::ValidationFailed("value exceeds field capacity"))
}

/// Copy `s` into a fixed-capacity string, truncating at capacity with a
/// warning.
pub fn bounded<const N: usize>(s: &str) -> String<N> {
    if let Ok(out) = try_bounded(s) {
        return out;
    }
    warn!("config: {}-byte value truncated to {} bytes", s.len(), N);
    let mut out = String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
