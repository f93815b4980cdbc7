//! Rate-limited cloud reading.
//!
//! Diagnostic only: readings are reported as events and never steer the
//! damper.

use log::{debug, warn};

use crate::config::TelemetryConfig;

use super::ports::{ConnectivityPort, FieldReading, TelemetryError, TelemetryPort};

#[derive(Debug, Clone)]
pub struct TelemetryPoller {
    interval_ms: u64,
    last_fetch_ms: Option<u64>,
    last_status: u16,
}

impl TelemetryPoller {
    pub fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms: interval_ms as u64,
            last_fetch_ms: None,
            last_status: 0,
        }
    }

    /// HTTP status of the last attempted read (0 before the first).
    pub fn last_status(&self) -> u16 {
        self.last_status
    }

    /// Whether a read would be allowed at `now_ms`.
    pub fn is_due(&self, now_ms: u64) -> bool {
        self.last_fetch_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= self.interval_ms)
    }

    /// Read the configured field.  The first call is allowed immediately,
    /// later calls at most once per interval.  A refused call does not
    /// restart the interval.
    pub fn fetch(
        &mut self,
        now_ms: u64,
        cfg: &TelemetryConfig,
        link: &impl ConnectivityPort,
        cloud: &mut impl TelemetryPort,
    ) -> Result<FieldReading, TelemetryError> {
        if !link.is_connected() {
            return Err(TelemetryError::NotConnected);
        }
        if !self.is_due(now_ms) {
            return Err(TelemetryError::RateLimited);
        }
        self.last_fetch_ms = Some(now_ms);

        let result = cloud.read_field(cfg.channel_id, cfg.field, cfg.read_api_key.as_str());
        self.last_status = cloud.last_status();
        match &result {
            Ok(r) => debug!("Telemetry: field {} = {} ({})", cfg.field, r.value, r.created_at),
            Err(e) => warn!("Telemetry: read failed: {} (status {})", e, self.last_status),
        }
        result
    }
}
