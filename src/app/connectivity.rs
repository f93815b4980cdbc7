//! Connectivity controller.
//!
//! Thin policy layer over the WiFi station port: an enabled flag, bounded
//! association with LED feedback, and a keep-alive that re-associates when
//! the link drops.  Fault bookkeeping stays with the caller, which turns
//! the returned error into a raised [`Fault`](crate::error::Fault).

use log::{info, warn};

use crate::config::{NetworkConfig, TimingConfig};

use super::indicator::StatusIndicator;
use super::ports::{ClockPort, ConnectivityError, ConnectivityPort, IndicatorPort, LinkStatus};

#[derive(Debug, Clone)]
pub struct ConnectivityController {
    enabled: bool,
    last_reconnect_ms: Option<u64>,
    poll_ms: u32,
    timeout_ms: u64,
    reconnect_interval_ms: u64,
}

impl ConnectivityController {
    pub fn new(timing: &TimingConfig) -> Self {
        Self {
            enabled: false,
            last_reconnect_ms: None,
            poll_ms: timing.connect_poll_ms,
            timeout_ms: timing.connect_timeout_ms as u64,
            reconnect_interval_ms: timing.reconnect_interval_ms as u64,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Associate with the configured network.
    ///
    /// Blocks for at most the connect timeout, toggling the LED on every
    /// status poll.  A no-op when already enabled.  Empty credentials fail
    /// before any call reaches the link.
    pub fn enable<H, L>(
        &mut self,
        net: &NetworkConfig,
        indicator: &mut StatusIndicator,
        hw: &mut H,
        link: &mut L,
    ) -> Result<(), ConnectivityError>
    where
        H: IndicatorPort + ClockPort,
        L: ConnectivityPort,
    {
        if self.enabled {
            return Ok(());
        }
        if net.ssid.is_empty() || net.password.is_empty() {
            warn!("Connectivity: no credentials configured");
            return Err(ConnectivityError::NoCredentials);
        }

        link.disconnect();
        link.connect(net.ssid.as_str(), net.password.as_str())?;
        info!("Connectivity: associating with '{}'", net.ssid);

        let start = hw.now_ms();
        loop {
            match link.status() {
                LinkStatus::Connected => break,
                LinkStatus::WrongCredentials => {
                    warn!("Connectivity: credentials rejected");
                    link.disconnect();
                    return Err(ConnectivityError::WrongCredentials);
                }
                LinkStatus::Disconnected => {}
            }
            if hw.now_ms().saturating_sub(start) > self.timeout_ms {
                warn!("Connectivity: no association after {} ms", self.timeout_ms);
                link.disconnect();
                return Err(ConnectivityError::Timeout);
            }
            hw.delay_ms(self.poll_ms);
            indicator.toggle(hw);
            hw.yield_now();
        }

        self.enabled = true;
        self.last_reconnect_ms = None;
        info!(
            "Connectivity: connected after {} ms",
            hw.now_ms().saturating_sub(start)
        );
        Ok(())
    }

    /// Tear the session down.  Always succeeds.
    pub fn disable(&mut self, link: &mut impl ConnectivityPort) {
        link.disconnect();
        self.enabled = false;
        self.last_reconnect_ms = None;
        info!("Connectivity: disabled");
    }

    /// Keep-alive.  Returns `true` when a reconnect was issued.
    pub fn maintain(&mut self, now_ms: u64, link: &mut impl ConnectivityPort) -> bool {
        if !self.enabled || link.is_connected() {
            return false;
        }
        if let Some(last) = self.last_reconnect_ms {
            if now_ms.saturating_sub(last) < self.reconnect_interval_ms {
                return false;
            }
        }
        self.last_reconnect_ms = Some(now_ms);
        info!("Connectivity: link down, reconnecting");
        link.reconnect();
        true
    }
}
