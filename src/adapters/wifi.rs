//! WiFi station-mode adapter.
//!
//! Implements [`ConnectivityPort`].  `connect` only issues the association
//! request; the connectivity controller polls [`status`] until the link is
//! up, the access point rejects the credentials, or its timeout expires.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::wifi::EspWifi` plus a raw
//!   `WIFI_EVENT_STA_DISCONNECTED` handler that records the last reason
//!   code, so a rejected password is distinguishable from a missing AP.
//! - **all other targets**: a scriptable simulation for host-side tests.
//!
//! [`status`]: ConnectivityPort::status

use core::sync::atomic::{AtomicU8, Ordering};

use log::{info, warn};

use crate::app::ports::{ConnectivityError, ConnectivityPort, LinkStatus};

#[cfg(target_os = "espidf")]
use embedded_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};
#[cfg(target_os = "espidf")]
use esp_idf_svc::{eventloop::EspSystemEventLoop, hal::modem::Modem, sys::EspError, wifi::EspWifi};

// ───────────────────────────────────────────────────────────────
// Disconnect reasons
// ───────────────────────────────────────────────────────────────

// Mirrors `wifi_err_reason_t`.
const REASON_NONE: u8 = 0;
const REASON_4WAY_HANDSHAKE_TIMEOUT: u8 = 15;
const REASON_AUTH_FAIL: u8 = 202;
const REASON_HANDSHAKE_TIMEOUT: u8 = 204;

static LAST_DISCONNECT_REASON: AtomicU8 = AtomicU8::new(REASON_NONE);

/// Reasons that mean the AP was found but refused the passphrase.
fn is_credential_rejection(reason: u8) -> bool {
    matches!(
        reason,
        REASON_AUTH_FAIL | REASON_4WAY_HANDSHAKE_TIMEOUT | REASON_HANDSHAKE_TIMEOUT
    )
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn on_sta_disconnected(
    _arg: *mut core::ffi::c_void,
    _base: esp_idf_svc::sys::esp_event_base_t,
    _id: i32,
    data: *mut core::ffi::c_void,
) {
    if data.is_null() {
        return;
    }
    // SAFETY: ESP-IDF passes a wifi_event_sta_disconnected_t for this id.
    let event = unsafe { &*(data as *const esp_idf_svc::sys::wifi_event_sta_disconnected_t) };
    LAST_DISCONNECT_REASON.store(event.reason as u8, Ordering::Relaxed);
}

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

/// WPA2 passphrase: 8–63 characters, or 64 hex digits.
fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Simulation script
// ───────────────────────────────────────────────────────────────

/// How the simulated access point answers an association.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimAccessPoint {
    /// Link comes up after `polls` status queries.
    Accepts { polls: u32 },
    /// Association fails with an auth-fail reason.
    RejectsPassword,
    /// Nothing in range.
    Absent,
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    associating: bool,
    #[cfg(target_os = "espidf")]
    wifi: EspWifi<'static>,
    #[cfg(not(target_os = "espidf"))]
    sim_ap: SimAccessPoint,
    #[cfg(not(target_os = "espidf"))]
    sim_polls: core::cell::Cell<u32>,
    #[cfg(not(target_os = "espidf"))]
    sim_connects: u32,
}

impl WifiAdapter {
    /// Bring up the station interface under `hostname` and register the
    /// disconnect-reason handler.  The radio stays idle until `connect`.
    #[cfg(target_os = "espidf")]
    pub fn new(modem: Modem, sysloop: EspSystemEventLoop, hostname: &str) -> Result<Self, EspError> {
        let mut wifi = EspWifi::new(modem, sysloop, None)?;
        if let Err(e) = wifi.sta_netif_mut().set_hostname(hostname) {
            warn!("WiFi: hostname '{}' rejected: {}", hostname, e);
        }

        // SAFETY: the handler only stores into an atomic; it is never
        // unregistered because the adapter lives for the whole program.
        esp_idf_svc::sys::esp!(unsafe {
            esp_idf_svc::sys::esp_event_handler_register(
                esp_idf_svc::sys::WIFI_EVENT,
                esp_idf_svc::sys::wifi_event_t_WIFI_EVENT_STA_DISCONNECTED as i32,
                Some(on_sta_disconnected),
                core::ptr::null_mut(),
            )
        })?;

        info!("WiFi: station ready (hostname '{}')", hostname);
        Ok(Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            associating: false,
            wifi,
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(sim_ap: SimAccessPoint) -> Self {
        Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            associating: false,
            sim_ap,
            sim_polls: core::cell::Cell::new(0),
            sim_connects: 0,
        }
    }

    /// Change what the simulated AP does on the next association.
    #[cfg(not(target_os = "espidf"))]
    pub fn set_sim_access_point(&mut self, sim_ap: SimAccessPoint) {
        self.sim_ap = sim_ap;
    }

    /// Association requests issued so far (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_connects(&self) -> u32 {
        self.sim_connects
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        let config = Configuration::Client(ClientConfiguration {
            ssid: self
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidSsid)?,
            password: self
                .password
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidPassword)?,
            auth_method: AuthMethod::WPA2Personal,
            ..Default::default()
        });
        self.wifi.set_configuration(&config).map_err(|e| {
            warn!("WiFi: set_configuration failed: {}", e);
            ConnectivityError::ConnectionFailed
        })?;
        if !self.wifi.is_started().unwrap_or(false) {
            self.wifi.start().map_err(|e| {
                warn!("WiFi: start failed: {}", e);
                ConnectivityError::ConnectionFailed
            })?;
        }
        self.wifi.connect().map_err(|e| {
            warn!("WiFi: connect request failed: {}", e);
            ConnectivityError::ConnectionFailed
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        self.sim_connects += 1;
        self.sim_polls.set(0);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        if let Err(e) = self.wifi.disconnect() {
            log::debug!("WiFi: disconnect: {}", e);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        info!("WiFi(sim): disconnected");
    }

    #[cfg(target_os = "espidf")]
    fn platform_link_up(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false) && self.wifi.sta_netif().is_up().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_link_up(&self) -> bool {
        match self.sim_ap {
            SimAccessPoint::Accepts { polls } => {
                let seen = self.sim_polls.get() + 1;
                self.sim_polls.set(seen);
                seen > polls
            }
            SimAccessPoint::RejectsPassword => {
                LAST_DISCONNECT_REASON.store(REASON_AUTH_FAIL, Ordering::Relaxed);
                false
            }
            SimAccessPoint::Absent => false,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// ConnectivityPort
// ───────────────────────────────────────────────────────────────

impl ConnectivityPort for WifiAdapter {
    fn connect(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid = crate::config::bounded(ssid);
        self.password = crate::config::bounded(password);

        LAST_DISCONNECT_REASON.store(REASON_NONE, Ordering::Relaxed);
        info!("WiFi: connecting to '{}'", self.ssid);
        self.platform_connect()?;
        self.associating = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.platform_disconnect();
        self.associating = false;
        info!("WiFi: disconnected");
    }

    fn reconnect(&mut self) {
        if self.ssid.is_empty() {
            return;
        }
        LAST_DISCONNECT_REASON.store(REASON_NONE, Ordering::Relaxed);
        match self.platform_connect() {
            Ok(()) => {
                self.associating = true;
                info!("WiFi: reconnecting to '{}'", self.ssid);
            }
            Err(e) => warn!("WiFi: reconnect failed: {}", e),
        }
    }

    fn status(&self) -> LinkStatus {
        if !self.associating {
            return LinkStatus::Disconnected;
        }
        if self.platform_link_up() {
            return LinkStatus::Connected;
        }
        if is_credential_rejection(LAST_DISCONNECT_REASON.load(Ordering::Relaxed)) {
            LinkStatus::WrongCredentials
        } else {
            LinkStatus::Disconnected
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
