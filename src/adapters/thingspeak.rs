//! ThingSpeak channel reader.
//!
//! Implements [`TelemetryPort`] by fetching the most recent entry of one
//! channel field:
//!
//! ```text
//! GET https://api.thingspeak.com/channels/{channel}/fields/{field}/last.json?api_key={key}
//! → {"created_at":"2024-05-01T10:00:00Z","entry_id":812,"field1":"21.7"}
//! ```
//!
//! The field value arrives as a JSON string (ThingSpeak stores text), so it
//! is parsed to `f32` here.  On host targets the HTTP exchange is replaced
//! by a canned response.

use core::fmt::Write as _;

use log::warn;
use serde::Deserialize;

use crate::app::ports::{FieldReading, TelemetryError, TelemetryPort};

#[cfg(target_os = "espidf")]
use embedded_svc::{
    http::{Method, Status, client::Client as HttpClient},
    io::Read,
};
#[cfg(target_os = "espidf")]
use esp_idf_svc::http::client::{Configuration as HttpClientConfiguration, EspHttpConnection};

const BASE_URL: &str = "https://api.thingspeak.com";
const MAX_BODY: usize = 512;

/// The request blocks the watchdog-subscribed main task, so this must stay
/// below [`watchdog::DEFAULT_TIMEOUT_MS`](crate::drivers::watchdog::DEFAULT_TIMEOUT_MS).
pub const HTTP_TIMEOUT_MS: u32 = 5_000;

pub type Url = heapless::String<160>;

pub fn build_url(channel: u32, field: u8, api_key: &str) -> Url {
    let mut url = Url::new();
    // Longest form is well under capacity for a 32-char key.
    let _ = write!(
        url,
        "{}/channels/{}/fields/{}/last.json?api_key={}",
        BASE_URL, channel, field, api_key
    );
    url
}

#[derive(Deserialize)]
struct LastEntry {
    created_at: Option<String>,
    #[serde(flatten)]
    fields: serde_json::Map<String, serde_json::Value>,
}

/// Extract `field{field}` and `created_at` from a `last.json` body.
pub fn parse_last_entry(body: &[u8], field: u8) -> Result<FieldReading, TelemetryError> {
    let entry: LastEntry = serde_json::from_slice(body).map_err(|_| TelemetryError::Malformed)?;

    let mut key = heapless::String::<8>::new();
    let _ = write!(key, "field{}", field);

    let value = match entry.fields.get(key.as_str()) {
        Some(serde_json::Value::String(s)) => s.trim().parse::<f32>().ok(),
        Some(serde_json::Value::Number(n)) => n.as_f64().map(|v| v as f32),
        _ => None,
    }
    .filter(|v| v.is_finite())
    .ok_or(TelemetryError::Malformed)?;

    let created_at = entry
        .created_at
        .as_deref()
        .map(crate::config::bounded)
        .unwrap_or_default();

    Ok(FieldReading { value, created_at })
}

pub struct ThingSpeakClient {
    last_status: u16,
    #[cfg(not(target_os = "espidf"))]
    sim_response: (u16, String),
}

impl ThingSpeakClient {
    #[cfg(target_os = "espidf")]
    pub fn new() -> Self {
        Self { last_status: 0 }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            last_status: 0,
            sim_response: (
                200,
                r#"{"created_at":"2024-01-01T00:00:00Z","entry_id":1,"field1":"21.5"}"#.into(),
            ),
        }
    }

    /// Set the status and body the simulated server returns.
    #[cfg(not(target_os = "espidf"))]
    pub fn set_sim_response(&mut self, status: u16, body: &str) {
        self.sim_response = (status, body.into());
    }

    #[cfg(target_os = "espidf")]
    fn get(&mut self, url: &str) -> Result<(u16, heapless::Vec<u8, MAX_BODY>), TelemetryError> {
        let conf = HttpClientConfiguration {
            timeout: Some(core::time::Duration::from_millis(u64::from(HTTP_TIMEOUT_MS))),
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        };
        let conn = EspHttpConnection::new(&conf).map_err(|e| {
            warn!("ThingSpeak: connection setup failed: {}", e);
            TelemetryError::Transport
        })?;
        let mut client = HttpClient::wrap(conn);
        let request = client.request(Method::Get, url, &[]).map_err(|e| {
            warn!("ThingSpeak: request failed: {:?}", e);
            TelemetryError::Transport
        })?;
        let mut response = request.submit().map_err(|e| {
            warn!("ThingSpeak: submit failed: {:?}", e);
            TelemetryError::Transport
        })?;
        let status = response.status();

        let mut body = heapless::Vec::<u8, MAX_BODY>::new();
        let mut chunk = [0u8; 128];
        loop {
            let n = response.read(&mut chunk).map_err(|_| TelemetryError::Transport)?;
            if n == 0 {
                break;
            }
            if body.extend_from_slice(&chunk[..n]).is_err() {
                return Err(TelemetryError::Malformed);
            }
        }
        Ok((status, body))
    }

    #[cfg(not(target_os = "espidf"))]
    fn get(&mut self, url: &str) -> Result<(u16, heapless::Vec<u8, MAX_BODY>), TelemetryError> {
        log::debug!("ThingSpeak(sim): GET {}", url);
        let (status, body) = &self.sim_response;
        let body = heapless::Vec::from_slice(body.as_bytes()).map_err(|_| TelemetryError::Malformed)?;
        Ok((*status, body))
    }
}

impl Default for ThingSpeakClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryPort for ThingSpeakClient {
    fn read_field(
        &mut self,
        channel: u32,
        field: u8,
        api_key: &str,
    ) -> Result<FieldReading, TelemetryError> {
        let url = build_url(channel, field, api_key);
        let (status, body) = match self.get(&url) {
            Ok(r) => r,
            Err(e) => {
                self.last_status = 0;
                return Err(e);
            }
        };
        self.last_status = status;
        if status != 200 {
            warn!("ThingSpeak: HTTP {} for channel {}", status, channel);
            return Err(TelemetryError::Status(status));
        }
        parse_last_entry(&body, field)
    }

    fn last_status(&self) -> u16 {
        self.last_status
    }
}
