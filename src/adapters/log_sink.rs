//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing every application event to the
//! ESP-IDF logger (UART / USB-CDC in production) as one tagged line.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { closed, open, angle } => {
                info!("START | limits={}..{}° angle={}°", closed, open, angle);
            }
            AppEvent::Moved { angle } => info!("MOVE  | angle={}°", angle),
            AppEvent::RelayReleased => info!("RELAY | released (idle)"),
            AppEvent::CalibrationStarted => info!("CAL   | waiting for confirm"),
            AppEvent::CalibrationApproved { midpoint } => {
                info!("CAL   | approved, servo at {}°", midpoint);
            }
            AppEvent::CalibrationNudged { angle } => info!("CAL   | working={}°", angle),
            AppEvent::LimitCommitted { slot, angle, persisted } => {
                if *persisted {
                    info!("CAL   | {:?} limit set to {}°", slot, angle);
                } else {
                    warn!("CAL   | {:?} limit set to {}° (not persisted)", slot, angle);
                }
            }
            AppEvent::LimitRejected { slot, angle } => {
                warn!("CAL   | {:?} limit {}° would invert range, ignored", slot, angle);
            }
            AppEvent::CalibrationEnded(end) => info!("CAL   | ended ({:?})", end),
            AppEvent::EnvSelectStarted => info!("ENV   | waiting for ON/OFF"),
            AppEvent::EnvControlChanged(on) => {
                info!("ENV   | env control {}", if *on { "enabled" } else { "disabled" });
            }
            AppEvent::Connected => info!("NET   | connected"),
            AppEvent::Disconnected => info!("NET   | disconnected"),
            AppEvent::ConnectFailed(e) => warn!("NET   | connect failed: {}", e),
            AppEvent::Reconnecting => info!("NET   | link down, reconnecting"),
            AppEvent::FaultRaised(f) => warn!("FAULT | raised {}", f),
            AppEvent::FaultCleared(f) => info!("FAULT | cleared {}", f),
            AppEvent::PersistFailed(e) => warn!("FAULT | limit store: {}", e),
            AppEvent::SignalIgnored(s) => info!("IR    | ignored {}", s),
            AppEvent::SensorReading(r) => {
                info!("SENSOR| value={:.2} at {}", r.value, r.created_at);
            }
        }
    }
}
