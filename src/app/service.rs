//! Application service — the hexagonal core.
//!
//! [`AppService`] owns the device state (limits, actuator, connectivity,
//! faults, LED) and the active dispatch mode.  All I/O flows through port
//! traits injected at call sites, making the whole controller testable
//! with mock adapters.
//!
//! ```text
//!  DecoderPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                  │          AppService          │
//!        Board ◀── │ keymap · actuator · sessions │ ──▶ LimitStorePort
//!                  │ connectivity · indicator     │ ◀─▶ ConnectivityPort
//!                  └──────────────────────────────┘
//! ```
//!
//! [`AppService::poll`] is one event-loop iteration.  While a calibration
//! or env-select session is open the service keeps polling the decoder
//! but suspends keep-alive, relay auto-off, and blinking, exactly as a
//! blocking session loop would.

use log::{debug, info, warn};

use crate::config::DeviceConfig;
use crate::error::{Fault, FaultFlags, IgnoredSignal};

use super::actuator::{ActuatorController, AngleLimits};
use super::calibration::{CalibrationSession, LimitSlot, Phase, SessionInput, Step};
use super::commands::{env_choice, Command};
use super::connectivity::ConnectivityController;
use super::events::AppEvent;
use super::indicator::{IndicatorMode, StatusIndicator};
use super::keymap::{self, DecodedSignal, Lookup};
use super::ports::{
    Board, ClockPort, ConnectivityPort, DecoderPort, EventSink, FieldReading, LimitStorePort,
    StoreError, TelemetryPort, SLOT_CLOSED, SLOT_OPEN,
};
use super::telemetry::TelemetryPoller;

// ───────────────────────────────────────────────────────────────
// Decode scope
// ───────────────────────────────────────────────────────────────

/// A captured frame.  Dropping the scope resumes the decoder, so every
/// dispatch path releases the receiver exactly once.
pub struct DecodeScope<'a, D: DecoderPort> {
    decoder: &'a mut D,
    signal: DecodedSignal,
}

impl<'a, D: DecoderPort> DecodeScope<'a, D> {
    pub fn capture(decoder: &'a mut D) -> Option<Self> {
        let signal = decoder.try_decode()?;
        Some(Self { decoder, signal })
    }

    pub fn signal(&self) -> DecodedSignal {
        self.signal
    }
}

impl<D: DecoderPort> Drop for DecodeScope<'_, D> {
    fn drop(&mut self) {
        self.decoder.resume();
    }
}

// ───────────────────────────────────────────────────────────────
// Dispatch mode
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Mode {
    Normal,
    Calibrating(CalibrationSession),
    EnvSelect,
}

/// Observable summary of who owns key dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
    Normal,
    AwaitingConfirm,
    Adjusting,
    EnvSelect,
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService {
    config: DeviceConfig,
    limits: AngleLimits,
    actuator: ActuatorController,
    connectivity: ConnectivityController,
    indicator: StatusIndicator,
    faults: FaultFlags,
    telemetry: TelemetryPoller,
    mode: Mode,
    env_control: bool,
}

impl AppService {
    /// Build the service and load the angle limits from the store.
    pub fn new(config: DeviceConfig, store: &impl LimitStorePort) -> Self {
        let limits = AngleLimits::load(store);
        Self::with_limits(config, limits)
    }

    pub fn with_limits(config: DeviceConfig, limits: AngleLimits) -> Self {
        let t = &config.timing;
        Self {
            actuator: ActuatorController::new(t, &limits),
            connectivity: ConnectivityController::new(t),
            indicator: StatusIndicator::new(t.blink_interval_ms),
            telemetry: TelemetryPoller::new(t.telemetry_interval_ms),
            faults: FaultFlags::empty(),
            mode: Mode::Normal,
            env_control: false,
            limits,
            config,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Put the outputs in a known state.
    pub fn start(&mut self, hw: &mut impl Board, sink: &mut impl EventSink) {
        self.actuator.release_relay(hw);
        self.indicator.release(hw);
        sink.emit(&AppEvent::Started {
            closed: self.limits.closed(),
            open: self.limits.open(),
            angle: self.actuator.current_angle(),
        });
        info!(
            "AppService started: limits {}..{}°, angle {}°",
            self.limits.closed(),
            self.limits.open(),
            self.actuator.current_angle()
        );
    }

    // ── Per-iteration orchestration ───────────────────────────

    /// Run one loop iteration: keep-alive → decode/dispatch → relay
    /// auto-off → LED.
    pub fn poll<H, D, L, S>(
        &mut self,
        hw: &mut H,
        decoder: &mut D,
        link: &mut L,
        store: &mut S,
        sink: &mut impl EventSink,
    ) where
        H: Board,
        D: DecoderPort,
        L: ConnectivityPort,
        S: LimitStorePort,
    {
        let now = hw.now_ms();

        // 1. Keep-alive
        if self.is_normal() && self.connectivity.maintain(now, link) {
            sink.emit(&AppEvent::Reconnecting);
        }

        // 2. Session timeout, then at most one decoded frame
        if let Mode::Calibrating(session) = &mut self.mode {
            let step = session.on_tick(now);
            self.apply_step(step, hw, store, sink);
        }
        if let Some(frame) = DecodeScope::capture(decoder) {
            self.dispatch(frame.signal(), hw, link, store, sink);
        }

        // 3–4. Housekeeping, suspended while a session owns the remote
        if self.is_normal() {
            let now = hw.now_ms();
            if self.actuator.tick_idle_relay(now, hw) {
                sink.emit(&AppEvent::RelayReleased);
            }
            self.indicator.tick(now, self.faults.any(), hw);
        }

        hw.yield_now();
    }

    /// Fetch the cloud reading when env control is on and a read is due.
    pub fn poll_telemetry(
        &mut self,
        clock: &impl ClockPort,
        link: &impl ConnectivityPort,
        cloud: &mut impl TelemetryPort,
        sink: &mut impl EventSink,
    ) -> Option<FieldReading> {
        let now = clock.now_ms();
        if !self.env_control || !self.is_normal() || !self.telemetry.is_due(now) {
            return None;
        }
        if !link.is_connected() {
            return None;
        }
        let reading = self
            .telemetry
            .fetch(now, &self.config.telemetry, link, cloud)
            .ok()?;
        sink.emit(&AppEvent::SensorReading(reading.clone()));
        Some(reading)
    }

    // ── Dispatch ──────────────────────────────────────────────

    fn dispatch<H, L, S>(
        &mut self,
        signal: DecodedSignal,
        hw: &mut H,
        link: &mut L,
        store: &mut S,
        sink: &mut impl EventSink,
    ) where
        H: Board,
        L: ConnectivityPort,
        S: LimitStorePort,
    {
        let input = match keymap::resolve(signal) {
            Lookup::ProtocolMismatch(protocol) => {
                info!("IR: ignoring {:?} frame 0x{:X}", protocol, signal.code);
                sink.emit(&AppEvent::SignalIgnored(IgnoredSignal::ProtocolMismatch(protocol)));
                return;
            }
            Lookup::Unrecognized(_) => SessionInput::Unmapped,
            Lookup::Key(key) => SessionInput::Key(key),
        };

        match &mut self.mode {
            Mode::Normal => {
                let command = match input {
                    SessionInput::Key(key) => Command::from_key(key),
                    SessionInput::Unmapped => None,
                };
                match command {
                    Some(cmd) => self.handle_command(cmd, hw, link, sink),
                    None => {
                        debug!("IR: no command for 0x{:06X}", signal.code);
                        sink.emit(&AppEvent::SignalIgnored(IgnoredSignal::Unrecognized(signal.code)));
                    }
                }
            }
            Mode::Calibrating(session) => {
                let step = session.on_input(input);
                self.apply_step(step, hw, store, sink);
            }
            Mode::EnvSelect => {
                if let Some(enabled) = match input {
                    SessionInput::Key(key) => env_choice(key),
                    SessionInput::Unmapped => None,
                } {
                    self.env_control = enabled;
                    self.mode = Mode::Normal;
                    self.indicator.release(hw);
                    info!("Env control {}", if enabled { "enabled" } else { "disabled" });
                    sink.emit(&AppEvent::EnvControlChanged(enabled));
                }
            }
        }
    }

    /// Execute a normal-mode command.
    pub fn handle_command<H, L>(
        &mut self,
        cmd: Command,
        hw: &mut H,
        link: &mut L,
        sink: &mut impl EventSink,
    ) where
        H: Board,
        L: ConnectivityPort,
    {
        let step = self.config.timing.step_deg as i16;
        match cmd {
            Command::StepUp => {
                let angle = self.actuator.move_by(step, &self.limits, hw);
                sink.emit(&AppEvent::Moved { angle });
            }
            Command::StepDown => {
                let angle = self.actuator.move_by(-step, &self.limits, hw);
                sink.emit(&AppEvent::Moved { angle });
            }
            Command::Open => {
                let angle = self.actuator.move_to(self.limits.open(), &self.limits, hw);
                sink.emit(&AppEvent::Moved { angle });
            }
            Command::Close => {
                let angle = self.actuator.move_to(self.limits.closed(), &self.limits, hw);
                sink.emit(&AppEvent::Moved { angle });
            }
            Command::ConnectivityOn => {
                if self.connectivity.is_enabled() {
                    debug!("Connectivity already enabled");
                    return;
                }
                match self
                    .connectivity
                    .enable(&self.config.network, &mut self.indicator, hw, link)
                {
                    Ok(()) => {
                        self.clear_fault(Fault::Connectivity, sink);
                        sink.emit(&AppEvent::Connected);
                    }
                    Err(e) => {
                        warn!("Connectivity: enable failed: {}", e);
                        sink.emit(&AppEvent::ConnectFailed(e));
                        self.raise_fault(Fault::Connectivity, sink);
                    }
                }
            }
            Command::ConnectivityOff => {
                self.connectivity.disable(link);
                self.clear_fault(Fault::Connectivity, sink);
                sink.emit(&AppEvent::Disconnected);
            }
            Command::EnvToggle => {
                self.mode = Mode::EnvSelect;
                self.indicator.hold(hw);
                info!("Env control: waiting for ON/OFF");
                sink.emit(&AppEvent::EnvSelectStarted);
            }
            Command::Calibrate => {
                let session = CalibrationSession::begin(hw.now_ms(), &self.config.timing);
                self.mode = Mode::Calibrating(session);
                self.indicator.hold(hw);
                sink.emit(&AppEvent::CalibrationStarted);
            }
        }
    }

    // ── Calibration ───────────────────────────────────────────

    fn apply_step<H, S>(&mut self, step: Step, hw: &mut H, store: &mut S, sink: &mut impl EventSink)
    where
        H: Board,
        S: LimitStorePort,
    {
        match step {
            Step::Stay => {}
            Step::Approved { midpoint } => {
                self.actuator.engage_relay(hw);
                self.actuator.drive_unclamped(midpoint, hw);
                sink.emit(&AppEvent::CalibrationApproved { midpoint });
            }
            Step::Nudged(angle) => {
                self.actuator.drive_unclamped(angle, hw);
                sink.emit(&AppEvent::CalibrationNudged { angle });
            }
            Step::Commit { slot, angle } => {
                let updated = match slot {
                    LimitSlot::Open => self.limits.with_open(angle),
                    LimitSlot::Closed => self.limits.with_closed(angle),
                };
                let Some(updated) = updated else {
                    warn!(
                        "Calibration: {:?} = {}° would invert limits {}..{}°, rejected",
                        slot,
                        angle,
                        self.limits.closed(),
                        self.limits.open()
                    );
                    sink.emit(&AppEvent::LimitRejected { slot, angle });
                    return;
                };
                self.limits = updated;

                let persisted = match Self::persist_limit(slot, angle, store) {
                    Ok(()) => {
                        self.clear_fault(Fault::Persistence, sink);
                        true
                    }
                    Err(e) => {
                        warn!("Calibration: store commit failed: {}", e);
                        sink.emit(&AppEvent::PersistFailed(e));
                        self.raise_fault(Fault::Persistence, sink);
                        false
                    }
                };
                info!("Calibration: {:?} limit = {}° (persisted={})", slot, angle, persisted);
                sink.emit(&AppEvent::LimitCommitted { slot, angle, persisted });
                self.end_session(hw);
            }
            Step::Finished(end) => {
                sink.emit(&AppEvent::CalibrationEnded(end));
                self.end_session(hw);
            }
        }
    }

    fn persist_limit(
        slot: LimitSlot,
        angle: u8,
        store: &mut impl LimitStorePort,
    ) -> Result<(), StoreError> {
        let index = match slot {
            LimitSlot::Closed => SLOT_CLOSED,
            LimitSlot::Open => SLOT_OPEN,
        };
        store.write_byte(index, angle);
        store.commit()
    }

    fn end_session(&mut self, hw: &mut impl Board) {
        self.actuator.release_relay(hw);
        self.actuator.reclamp(&self.limits);
        self.indicator.release(hw);
        self.mode = Mode::Normal;
    }

    // ── Faults ────────────────────────────────────────────────

    fn raise_fault(&mut self, fault: Fault, sink: &mut impl EventSink) {
        if !self.faults.contains(fault) {
            self.faults.raise(fault);
            sink.emit(&AppEvent::FaultRaised(fault));
        }
    }

    fn clear_fault(&mut self, fault: Fault, sink: &mut impl EventSink) {
        if self.faults.contains(fault) {
            self.faults.clear(fault);
            sink.emit(&AppEvent::FaultCleared(fault));
        }
    }

    // ── Queries ───────────────────────────────────────────────

    fn is_normal(&self) -> bool {
        matches!(self.mode, Mode::Normal)
    }

    pub fn mode(&self) -> ModeKind {
        match &self.mode {
            Mode::Normal => ModeKind::Normal,
            Mode::Calibrating(s) => match s.phase() {
                Phase::AwaitingConfirm { .. } => ModeKind::AwaitingConfirm,
                Phase::Adjusting { .. } => ModeKind::Adjusting,
            },
            Mode::EnvSelect => ModeKind::EnvSelect,
        }
    }

    pub fn limits(&self) -> AngleLimits {
        self.limits
    }

    pub fn current_angle(&self) -> u8 {
        self.actuator.current_angle()
    }

    pub fn relay_engaged(&self) -> bool {
        self.actuator.relay_engaged()
    }

    /// Working angle of an approved calibration session.
    pub fn working_angle(&self) -> Option<u8> {
        match &self.mode {
            Mode::Calibrating(s) => s.working_angle(),
            _ => None,
        }
    }

    pub fn faults(&self) -> FaultFlags {
        self.faults
    }

    pub fn connectivity_enabled(&self) -> bool {
        self.connectivity.is_enabled()
    }

    pub fn env_control(&self) -> bool {
        self.env_control
    }

    pub fn indicator_mode(&self) -> IndicatorMode {
        self.indicator.mode()
    }

    pub fn indicator_lit(&self) -> bool {
        self.indicator.is_lit()
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }
}
