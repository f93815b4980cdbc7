//! Mock adapters for integration tests.
//!
//! Records every board call so tests can assert on the full command
//! history without touching real GPIO/PWM registers.  The clock is fake:
//! it only moves on `delay_ms` or an explicit `advance`.

use std::collections::VecDeque;

use airvent::app::actuator::AngleLimits;
use airvent::app::events::AppEvent;
use airvent::app::keymap::{DecodedSignal, Protocol, RemoteKey, code_for};
use airvent::app::ports::{
    ClockPort, ConnectivityError, ConnectivityPort, DecoderPort, EventSink, IndicatorPort,
    LimitStorePort, LinkStatus, RelayPort, ServoPort, StoreError,
};
use airvent::app::service::AppService;
use airvent::config::{DeviceConfig, bounded};

// ── Board call record ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardCall {
    Servo(u8),
    Relay(bool),
    Led(bool),
    Delay(u32),
}

// ── MockBoard ─────────────────────────────────────────────────

pub struct MockBoard {
    pub calls: Vec<BoardCall>,
    pub now: u64,
    pub yields: u32,
}

#[allow(dead_code)]
impl MockBoard {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            now: 0,
            yields: 0,
        }
    }

    pub fn advance(&mut self, ms: u64) {
        self.now += ms;
    }

    pub fn servo_moves(&self) -> Vec<u8> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                BoardCall::Servo(a) => Some(*a),
                _ => None,
            })
            .collect()
    }

    pub fn relay_on(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                BoardCall::Relay(on) => Some(*on),
                _ => None,
            })
            .unwrap_or(false)
    }

    pub fn led_lit(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                BoardCall::Led(lit) => Some(*lit),
                _ => None,
            })
            .unwrap_or(false)
    }

    pub fn led_writes(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, BoardCall::Led(_))).count()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl ServoPort for MockBoard {
    fn set_angle(&mut self, degrees: u8) {
        self.calls.push(BoardCall::Servo(degrees));
    }
}

impl RelayPort for MockBoard {
    fn set_relay(&mut self, on: bool) {
        self.calls.push(BoardCall::Relay(on));
    }
}

impl IndicatorPort for MockBoard {
    fn set_indicator(&mut self, lit: bool) {
        self.calls.push(BoardCall::Led(lit));
    }
}

impl ClockPort for MockBoard {
    fn now_ms(&self) -> u64 {
        self.now
    }

    fn delay_ms(&mut self, ms: u32) {
        self.calls.push(BoardCall::Delay(ms));
        self.now += u64::from(ms);
    }

    fn yield_now(&mut self) {
        self.yields += 1;
    }
}

// ── MockDecoder ───────────────────────────────────────────────

/// Hands out queued frames and counts resumes.  Like the real receiver it
/// keeps returning the held frame until resumed.
pub struct MockDecoder {
    queue: VecDeque<DecodedSignal>,
    held: Option<DecodedSignal>,
    pub resumes: u32,
    pub decodes: u32,
}

#[allow(dead_code)]
impl MockDecoder {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            held: None,
            resumes: 0,
            decodes: 0,
        }
    }

    pub fn press(&mut self, key: RemoteKey) {
        self.queue.push_back(DecodedSignal::nec(code_for(key)));
    }

    pub fn push(&mut self, signal: DecodedSignal) {
        self.queue.push_back(signal);
    }

    pub fn push_unknown(&mut self, code: u64) {
        self.queue.push_back(DecodedSignal {
            protocol: Protocol::Unknown,
            code,
        });
    }

    pub fn is_drained(&self) -> bool {
        self.queue.is_empty() && self.held.is_none()
    }
}

impl DecoderPort for MockDecoder {
    fn try_decode(&mut self) -> Option<DecodedSignal> {
        if self.held.is_none() {
            self.held = self.queue.pop_front();
            if self.held.is_some() {
                self.decodes += 1;
            }
        }
        self.held
    }

    fn resume(&mut self) {
        self.held = None;
        self.resumes += 1;
    }
}

// ── MockLink ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkCall {
    Connect(String, String),
    Disconnect,
    Reconnect,
}

/// Scripted station.  `connected_after` is the number of status polls
/// before the link reports up; `None` never comes up.
pub struct MockLink {
    pub calls: Vec<LinkCall>,
    pub connected_after: Option<u32>,
    pub reject_credentials: bool,
    polls: std::cell::Cell<u32>,
    associating: bool,
}

#[allow(dead_code)]
impl MockLink {
    pub fn new(connected_after: Option<u32>) -> Self {
        Self {
            calls: Vec::new(),
            connected_after,
            reject_credentials: false,
            polls: std::cell::Cell::new(0),
            associating: false,
        }
    }

    pub fn rejecting() -> Self {
        Self {
            reject_credentials: true,
            ..Self::new(None)
        }
    }

    /// Simulate the AP dropping the station.
    pub fn drop_link(&mut self) {
        self.connected_after = None;
    }
}

impl ConnectivityPort for MockLink {
    fn connect(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
        self.calls.push(LinkCall::Connect(ssid.into(), password.into()));
        self.polls.set(0);
        self.associating = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.calls.push(LinkCall::Disconnect);
        self.associating = false;
    }

    fn reconnect(&mut self) {
        self.calls.push(LinkCall::Reconnect);
        self.polls.set(0);
        self.associating = true;
    }

    fn status(&self) -> LinkStatus {
        if !self.associating {
            return LinkStatus::Disconnected;
        }
        if self.reject_credentials {
            return LinkStatus::WrongCredentials;
        }
        let seen = self.polls.get();
        self.polls.set(seen + 1);
        match self.connected_after {
            Some(n) if seen >= n => LinkStatus::Connected,
            _ => LinkStatus::Disconnected,
        }
    }
}

// ── MockStore ─────────────────────────────────────────────────

pub struct MockStore {
    pub bytes: [u8; 2],
    pub committed: [u8; 2],
    pub commits: u32,
    pub fail: bool,
}

#[allow(dead_code)]
impl MockStore {
    pub fn erased() -> Self {
        Self::with(0xFF, 0xFF)
    }

    pub fn with(closed: u8, open: u8) -> Self {
        Self {
            bytes: [closed, open],
            committed: [closed, open],
            commits: 0,
            fail: false,
        }
    }
}

impl LimitStorePort for MockStore {
    fn read_byte(&self, slot: usize) -> u8 {
        self.bytes.get(slot).copied().unwrap_or(0xFF)
    }

    fn write_byte(&mut self, slot: usize, value: u8) {
        if let Some(b) = self.bytes.get_mut(slot) {
            *b = value;
        }
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.commits += 1;
        if self.fail {
            return Err(StoreError::CommitFailed);
        }
        self.committed = self.bytes;
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.iter().any(|e| e == event)
    }

    pub fn last(&self) -> Option<&AppEvent> {
        self.events.last()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Rig ───────────────────────────────────────────────────────

/// A started service wired to fresh mocks.
pub struct Rig {
    pub app: AppService,
    pub hw: MockBoard,
    pub ir: MockDecoder,
    pub link: MockLink,
    pub store: MockStore,
    pub sink: RecordingSink,
}

#[allow(dead_code)]
impl Rig {
    pub fn new() -> Self {
        Self::with_store(MockStore::with(80, 100))
    }

    pub fn with_store(store: MockStore) -> Self {
        Self::build(test_config(), store)
    }

    pub fn build(config: DeviceConfig, store: MockStore) -> Self {
        let app = AppService::new(config, &store);
        let mut rig = Self {
            app,
            hw: MockBoard::new(),
            ir: MockDecoder::new(),
            link: MockLink::new(Some(0)),
            store,
            sink: RecordingSink::new(),
        };
        rig.app.start(&mut rig.hw, &mut rig.sink);
        rig
    }

    /// One loop iteration.
    pub fn poll(&mut self) {
        self.app
            .poll(&mut self.hw, &mut self.ir, &mut self.link, &mut self.store, &mut self.sink);
    }

    /// Queue a key and run the iteration that consumes it.
    pub fn press(&mut self, key: RemoteKey) {
        self.ir.press(key);
        self.poll();
    }

    pub fn limits(&self) -> AngleLimits {
        self.app.limits()
    }
}

/// Defaults plus usable WiFi credentials.
pub fn test_config() -> DeviceConfig {
    let mut cfg = DeviceConfig::default();
    cfg.network.ssid = bounded("HomeNet");
    cfg.network.password = bounded("hunter2hunter2");
    cfg
}
