//! Connectivity on/off, association outcomes, keep-alive and the fault LED.

use super::mock_hw::{BoardCall, LinkCall, MockLink, MockStore, Rig, test_config};

use airvent::app::events::AppEvent;
use airvent::app::keymap::RemoteKey;
use airvent::app::ports::ConnectivityError;
use airvent::config::bounded;
use airvent::error::Fault;

fn credentials() -> LinkCall {
    LinkCall::Connect("HomeNet".into(), "hunter2hunter2".into())
}

#[test]
fn on_connects_with_configured_credentials() {
    let mut rig = Rig::new();
    rig.press(RemoteKey::On);
    assert_eq!(rig.link.calls, vec![LinkCall::Disconnect, credentials()]);
    assert!(rig.sink.contains(&AppEvent::Connected));
    assert!(rig.app.connectivity_enabled());
    assert!(!rig.app.faults().any());
}

#[test]
fn second_on_is_a_no_op() {
    let mut rig = Rig::new();
    rig.press(RemoteKey::On);
    let calls = rig.link.calls.len();
    rig.press(RemoteKey::On);
    assert_eq!(rig.link.calls.len(), calls);
}

#[test]
fn association_toggles_led_while_waiting() {
    let mut rig = Rig::new();
    rig.link = MockLink::new(Some(2));
    rig.hw.clear();
    rig.press(RemoteKey::On);

    assert!(rig.app.connectivity_enabled());
    assert_eq!(rig.hw.now, 2_000);
    let delays = rig.hw.calls.iter().filter(|c| matches!(c, BoardCall::Delay(1_000))).count();
    assert_eq!(delays, 2);
    assert_eq!(rig.hw.led_writes(), 2);
    assert!(!rig.hw.led_lit());
}

#[test]
fn association_times_out() {
    let mut rig = Rig::new();
    rig.link = MockLink::new(None);
    rig.press(RemoteKey::On);

    assert!(rig.sink.contains(&AppEvent::ConnectFailed(ConnectivityError::Timeout)));
    assert!(rig.sink.contains(&AppEvent::FaultRaised(Fault::Connectivity)));
    assert_eq!(rig.hw.now, 11_000);
    assert_eq!(rig.link.calls.last(), Some(&LinkCall::Disconnect));
    assert!(!rig.app.connectivity_enabled());
}

#[test]
fn rejected_credentials_fail_fast() {
    let mut rig = Rig::new();
    rig.link = MockLink::rejecting();
    rig.press(RemoteKey::On);

    assert!(rig.sink.contains(&AppEvent::ConnectFailed(ConnectivityError::WrongCredentials)));
    assert!(rig.app.faults().contains(Fault::Connectivity));
    assert_eq!(rig.hw.now, 0, "no polling delay spent");
}

#[test]
fn missing_password_never_touches_link() {
    let mut cfg = test_config();
    cfg.network.password = bounded("");
    let mut rig = Rig::build(cfg, MockStore::with(80, 100));
    rig.press(RemoteKey::On);

    assert!(rig.link.calls.is_empty());
    assert!(rig.sink.contains(&AppEvent::ConnectFailed(ConnectivityError::NoCredentials)));
    assert!(rig.sink.contains(&AppEvent::FaultRaised(Fault::Connectivity)));
}

#[test]
fn fault_blinks_led_at_interval() {
    let mut rig = Rig::new();
    rig.link = MockLink::rejecting();
    rig.press(RemoteKey::On);
    assert!(rig.hw.led_lit(), "first housekeeping pass lights the LED");

    rig.hw.advance(249);
    rig.poll();
    assert!(rig.hw.led_lit());

    rig.hw.advance(1);
    rig.poll();
    assert!(!rig.hw.led_lit());

    rig.hw.advance(250);
    rig.poll();
    assert!(rig.hw.led_lit());
}

#[test]
fn successful_retry_clears_fault() {
    let mut rig = Rig::new();
    rig.link = MockLink::rejecting();
    rig.press(RemoteKey::On);
    assert!(rig.app.faults().contains(Fault::Connectivity));

    rig.link.reject_credentials = false;
    rig.link.connected_after = Some(0);
    rig.press(RemoteKey::On);
    assert!(rig.sink.contains(&AppEvent::FaultCleared(Fault::Connectivity)));
    assert!(!rig.app.faults().any());

    rig.poll();
    assert!(!rig.hw.led_lit());
}

#[test]
fn off_disconnects_and_clears_fault() {
    let mut rig = Rig::new();
    rig.link = MockLink::rejecting();
    rig.press(RemoteKey::On);
    rig.press(RemoteKey::Off);

    assert_eq!(rig.link.calls.last(), Some(&LinkCall::Disconnect));
    assert!(rig.sink.contains(&AppEvent::Disconnected));
    assert!(rig.sink.contains(&AppEvent::FaultCleared(Fault::Connectivity)));
}

#[test]
fn keep_alive_reconnects_at_interval() {
    let mut rig = Rig::new();
    rig.press(RemoteKey::On);
    rig.link.drop_link();

    rig.poll();
    assert_eq!(rig.link.calls.last(), Some(&LinkCall::Reconnect));
    assert_eq!(rig.sink.last(), Some(&AppEvent::Reconnecting));

    rig.hw.advance(4_999);
    rig.poll();
    rig.hw.advance(1);
    rig.poll();
    let reconnects = rig.link.calls.iter().filter(|c| **c == LinkCall::Reconnect).count();
    assert_eq!(reconnects, 2);
}

#[test]
fn keep_alive_is_idle_when_disabled() {
    let mut rig = Rig::new();
    rig.press(RemoteKey::On);
    rig.press(RemoteKey::Off);
    rig.link.drop_link();
    rig.hw.advance(10_000);
    rig.poll();
    assert!(!rig.link.calls.contains(&LinkCall::Reconnect));
}

#[test]
fn keep_alive_suspended_during_calibration() {
    let mut rig = Rig::new();
    rig.press(RemoteKey::On);
    rig.link.drop_link();
    // Keep-alive runs before the frame that opens the session.
    rig.press(RemoteKey::Blue);
    assert_eq!(rig.link.calls.last(), Some(&LinkCall::Reconnect));

    let before = rig.link.calls.len();
    rig.press(RemoteKey::Smooth);
    rig.hw.advance(20_000);
    rig.poll();
    assert_eq!(rig.link.calls.len(), before);
}
