//! Normal-mode damper control: stepping, open/close, relay idle release
//! and the decoder hand-off.

use super::mock_hw::{BoardCall, MockStore, Rig};

use airvent::app::events::AppEvent;
use airvent::app::keymap::{DecodedSignal, Protocol, RemoteKey};
use airvent::error::IgnoredSignal;

#[test]
fn start_releases_outputs_and_reports_limits() {
    let rig = Rig::new();
    assert_eq!(rig.hw.calls, vec![BoardCall::Relay(false), BoardCall::Led(false)]);
    assert_eq!(
        rig.sink.events,
        vec![AppEvent::Started { closed: 80, open: 100, angle: 90 }]
    );
}

#[test]
fn erased_store_falls_back_to_default_limits() {
    let rig = Rig::with_store(MockStore::erased());
    assert_eq!((rig.limits().closed(), rig.limits().open()), (80, 100));
}

#[test]
fn inverted_store_falls_back_to_default_limits() {
    let rig = Rig::with_store(MockStore::with(120, 60));
    assert_eq!((rig.limits().closed(), rig.limits().open()), (80, 100));
}

#[test]
fn up_presses_clamp_at_open_limit() {
    let mut rig = Rig::new();
    for _ in 0..3 {
        rig.press(RemoteKey::Up);
    }
    assert_eq!(rig.hw.servo_moves(), vec![95, 100, 100]);
    assert_eq!(rig.app.current_angle(), 100);
    assert!(rig.hw.relay_on());
}

#[test]
fn down_presses_clamp_at_closed_limit() {
    let mut rig = Rig::new();
    for _ in 0..4 {
        rig.press(RemoteKey::Down);
    }
    assert_eq!(rig.hw.servo_moves(), vec![85, 80, 80, 80]);
}

#[test]
fn open_and_close_settle_relay_before_moving() {
    let mut rig = Rig::new();
    rig.hw.clear();
    rig.press(RemoteKey::Green);
    assert_eq!(
        &rig.hw.calls[..3],
        &[BoardCall::Relay(true), BoardCall::Delay(100), BoardCall::Servo(100)]
    );

    rig.hw.clear();
    rig.press(RemoteKey::Red);
    assert_eq!(
        &rig.hw.calls[..3],
        &[BoardCall::Relay(true), BoardCall::Delay(100), BoardCall::Servo(80)]
    );
    assert!(rig.sink.contains(&AppEvent::Moved { angle: 80 }));
}

#[test]
fn relay_releases_after_idle_window() {
    let mut rig = Rig::new();
    rig.press(RemoteKey::Up);
    assert!(rig.app.relay_engaged());

    rig.hw.advance(2_999);
    rig.poll();
    assert!(rig.app.relay_engaged());

    rig.hw.advance(1);
    rig.poll();
    assert!(!rig.app.relay_engaged());
    assert!(!rig.hw.relay_on());
    assert_eq!(rig.sink.last(), Some(&AppEvent::RelayReleased));

    rig.hw.advance(10_000);
    rig.poll();
    assert_eq!(
        rig.sink.events.iter().filter(|e| **e == AppEvent::RelayReleased).count(),
        1,
        "release is reported once"
    );
}

#[test]
fn each_press_restarts_relay_window() {
    let mut rig = Rig::new();
    rig.press(RemoteKey::Up);
    rig.hw.advance(2_000);
    rig.press(RemoteKey::Down);
    rig.hw.advance(2_000);
    rig.poll();
    assert!(rig.app.relay_engaged(), "second press restarted the window");
}

#[test]
fn every_frame_is_resumed_once() {
    let mut rig = Rig::new();
    rig.ir.press(RemoteKey::Up);
    rig.ir.push(DecodedSignal::nec(0x00AB_CDEF));
    rig.ir.push_unknown(0xDEAD_BEEF);
    rig.ir.press(RemoteKey::Flash);
    for _ in 0..6 {
        rig.poll();
    }
    assert!(rig.ir.is_drained());
    assert_eq!(rig.ir.decodes, 4);
    assert_eq!(rig.ir.resumes, 4);
}

#[test]
fn one_frame_per_iteration() {
    let mut rig = Rig::new();
    rig.ir.press(RemoteKey::Up);
    rig.ir.press(RemoteKey::Up);
    rig.poll();
    assert_eq!(rig.app.current_angle(), 95);
    rig.poll();
    assert_eq!(rig.app.current_angle(), 100);
}

#[test]
fn foreign_protocol_is_ignored() {
    let mut rig = Rig::new();
    rig.ir.push_unknown(0x1234);
    rig.poll();
    assert!(rig.sink.contains(&AppEvent::SignalIgnored(IgnoredSignal::ProtocolMismatch(
        Protocol::Unknown
    ))));
    assert!(rig.hw.servo_moves().is_empty());
}

#[test]
fn unmapped_code_is_ignored() {
    let mut rig = Rig::new();
    rig.ir.push(DecodedSignal::nec(0x00AB_CDEF));
    rig.poll();
    assert!(rig.sink.contains(&AppEvent::SignalIgnored(IgnoredSignal::Unrecognized(0x00AB_CDEF))));
}

#[test]
fn effect_keys_do_nothing_in_normal_mode() {
    let mut rig = Rig::new();
    for key in [RemoteKey::Flash, RemoteKey::Strobe, RemoteKey::Fade, RemoteKey::Smooth] {
        rig.press(key);
    }
    assert!(rig.hw.servo_moves().is_empty());
    assert_eq!(rig.app.current_angle(), 90);
}

#[test]
fn every_iteration_yields() {
    let mut rig = Rig::new();
    rig.poll();
    rig.poll();
    assert_eq!(rig.hw.yields, 2);
}
