//! Env-control selector and the rate-limited cloud reading.

use super::mock_hw::Rig;

use airvent::adapters::thingspeak::ThingSpeakClient;
use airvent::app::events::AppEvent;
use airvent::app::keymap::RemoteKey;
use airvent::app::service::ModeKind;

fn read(rig: &mut Rig, cloud: &mut ThingSpeakClient) -> Option<f32> {
    rig.app
        .poll_telemetry(&rig.hw, &rig.link, cloud, &mut rig.sink)
        .map(|r| r.value)
}

/// Connected, env control enabled.
fn polling_rig() -> Rig {
    let mut rig = Rig::new();
    rig.press(RemoteKey::On);
    rig.press(RemoteKey::White);
    rig.press(RemoteKey::On);
    assert!(rig.app.env_control());
    rig
}

#[test]
fn white_then_on_enables_env_control() {
    let mut rig = Rig::new();
    rig.press(RemoteKey::White);
    assert_eq!(rig.app.mode(), ModeKind::EnvSelect);
    assert!(rig.hw.led_lit());

    rig.press(RemoteKey::On);
    assert_eq!(rig.sink.last(), Some(&AppEvent::EnvControlChanged(true)));
    assert_eq!(rig.app.mode(), ModeKind::Normal);
    assert!(!rig.hw.led_lit());
    assert!(rig.link.calls.is_empty(), "ON answered the selector only");
}

#[test]
fn white_then_off_disables_env_control() {
    let mut rig = polling_rig();
    rig.press(RemoteKey::White);
    rig.press(RemoteKey::Off);
    assert!(!rig.app.env_control());
    assert!(rig.app.connectivity_enabled(), "OFF answered the selector only");
}

#[test]
fn selector_waits_through_other_keys() {
    let mut rig = Rig::new();
    rig.press(RemoteKey::White);
    for key in [RemoteKey::Up, RemoteKey::Blue, RemoteKey::Red] {
        rig.press(key);
    }
    assert_eq!(rig.app.mode(), ModeKind::EnvSelect);
    assert!(rig.hw.servo_moves().is_empty());

    rig.hw.advance(60_000);
    rig.poll();
    assert_eq!(rig.app.mode(), ModeKind::EnvSelect, "selector has no timeout");
}

#[test]
fn reading_requires_env_control() {
    let mut rig = Rig::new();
    rig.press(RemoteKey::On);
    let mut cloud = ThingSpeakClient::new();
    assert_eq!(read(&mut rig, &mut cloud), None);
}

#[test]
fn reading_requires_link() {
    let mut rig = Rig::new();
    rig.press(RemoteKey::White);
    rig.press(RemoteKey::On);
    let mut cloud = ThingSpeakClient::new();
    assert_eq!(read(&mut rig, &mut cloud), None);
}

#[test]
fn reading_is_rate_limited() {
    let mut rig = polling_rig();
    let mut cloud = ThingSpeakClient::new();

    assert_eq!(read(&mut rig, &mut cloud), Some(21.5));
    assert!(matches!(rig.sink.last(), Some(AppEvent::SensorReading(r)) if r.value == 21.5));
    assert_eq!(read(&mut rig, &mut cloud), None);

    rig.hw.advance(14_999);
    assert_eq!(read(&mut rig, &mut cloud), None);
    rig.hw.advance(1);
    assert_eq!(read(&mut rig, &mut cloud), Some(21.5));
}

#[test]
fn server_error_is_not_reported_as_reading() {
    let mut rig = polling_rig();
    let mut cloud = ThingSpeakClient::new();
    cloud.set_sim_response(500, "");
    assert_eq!(read(&mut rig, &mut cloud), None);
    assert!(!matches!(rig.sink.last(), Some(AppEvent::SensorReading(_))));

    // The failed attempt still consumed the interval.
    cloud.set_sim_response(200, r#"{"field1":"19.0"}"#);
    assert_eq!(read(&mut rig, &mut cloud), None);
    rig.hw.advance(15_000);
    assert_eq!(read(&mut rig, &mut cloud), Some(19.0));
}

#[test]
fn readings_never_move_the_damper() {
    let mut rig = polling_rig();
    let mut cloud = ThingSpeakClient::new();
    cloud.set_sim_response(200, r#"{"field1":"35.0"}"#);
    rig.hw.clear();
    let _ = read(&mut rig, &mut cloud);
    assert!(rig.hw.calls.is_empty());
    assert_eq!(rig.app.current_angle(), 90);
}
