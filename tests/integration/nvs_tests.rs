//! Calibration persisted through the NVS adapter's simulation backend,
//! across a simulated power cycle.

use super::mock_hw::{MockBoard, MockDecoder, MockLink, RecordingSink, test_config};

use airvent::adapters::nvs::NvsAdapter;
use airvent::app::events::AppEvent;
use airvent::app::keymap::RemoteKey;
use airvent::app::ports::{ConfigPort, StoreError};
use airvent::app::service::AppService;
use airvent::error::Fault;

struct Device {
    app: AppService,
    hw: MockBoard,
    ir: MockDecoder,
    link: MockLink,
    sink: RecordingSink,
}

impl Device {
    fn boot(nvs: &NvsAdapter) -> Self {
        let config = nvs.load().unwrap();
        let mut dev = Self {
            app: AppService::new(config, nvs),
            hw: MockBoard::new(),
            ir: MockDecoder::new(),
            link: MockLink::new(Some(0)),
            sink: RecordingSink::new(),
        };
        dev.app.start(&mut dev.hw, &mut dev.sink);
        dev
    }

    fn press(&mut self, key: RemoteKey, nvs: &mut NvsAdapter) {
        self.ir.press(key);
        self.app
            .poll(&mut self.hw, &mut self.ir, &mut self.link, nvs, &mut self.sink);
    }
}

#[test]
fn calibrated_limits_survive_power_cycle() {
    let mut nvs = NvsAdapter::new().unwrap();
    let mut dev = Device::boot(&nvs);
    assert_eq!(
        dev.sink.events[0],
        AppEvent::Started { closed: 80, open: 100, angle: 90 }
    );

    for key in [RemoteKey::Blue, RemoteKey::Smooth, RemoteKey::Flash, RemoteKey::Flash, RemoteKey::Up] {
        dev.press(key, &mut nvs);
    }
    for key in [RemoteKey::Blue, RemoteKey::Smooth, RemoteKey::Smooth, RemoteKey::Fade, RemoteKey::Down] {
        dev.press(key, &mut nvs);
    }
    assert_eq!((dev.app.limits().closed(), dev.app.limits().open()), (84, 100));

    nvs.reboot();
    let dev = Device::boot(&nvs);
    assert_eq!(
        dev.sink.events[0],
        AppEvent::Started { closed: 84, open: 100, angle: 90 }
    );
}

#[test]
fn first_commit_on_erased_flash_keeps_other_slot_erased() {
    let mut nvs = NvsAdapter::new().unwrap();
    let mut dev = Device::boot(&nvs);
    for key in [RemoteKey::Blue, RemoteKey::Smooth, RemoteKey::Down] {
        dev.press(key, &mut nvs);
    }
    assert_eq!(dev.app.limits().closed(), 90);

    // Only the closed slot is valid on flash, so the pair falls back.
    nvs.reboot();
    let dev = Device::boot(&nvs);
    assert_eq!((dev.app.limits().closed(), dev.app.limits().open()), (80, 100));
}

#[test]
fn failed_commit_is_lost_on_power_cycle() {
    let mut nvs = NvsAdapter::new().unwrap();
    let mut dev = Device::boot(&nvs);
    for key in [RemoteKey::Blue, RemoteKey::Smooth, RemoteKey::Flash, RemoteKey::Up] {
        dev.press(key, &mut nvs);
    }
    for key in [RemoteKey::Blue, RemoteKey::Smooth, RemoteKey::Smooth, RemoteKey::Down] {
        dev.press(key, &mut nvs);
    }

    nvs.set_fail_commits(true);
    for key in [RemoteKey::Blue, RemoteKey::Smooth, RemoteKey::Flash, RemoteKey::Flash, RemoteKey::Up] {
        dev.press(key, &mut nvs);
    }
    assert!(dev.sink.contains(&AppEvent::PersistFailed(StoreError::CommitFailed)));
    assert!(dev.app.faults().contains(Fault::Persistence));
    assert_eq!(dev.app.limits().open(), 100);

    nvs.set_fail_commits(false);
    nvs.reboot();
    let dev = Device::boot(&nvs);
    assert_eq!((dev.app.limits().closed(), dev.app.limits().open()), (85, 95));
}

#[test]
fn saved_config_drives_timing() {
    let mut nvs = NvsAdapter::new().unwrap();
    let mut cfg = test_config();
    cfg.timing.step_deg = 2;
    nvs.save(&cfg).unwrap();

    let mut dev = Device::boot(&nvs);
    dev.press(RemoteKey::Up, &mut nvs);
    assert_eq!(dev.app.current_angle(), 92);
}
