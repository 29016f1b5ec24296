use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::battery::BatteryProvider;
use crate::detect::DeviceEnumerator;
use crate::model::{ConnectionType, Controller, ControllerType, DeviceDescriptor};
use crate::poller::device_poller::{PollerHandle, PollerSettings};

/// Scripted enumerator: plays back scans in order, then repeats the last.
struct ScriptedEnumerator {
    scans: VecDeque<Vec<DeviceDescriptor>>,
    repeat: Vec<DeviceDescriptor>,
}

impl ScriptedEnumerator {
    fn new(scans: Vec<Vec<DeviceDescriptor>>) -> Self {
        let repeat = scans.last().cloned().unwrap_or_default();
        Self {
            scans: scans.into(),
            repeat,
        }
    }
}

impl DeviceEnumerator for ScriptedEnumerator {
    fn enumerate(&mut self) -> Vec<DeviceDescriptor> {
        self.scans
            .pop_front()
            .unwrap_or_else(|| self.repeat.clone())
    }
}

/// Always answers the same battery percentage.
struct FixedBattery(Option<u8>);

impl BatteryProvider for FixedBattery {
    fn battery_percent(&self, _descriptor: &DeviceDescriptor) -> Option<u8> {
        self.0
    }
}

/// Plays back scripted answers, then sticks to a fallback.
struct ScriptedBattery {
    answers: Mutex<VecDeque<Option<u8>>>,
    fallback: Option<u8>,
}

impl BatteryProvider for ScriptedBattery {
    fn battery_percent(&self, _descriptor: &DeviceDescriptor) -> Option<u8> {
        let mut answers = match self.answers.lock() {
            Ok(answers) => answers,
            Err(poisoned) => poisoned.into_inner(),
        };
        answers.pop_front().unwrap_or(self.fallback)
    }
}

/// Blocks longer than any sensible lookup budget.
struct SlowBattery {
    delay: Duration,
}

impl BatteryProvider for SlowBattery {
    fn battery_percent(&self, _descriptor: &DeviceDescriptor) -> Option<u8> {
        std::thread::sleep(self.delay);
        Some(100)
    }
}

fn xbox_pad(name: &str) -> DeviceDescriptor {
    DeviceDescriptor {
        name: name.to_string(),
        vendor_id: 0x045E,
        product_id: 0,
        path: None,
        slot: Some(0),
        kind: ControllerType::Xbox,
    }
}

fn usb_pad(name: &str) -> DeviceDescriptor {
    DeviceDescriptor {
        name: name.to_string(),
        vendor_id: 0x054C,
        product_id: 0x09CC,
        path: Some("/dev/hidraw2 (usb-0000:00:14.0-2)".to_string()),
        slot: None,
        kind: ControllerType::PlayStation,
    }
}

fn fast_settings() -> PollerSettings {
    PollerSettings {
        poll_interval_ms: 10,
        battery_timeout_ms: 100,
        battery_concurrency: 4,
    }
}

async fn next_update(receiver: &mut mpsc::Receiver<Vec<Controller>>) -> Vec<Controller> {
    timeout(Duration::from_secs(2), receiver.recv())
        .await
        .expect("timed out waiting for a controller update")
        .expect("update feed closed early")
}

async fn assert_silent(receiver: &mut mpsc::Receiver<Vec<Controller>>) {
    assert!(
        timeout(Duration::from_millis(200), receiver.recv())
            .await
            .is_err(),
        "poller published without an underlying change"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn identical_scans_publish_exactly_once() {
    let enumerator = ScriptedEnumerator::new(vec![vec![xbox_pad("Xbox Controller")]]);
    let (sender, mut receiver) = mpsc::channel(16);

    let _poller = PollerHandle::spawn(
        Box::new(enumerator),
        Arc::new(FixedBattery(Some(65))),
        Some(fast_settings()),
        sender,
    )
    .expect("poller should spawn");

    let update = next_update(&mut receiver).await;
    assert_eq!(update.len(), 1);
    assert_eq!(update[0].name, "Xbox Controller");
    assert_eq!(update[0].kind, ControllerType::Xbox);
    assert_eq!(update[0].connection, ConnectionType::Unknown);
    assert_eq!(update[0].battery, Some(65));

    // Several more identical cycles fit in this window; none may publish.
    assert_silent(&mut receiver).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn battery_change_triggers_exactly_one_more_publish() {
    let enumerator = ScriptedEnumerator::new(vec![vec![xbox_pad("Xbox Controller")]]);
    let battery = ScriptedBattery {
        answers: Mutex::new(VecDeque::from([Some(65)])),
        fallback: Some(100),
    };
    let (sender, mut receiver) = mpsc::channel(16);

    let _poller = PollerHandle::spawn(
        Box::new(enumerator),
        Arc::new(battery),
        Some(fast_settings()),
        sender,
    )
    .expect("poller should spawn");

    assert_eq!(next_update(&mut receiver).await[0].battery, Some(65));
    assert_eq!(next_update(&mut receiver).await[0].battery, Some(100));
    assert_silent(&mut receiver).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_scan_publishes_empty_list_once_then_stays_silent() {
    let enumerator = ScriptedEnumerator::new(vec![Vec::new()]);
    let (sender, mut receiver) = mpsc::channel(16);

    let _poller = PollerHandle::spawn(
        Box::new(enumerator),
        Arc::new(FixedBattery(None)),
        Some(fast_settings()),
        sender,
    )
    .expect("poller should spawn");

    assert!(next_update(&mut receiver).await.is_empty());
    assert_silent(&mut receiver).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn added_device_changes_the_published_list() {
    let enumerator = ScriptedEnumerator::new(vec![
        vec![xbox_pad("Xbox Controller")],
        vec![xbox_pad("Xbox Controller"), usb_pad("Wireless Controller")],
    ]);
    let (sender, mut receiver) = mpsc::channel(16);

    let _poller = PollerHandle::spawn(
        Box::new(enumerator),
        Arc::new(FixedBattery(Some(100))),
        Some(fast_settings()),
        sender,
    )
    .expect("poller should spawn");

    assert_eq!(next_update(&mut receiver).await.len(), 1);

    let update = next_update(&mut receiver).await;
    assert_eq!(update.len(), 2);
    assert_eq!(update[1].kind, ControllerType::PlayStation);
    assert_eq!(update[1].connection, ConnectionType::Usb);
    assert_silent(&mut receiver).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn slow_battery_lookup_degrades_to_unavailable() {
    let enumerator = ScriptedEnumerator::new(vec![vec![xbox_pad("Xbox Controller")]]);
    let battery = SlowBattery {
        delay: Duration::from_millis(400),
    };
    let settings = PollerSettings {
        poll_interval_ms: 10,
        battery_timeout_ms: 50,
        battery_concurrency: 4,
    };
    let (sender, mut receiver) = mpsc::channel(16);

    let _poller = PollerHandle::spawn(
        Box::new(enumerator),
        Arc::new(battery),
        Some(settings),
        sender,
    )
    .expect("poller should spawn");

    // The timed-out lookup must not fail the scan, only its battery.
    let update = next_update(&mut receiver).await;
    assert_eq!(update.len(), 1);
    assert_eq!(update[0].battery, None);
}
