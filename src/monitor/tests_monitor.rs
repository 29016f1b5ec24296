use std::collections::VecDeque;
use std::thread;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::monitor::decode::InputState;
use crate::monitor::input_monitor::{MonitorHandle, MonitorSettings, SessionEvent};
use crate::monitor::source::{RawEventSource, RawInputEvent, SourceError};

/// Scripted source: plays back batches in order, then idles forever.
struct ScriptedSource {
    gamepads: usize,
    script: VecDeque<Result<Vec<RawInputEvent>, SourceError>>,
}

impl ScriptedSource {
    fn new(gamepads: usize, script: Vec<Result<Vec<RawInputEvent>, SourceError>>) -> Self {
        Self {
            gamepads,
            script: script.into(),
        }
    }
}

impl RawEventSource for ScriptedSource {
    fn connected_gamepads(&self) -> usize {
        self.gamepads
    }

    fn next_events(&mut self) -> Result<Vec<RawInputEvent>, SourceError> {
        match self.script.pop_front() {
            Some(step) => step,
            None => {
                thread::sleep(Duration::from_millis(2));
                Ok(Vec::new())
            }
        }
    }
}

async fn next_event(receiver: &mut mpsc::Receiver<SessionEvent>) -> SessionEvent {
    timeout(Duration::from_secs(2), receiver.recv())
        .await
        .expect("timed out waiting for session event")
        .expect("event feed closed early")
}

#[tokio::test(flavor = "multi_thread")]
async fn press_release_then_disconnect_is_terminal() {
    let source = ScriptedSource::new(
        1,
        vec![
            Ok(vec![RawInputEvent::key("BTN_SOUTH", 1)]),
            Ok(vec![RawInputEvent::key("BTN_SOUTH", 0)]),
            Err(SourceError::Disconnected),
        ],
    );
    let (event_sender, mut event_receiver) = mpsc::channel(100);
    let (state_sender, _state_receiver) = mpsc::channel::<InputState>(100);

    let _handle = MonitorHandle::spawn(Box::new(source), None, event_sender, state_sender)
        .expect("monitor should spawn");

    assert_eq!(
        next_event(&mut event_receiver).await.description,
        "Found 1 gamepad(s)"
    );
    assert_eq!(
        next_event(&mut event_receiver).await.description,
        "Monitoring started - move controller to see events..."
    );
    assert_eq!(
        next_event(&mut event_receiver).await.description,
        "Button A pressed"
    );
    assert_eq!(
        next_event(&mut event_receiver).await.description,
        "Button A released"
    );
    assert_eq!(
        next_event(&mut event_receiver).await.description,
        "Controller disconnected!"
    );

    // The session is over: every sender is gone and the feed closes.
    let closed = timeout(Duration::from_secs(2), event_receiver.recv())
        .await
        .expect("feed should close after disconnect");
    assert!(closed.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn read_failure_reports_connection_lost() {
    let source = ScriptedSource::new(1, vec![Err(SourceError::Io("read failed".to_string()))]);
    let (event_sender, mut event_receiver) = mpsc::channel(100);
    let (state_sender, _state_receiver) = mpsc::channel::<InputState>(100);

    let _handle = MonitorHandle::spawn(Box::new(source), None, event_sender, state_sender)
        .expect("monitor should spawn");

    let mut descriptions = Vec::new();
    for _ in 0..3 {
        descriptions.push(next_event(&mut event_receiver).await.description);
    }
    assert_eq!(descriptions[2], "Controller connection lost!");
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_gamepad_emits_terminal_error() {
    let source = ScriptedSource::new(0, Vec::new());
    let (event_sender, mut event_receiver) = mpsc::channel(100);
    let (state_sender, _state_receiver) = mpsc::channel::<InputState>(100);

    let _handle = MonitorHandle::spawn(Box::new(source), None, event_sender, state_sender)
        .expect("spawn itself succeeds, the session fails");

    assert_eq!(
        next_event(&mut event_receiver).await.description,
        "ERROR: No gamepads detected"
    );
    let closed = timeout(Duration::from_secs(2), event_receiver.recv())
        .await
        .expect("feed should close after the start-up error");
    assert!(closed.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn snapshot_feed_reflects_held_buttons() {
    let source = ScriptedSource::new(1, vec![Ok(vec![RawInputEvent::key("BTN_SOUTH", 1)])]);
    let settings = MonitorSettings {
        state_interval_ms: 10,
    };
    let (event_sender, _event_receiver) = mpsc::channel(100);
    let (state_sender, mut state_receiver) = mpsc::channel::<InputState>(100);

    let handle = MonitorHandle::spawn(Box::new(source), Some(settings), event_sender, state_sender)
        .expect("monitor should spawn");

    // The ticker republishes whether or not anything changed; keep
    // reading until the press shows up.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let snapshot = timeout(Duration::from_secs(2), state_receiver.recv())
            .await
            .expect("timed out waiting for a snapshot")
            .expect("state feed closed early");
        if snapshot.buttons.contains("A") {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "press never reached the snapshot feed"
        );
    }

    handle.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn stop_returns_within_the_grace_period() {
    let source = ScriptedSource::new(1, Vec::new());
    let (event_sender, _event_receiver) = mpsc::channel(100);
    let (state_sender, _state_receiver) = mpsc::channel::<InputState>(100);

    let handle = MonitorHandle::spawn(Box::new(source), None, event_sender, state_sender)
        .expect("monitor should spawn");

    timeout(Duration::from_millis(1500), handle.stop())
        .await
        .expect("stop must return within its bounded wait");
}
