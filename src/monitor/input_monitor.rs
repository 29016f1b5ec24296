//! Input monitoring session
//!
//! One [`MonitorHandle`] owns one monitoring session for one controller.
//! Two loops run while the session is open: a blocking read loop decoding
//! raw events into descriptions and [`InputState`] updates, and a ticker
//! republishing the full state snapshot at a fixed rate whether or not
//! anything changed.
//!
//! A disconnect or read failure ends the session with a terminal event;
//! sessions never restart themselves. `stop()` waits up to one second for
//! the read loop, then detaches it. A native read stuck inside the OS call
//! outlives the wait; the loop exits at its next wakeup.

use chrono::{DateTime, Local};
use statum::{machine, state};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::monitor::decode::InputState;
use crate::monitor::source::{RawEventSource, SourceError};

/// One entry of the human-readable session event feed.
#[derive(Clone, Debug)]
pub struct SessionEvent {
    pub description: String,
    pub timestamp: DateTime<Local>,
}

impl SessionEvent {
    fn now(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            timestamp: Local::now(),
        }
    }
}

/// Monitor settings.
#[derive(Clone, Debug)]
pub struct MonitorSettings {
    /// Interval between state snapshots in milliseconds (50 ms = 20 Hz).
    pub state_interval_ms: u64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            state_interval_ms: 50,
        }
    }
}

/// Monitor errors.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("No gamepads detected")]
    NoGamepad,

    #[error("Failed to initialize input monitor: {0}")]
    InitializationError(String),
}

// Session lifecycle states.
#[state]
#[derive(Debug, Clone)]
pub enum MonitorState {
    Starting,
    Running,
}

#[machine]
pub struct InputMonitor<S: MonitorState> {
    // Raw event supplier bound to one controller
    source: Box<dyn RawEventSource>,

    // Monitor settings
    settings: MonitorSettings,

    // Continuous input state, written only by the read loop
    input_state: InputState,

    // Outward event-description feed
    event_sender: mpsc::Sender<SessionEvent>,

    // Latest-state handoff to the ticker
    snapshot_sender: watch::Sender<InputState>,

    // Shared stop signal for read loop and ticker
    shutdown: CancellationToken,
}

// Methods available in all states
impl<S: MonitorState> InputMonitor<S> {
    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    fn emit(&self, description: impl Into<String>) {
        let event = SessionEvent::now(description);
        if let Err(e) = self.event_sender.try_send(event) {
            warn!("Dropping session event, feed not keeping up: {}", e);
        }
    }
}

// Implementation for Starting state
impl InputMonitor<Starting> {
    pub fn create(
        source: Box<dyn RawEventSource>,
        settings: Option<MonitorSettings>,
        event_sender: mpsc::Sender<SessionEvent>,
        snapshot_sender: watch::Sender<InputState>,
        shutdown: CancellationToken,
    ) -> Self {
        let settings = settings.unwrap_or_default();
        debug!("Creating Input Monitor with settings: {:?}", settings);
        Self::new(
            source,
            settings,
            InputState::default(),
            event_sender,
            snapshot_sender,
            shutdown,
        )
    }

    /// Verify a gamepad is present and transition to Running.
    pub fn start(self) -> Result<InputMonitor<Running>, MonitorError> {
        let count = self.source.connected_gamepads();
        if count == 0 {
            warn!("No raw-input-capable gamepads found");
            return Err(MonitorError::NoGamepad);
        }

        self.emit(format!("Found {} gamepad(s)", count));
        self.emit("Monitoring started - move controller to see events...");
        info!(
            "Input monitor initialized with {} gamepad(s), transitioning to Running",
            count
        );
        Ok(self.transition())
    }
}

// Implementation for Running state
impl InputMonitor<Running> {
    /// Blocking read loop; returns when stopped, disconnected or failed.
    pub fn run_read_loop(&mut self) {
        info!("Input monitor read loop started");

        loop {
            if self.shutdown.is_cancelled() {
                info!("Input monitor stop requested");
                break;
            }

            match self.source.next_events() {
                Ok(batch) => {
                    if batch.is_empty() {
                        continue;
                    }
                    for event in &batch {
                        if let Some(description) = self.input_state.apply(event) {
                            self.emit(description);
                        }
                    }
                    // Copy-on-publish: the ticker and any disconnect
                    // handling read clones, never the live structure.
                    self.snapshot_sender.send_replace(self.input_state.clone());
                }
                Err(SourceError::Disconnected) => {
                    warn!("Controller unplugged during monitoring");
                    self.emit("Controller disconnected!");
                    break;
                }
                Err(e) => {
                    error!("Input read failed: {}", e);
                    self.emit("Controller connection lost!");
                    break;
                }
            }
        }

        // Terminal for the whole session: take the ticker down too.
        self.shutdown.cancel();
        info!("Input monitor read loop stopped");
    }
}

/// Handle for one monitoring session.
pub struct MonitorHandle {
    shutdown: CancellationToken,
    read_task: Option<tokio::task::JoinHandle<()>>,
}

impl MonitorHandle {
    /// Spawn the read loop and state ticker for one controller session.
    ///
    /// `event_sender` receives the discrete event-description feed,
    /// `state_sender` the periodic full state snapshots.
    pub fn spawn(
        source: Box<dyn RawEventSource>,
        settings: Option<MonitorSettings>,
        event_sender: mpsc::Sender<SessionEvent>,
        state_sender: mpsc::Sender<InputState>,
    ) -> Result<Self, MonitorError> {
        info!("Spawning Input Monitor with settings: {:?}", settings);
        let settings = settings.unwrap_or_default();
        let shutdown = CancellationToken::new();

        let (snapshot_sender, snapshot_receiver) = watch::channel(InputState::default());

        let monitor = InputMonitor::create(
            source,
            Some(settings.clone()),
            event_sender.clone(),
            snapshot_sender,
            shutdown.clone(),
        );
        debug!("Monitor session configured: {:?}", monitor.settings());

        let ticker_shutdown = shutdown.clone();
        tokio::spawn(run_state_ticker(
            settings.state_interval_ms,
            snapshot_receiver,
            state_sender,
            ticker_shutdown,
        ));

        let loop_shutdown = shutdown.clone();
        let read_task = tokio::task::spawn_blocking(move || match monitor.start() {
            Ok(mut running) => running.run_read_loop(),
            Err(e) => {
                error!("Input monitor failed to start: {}", e);
                let event = SessionEvent::now(format!("ERROR: {}", e));
                if event_sender.try_send(event).is_err() {
                    warn!("Could not deliver monitor start-up error event");
                }
                loop_shutdown.cancel();
            }
        });

        info!("Input Monitor successfully started");
        Ok(Self {
            shutdown,
            read_task: Some(read_task),
        })
    }

    /// Signal the session to stop and wait up to one second for the read
    /// loop to wind down. Best-effort join: a read stuck in the OS call
    /// is detached, not awaited.
    pub async fn stop(mut self) {
        info!("Stopping input monitor session");
        self.shutdown.cancel();
        if let Some(task) = self.read_task.take() {
            if tokio::time::timeout(Duration::from_secs(1), task)
                .await
                .is_err()
            {
                warn!("Input monitor read loop did not stop within 1s, detaching");
            }
        }
    }
}

/// Fixed-rate republisher of the latest input state snapshot.
async fn run_state_ticker(
    interval_ms: u64,
    snapshot_receiver: watch::Receiver<InputState>,
    state_sender: mpsc::Sender<InputState>,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms.max(1)));
    info!("State ticker started with {} ms interval", interval_ms);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let current = snapshot_receiver.borrow().clone();
                if state_sender.try_send(current).is_err() {
                    debug!("State snapshot dropped, consumer not keeping up");
                }
            }
        }
    }

    info!("State ticker stopped");
}
