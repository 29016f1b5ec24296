//! Controller poll loop
//!
//! Repeatedly enumerates devices, resolves batteries concurrently, and
//! publishes the assembled controller list whenever it differs from the
//! previous cycle. The cycle is a typestate machine:
//!
//! ```text
//! Scanning ──► Comparing ──► Publishing ──► Scanning
//!                  │                           ▲
//!                  └────────── (unchanged) ────┘
//! ```
//!
//! The loop never terminates on its own and no scan error escapes a
//! cycle: a failing backend contributes nothing, a failing battery lookup
//! yields an unavailable battery.

use statum::{machine, state};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::battery::BatteryProvider;
use crate::detect::DeviceEnumerator;
use crate::model::{Controller, DeviceDescriptor};

/// Poller settings.
#[derive(Clone, Debug)]
pub struct PollerSettings {
    /// Pause between cycles in milliseconds; the effective period is the
    /// cycle duration plus this pause.
    pub poll_interval_ms: u64,
    /// Hard per-device budget for a battery lookup.
    pub battery_timeout_ms: u64,
    /// Maximum battery lookups in flight at once.
    pub battery_concurrency: usize,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
            battery_timeout_ms: 1000,
            battery_concurrency: 4,
        }
    }
}

/// Poller errors.
#[derive(Debug, thiserror::Error)]
pub enum PollerError {
    #[error("Failed to initialize poller: {0}")]
    InitializationError(String),

    #[error("Channel error: {0}")]
    ChannelError(String),
}

/// Controller list assembled by one scan cycle.
#[derive(Debug, Clone)]
pub struct ScanBatch {
    pub controllers: Vec<Controller>,
}

// Poll cycle states.
#[state]
#[derive(Debug, Clone)]
pub enum PollState {
    Scanning,
    Comparing(ScanBatch),
    Publishing(ScanBatch),
}

#[machine]
pub struct DevicePoller<S: PollState> {
    // Device descriptor source
    enumerator: Box<dyn DeviceEnumerator>,

    // Platform battery provider
    battery: Arc<dyn BatteryProvider>,

    // Poller settings
    settings: PollerSettings,

    // Outward update feed, one full list per publish
    update_sender: mpsc::Sender<Vec<Controller>>,

    // Baseline for change detection; None until the first publish
    last_controllers: Option<Vec<Controller>>,

    // Bounds concurrent battery lookups
    lookup_slots: Arc<Semaphore>,
}

// Methods available in all states
impl<S: PollState> DevicePoller<S> {
    pub fn settings(&self) -> &PollerSettings {
        &self.settings
    }
}

/// Where a compared cycle goes next.
pub enum CompareOutcome {
    Changed(DevicePoller<Publishing>),
    Unchanged(DevicePoller<Scanning>),
}

// Implementation for Scanning state
impl DevicePoller<Scanning> {
    pub fn create(
        enumerator: Box<dyn DeviceEnumerator>,
        battery: Arc<dyn BatteryProvider>,
        settings: Option<PollerSettings>,
        update_sender: mpsc::Sender<Vec<Controller>>,
    ) -> Self {
        let settings = settings.unwrap_or_default();
        debug!("Creating Device Poller with settings: {:?}", settings);
        let lookup_slots = Arc::new(Semaphore::new(settings.battery_concurrency.max(1)));
        Self::new(
            enumerator,
            battery,
            settings,
            update_sender,
            None,
            lookup_slots,
        )
    }

    /// Enumerate devices and resolve their batteries concurrently.
    ///
    /// The cycle blocks until every dispatched lookup resolved or timed
    /// out, then assembles the list in enumeration order.
    pub async fn scan(mut self) -> DevicePoller<Comparing> {
        let descriptors = self.enumerator.enumerate();
        debug!("Scan found {} device(s)", descriptors.len());

        let lookups: Vec<JoinHandle<Option<u8>>> = descriptors
            .iter()
            .map(|descriptor| self.spawn_battery_lookup(descriptor.clone()))
            .collect();

        let mut controllers = Vec::with_capacity(descriptors.len());
        for (descriptor, lookup) in descriptors.iter().zip(lookups) {
            let battery = match lookup.await {
                Ok(battery) => battery,
                Err(e) => {
                    warn!(
                        "Battery lookup task for \"{}\" failed: {}",
                        descriptor.name, e
                    );
                    None
                }
            };
            controllers.push(Controller::from_descriptor(descriptor, battery));
        }

        self.transition_with(ScanBatch { controllers })
    }

    fn spawn_battery_lookup(&self, descriptor: DeviceDescriptor) -> JoinHandle<Option<u8>> {
        let provider = Arc::clone(&self.battery);
        let slots = Arc::clone(&self.lookup_slots);
        let budget = Duration::from_millis(self.settings.battery_timeout_ms);

        tokio::spawn(async move {
            let Ok(_permit) = slots.acquire().await else {
                return None;
            };

            let name = descriptor.name.clone();
            // The timeout only stops waiting: the native call cannot be
            // cancelled and may outlive its budget.
            let lookup =
                tokio::task::spawn_blocking(move || provider.battery_percent(&descriptor));
            match timeout(budget, lookup).await {
                Ok(Ok(battery)) => battery,
                Ok(Err(e)) => {
                    warn!("Battery lookup for \"{}\" failed: {}", name, e);
                    None
                }
                Err(_) => {
                    warn!(
                        "Battery lookup for \"{}\" exceeded {:?}, treating as unavailable",
                        name, budget
                    );
                    None
                }
            }
        })
    }
}

// Implementation for Comparing state
impl DevicePoller<Comparing> {
    /// Structural comparison against the previous cycle's list.
    ///
    /// The first cycle has no baseline and always publishes, even when
    /// the list is empty.
    pub fn compare(self) -> CompareOutcome {
        let controllers = match self.get_state_data() {
            Some(batch) => batch.controllers.clone(),
            None => {
                warn!("No scan batch in state data, this should not happen");
                Vec::new()
            }
        };

        let changed = match &self.last_controllers {
            Some(last) => *last != controllers,
            None => true,
        };

        if changed {
            debug!(
                "Controller list changed, publishing {} entries",
                controllers.len()
            );
            CompareOutcome::Changed(self.transition_with(ScanBatch { controllers }))
        } else {
            debug!("Controller list unchanged, skipping publish");
            CompareOutcome::Unchanged(self.transition())
        }
    }
}

// Implementation for Publishing state
impl DevicePoller<Publishing> {
    /// Emit the new list and store it as the comparison baseline.
    pub async fn publish(mut self) -> DevicePoller<Scanning> {
        let controllers = match self.get_state_data() {
            Some(batch) => batch.controllers.clone(),
            None => Vec::new(),
        };

        info!(
            "Publishing controller update with {} controller(s)",
            controllers.len()
        );
        if let Err(e) = self.update_sender.send(controllers.clone()).await {
            warn!("Controller update has no subscriber: {}", e);
        }

        self.last_controllers = Some(controllers);
        self.transition()
    }
}

/// Public interface for spawning the poll loop.
pub struct PollerHandle {}

impl PollerHandle {
    /// Create the poller and run it as a tokio task until process exit.
    pub fn spawn(
        enumerator: Box<dyn DeviceEnumerator>,
        battery: Arc<dyn BatteryProvider>,
        settings: Option<PollerSettings>,
        update_sender: mpsc::Sender<Vec<Controller>>,
    ) -> Result<Self, PollerError> {
        info!("Spawning Device Poller with settings: {:?}", settings);

        let poller = DevicePoller::create(enumerator, battery, settings, update_sender);

        info!("Spawning Device Poller task");
        tokio::spawn(async move {
            run_poller_loop(poller).await;
        });

        info!("Device Poller successfully started");
        Ok(Self {})
    }
}

/// Drive the poll cycle forever.
async fn run_poller_loop(mut poller: DevicePoller<Scanning>) {
    let pause = Duration::from_millis(poller.settings().poll_interval_ms);
    info!("Entering poll loop with {:?} pause between cycles", pause);

    loop {
        let comparing = poller.scan().await;
        poller = match comparing.compare() {
            CompareOutcome::Changed(publishing) => publishing.publish().await,
            CompareOutcome::Unchanged(scanning) => scanning,
        };

        tokio::time::sleep(pause).await;
    }
}
