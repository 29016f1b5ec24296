pub mod battery;
pub mod config;
pub mod detect;
pub mod model;
pub mod monitor;
pub mod poller;

use std::sync::Arc;

use color_eyre::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::battery::platform_provider;
use crate::config::Config;
use crate::detect::{SystemEnumerator, XInputHandle};
use crate::monitor::{GilrsEventSource, MonitorHandle, MonitorSettings};
use crate::poller::{PollerHandle, PollerSettings};

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config = Config::load();

    // One explicitly constructed XInput handle feeds both the enumerator
    // and the battery provider.
    let xinput = Arc::new(XInputHandle::new());
    let enumerator = SystemEnumerator::new(config.detection.clone(), Arc::clone(&xinput));
    let battery = platform_provider(xinput);

    let poller_settings = PollerSettings {
        poll_interval_ms: config.poller.poll_interval_ms,
        battery_timeout_ms: config.poller.battery_timeout_ms,
        battery_concurrency: config.poller.battery_concurrency,
    };

    let (update_sender, mut update_receiver) = mpsc::channel(100);
    let _poller = PollerHandle::spawn(
        Box::new(enumerator),
        battery,
        Some(poller_settings),
        update_sender,
    )?;
    info!("Controller poller started");

    // Stand-in for the events window: open one monitoring session and
    // log its feeds.
    let _session = if config.monitor.autostart_session {
        spawn_logging_session(&config)
    } else {
        None
    };

    // Headless consumer of the update feed, logging each published list
    // the way the tray menu renders it.
    while let Some(controllers) = update_receiver.recv().await {
        if controllers.is_empty() {
            info!("No controllers detected");
            continue;
        }
        info!("{} controller(s) detected", controllers.len());
        for controller in &controllers {
            info!("  {}", controller);
        }
    }

    Ok(())
}

/// Open an input monitoring session and log both of its feeds.
fn spawn_logging_session(config: &Config) -> Option<MonitorHandle> {
    let source = match GilrsEventSource::new(config.monitor.controller_index) {
        Ok(source) => source,
        Err(e) => {
            warn!("Input monitoring unavailable: {}", e);
            return None;
        }
    };

    let settings = MonitorSettings {
        state_interval_ms: config.monitor.state_interval_ms,
    };
    let (event_sender, mut event_receiver) = mpsc::channel(100);
    let (state_sender, mut state_receiver) = mpsc::channel(100);

    let handle = match MonitorHandle::spawn(
        Box::new(source),
        Some(settings),
        event_sender,
        state_sender,
    ) {
        Ok(handle) => handle,
        Err(e) => {
            warn!("Failed to start input monitor: {}", e);
            return None;
        }
    };

    tokio::spawn(async move {
        while let Some(event) = event_receiver.recv().await {
            info!(
                "[{}] {}",
                event.timestamp.format("%H:%M:%S.%3f"),
                event.description
            );
        }
        info!("Input monitoring session ended");
    });

    tokio::spawn(async move {
        while let Some(state) = state_receiver.recv().await {
            debug!(
                "Input state: buttons={:?} L=({:.2},{:.2}) R=({:.2},{:.2}) LT={:.2} RT={:.2}",
                state.buttons,
                state.left_stick.0,
                state.left_stick.1,
                state.right_stick.0,
                state.right_stick.1,
                state.left_trigger,
                state.right_trigger
            );
        }
    });

    Some(handle)
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
