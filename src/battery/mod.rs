//! Battery reporting subsystem
//!
//! A [`BatteryProvider`] answers charge queries for scan descriptors. The
//! concrete provider is picked once at startup by [`platform_provider`];
//! platforms without a supported battery API get [`NoopBatteryProvider`],
//! which reports every device as "unavailable" instead of failing.
//!
//! No provider ever raises past its boundary: native failure, a foreign
//! descriptor, or an unrecognized charge level all come back as `None`.

pub mod xinput;

use std::sync::Arc;

use tracing::debug;

use crate::detect::XInputHandle;
use crate::model::DeviceDescriptor;

pub use xinput::XInputBatteryProvider;

/// Charge lookup for one detected device, normalized to percent.
pub trait BatteryProvider: Send + Sync {
    /// Battery percentage in `0..=100`, or `None` when unavailable.
    fn battery_percent(&self, descriptor: &DeviceDescriptor) -> Option<u8>;
}

/// Map the discrete XInput charge level to a display percentage.
///
/// Levels are EMPTY/LOW/MEDIUM/FULL; anything else is unavailable.
pub fn charge_level_to_percent(level: u8) -> Option<u8> {
    match level {
        0 => Some(10),
        1 => Some(30),
        2 => Some(65),
        3 => Some(100),
        _ => None,
    }
}

/// Provider for platforms without battery support.
pub struct NoopBatteryProvider;

impl BatteryProvider for NoopBatteryProvider {
    fn battery_percent(&self, descriptor: &DeviceDescriptor) -> Option<u8> {
        debug!(
            "Battery reporting unsupported on this platform, no data for \"{}\"",
            descriptor.name
        );
        None
    }
}

/// Select the battery provider for the current platform.
///
/// Windows gets the XInput-backed provider; everything else is a no-op
/// until a platform backend exists for it.
pub fn platform_provider(xinput: Arc<XInputHandle>) -> Arc<dyn BatteryProvider> {
    if cfg!(windows) {
        Arc::new(XInputBatteryProvider::new(xinput))
    } else {
        Arc::new(NoopBatteryProvider)
    }
}
