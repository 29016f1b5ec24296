//! XInput battery provider
//!
//! Queries the discrete charge level for a slot and maps it to a fixed
//! percentage. Descriptors without a slot (HID-detected pads that also
//! occupy an XInput slot) are resolved by probing all four slots in order,
//! first answer wins; the answering slot is remembered so the next probe
//! starts there.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::battery::{charge_level_to_percent, BatteryProvider};
use crate::detect::{XInputHandle, SLOT_COUNT};
use crate::model::DeviceDescriptor;

pub struct XInputBatteryProvider {
    xinput: Arc<XInputHandle>,
    /// Last slot that answered a probe; `SLOT_COUNT` means none yet.
    last_slot: AtomicU32,
}

impl XInputBatteryProvider {
    pub fn new(xinput: Arc<XInputHandle>) -> Self {
        Self {
            xinput,
            last_slot: AtomicU32::new(SLOT_COUNT),
        }
    }

    fn query_slot(&self, slot: u32) -> Option<u8> {
        let level = self.xinput.battery_level(slot)?;
        let percent = charge_level_to_percent(level);
        debug!(
            "XInput battery for slot {}: level {} -> {:?}",
            slot, level, percent
        );
        percent
    }

    fn probe_slots(&self) -> Option<u8> {
        let remembered = self.last_slot.load(Ordering::Relaxed);
        let start = if remembered < SLOT_COUNT { remembered } else { 0 };

        for offset in 0..SLOT_COUNT {
            let slot = (start + offset) % SLOT_COUNT;
            if let Some(percent) = self.query_slot(slot) {
                self.last_slot.store(slot, Ordering::Relaxed);
                return Some(percent);
            }
        }
        None
    }
}

impl BatteryProvider for XInputBatteryProvider {
    fn battery_percent(&self, descriptor: &DeviceDescriptor) -> Option<u8> {
        match descriptor.slot {
            Some(slot) => self.query_slot(slot),
            None => self.probe_slots(),
        }
    }
}
