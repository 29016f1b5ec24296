//! Device detection subsystem
//!
//! Two native backends compose into one enumeration pass:
//!
//! 1. [`xinput`] - fixed four-slot capability scan
//! 2. [`hid`] - generic HID bus walk behind a classification heuristic
//!
//! # Architecture
//!
//! ```text
//! XInput slots ──► SystemEnumerator ──► Vec<DeviceDescriptor> ──► Poller
//! HID bus      ──►       │
//! ```
//!
//! Enumeration never fails: a missing driver or denied permission logs a
//! warning and contributes nothing to that cycle.

pub mod hid;
pub mod xinput;

use std::sync::Arc;

use tracing::debug;

use crate::config::DetectionConfig;
use crate::model::{ControllerType, DeviceDescriptor};

pub use hid::{HidBackend, HidClassifier};
pub use xinput::{subtype_name, XInputHandle, SLOT_COUNT};

/// Source of raw device descriptors, one fresh list per call.
///
/// Infallible by contract: backends swallow and log their own failures.
pub trait DeviceEnumerator: Send {
    fn enumerate(&mut self) -> Vec<DeviceDescriptor>;
}

/// Production enumerator combining the XInput slot scan with HID discovery.
pub struct SystemEnumerator {
    xinput: Arc<XInputHandle>,
    hid: HidBackend,
}

impl SystemEnumerator {
    pub fn new(rules: DetectionConfig, xinput: Arc<XInputHandle>) -> Self {
        Self {
            xinput,
            hid: HidBackend::new(rules),
        }
    }

    fn scan_xinput_slots(&self) -> Vec<DeviceDescriptor> {
        let mut descriptors = Vec::new();
        for slot in 0..SLOT_COUNT {
            let Some(caps) = self.xinput.capabilities(slot) else {
                continue;
            };
            let name = subtype_name(caps.subtype);
            debug!("Found XInput controller at slot {}: {}", slot, name);
            descriptors.push(DeviceDescriptor {
                name: name.to_string(),
                vendor_id: 0x045E,
                product_id: 0,
                path: None,
                slot: Some(slot),
                kind: ControllerType::Xbox,
            });
        }
        descriptors
    }
}

impl DeviceEnumerator for SystemEnumerator {
    fn enumerate(&mut self) -> Vec<DeviceDescriptor> {
        let mut descriptors = self.scan_xinput_slots();
        descriptors.extend(self.hid.enumerate());
        descriptors
    }
}
