//! HID bus enumeration and classification
//!
//! Wireless receivers (Logitech Unifying-style dongles, DualShock/DualSense
//! over Bluetooth, Switch Pro pads) do not occupy XInput slots, so they are
//! picked up from the generic HID bus instead. The bus also carries
//! keyboards, mice and sensors, which is where [`HidClassifier`] comes in:
//! a name/vendor heuristic that keeps gaming-relevant devices and drops the
//! rest. The keyword and vendor tables come from [`DetectionConfig`] and
//! are a known-incomplete subset; misclassification is an accepted
//! limitation of this path, not a bug.

use hidapi::HidApi;
use tracing::{debug, warn};

use crate::config::DetectionConfig;
use crate::model::{ControllerType, DeviceDescriptor};

/// Name/vendor heuristic deciding whether a HID device is a controller.
#[derive(Clone, Debug)]
pub struct HidClassifier {
    rules: DetectionConfig,
}

impl HidClassifier {
    pub fn new(rules: DetectionConfig) -> Self {
        Self { rules }
    }

    /// Accept a device iff it survives the exclusion list and either names
    /// itself as gaming gear or comes from a trusted controller vendor.
    pub fn accept(&self, name: &str, vendor_id: u16) -> bool {
        let name = name.to_ascii_lowercase();

        if self
            .rules
            .excluded_keywords
            .iter()
            .any(|keyword| name.contains(keyword.as_str()))
        {
            return false;
        }

        if !self.rules.wireless_vendors.contains(&vendor_id) {
            return false;
        }

        let has_gaming_keyword = self
            .rules
            .gaming_keywords
            .iter()
            .any(|keyword| name.contains(keyword.as_str()));

        has_gaming_keyword || self.rules.trusted_vendors.contains(&vendor_id)
    }
}

/// HID enumeration backend.
///
/// Holds the `hidapi` context for the process lifetime; a failed context
/// init is remembered and the backend contributes nothing from then on.
pub struct HidBackend {
    api: Option<HidApi>,
    classifier: HidClassifier,
}

impl HidBackend {
    pub fn new(rules: DetectionConfig) -> Self {
        let api = match HidApi::new() {
            Ok(api) => Some(api),
            Err(e) => {
                warn!("Failed to initialize HID API: {}, HID detection disabled", e);
                None
            }
        };
        Self {
            api,
            classifier: HidClassifier::new(rules),
        }
    }

    /// List gaming-relevant HID devices. Failures yield an empty list.
    pub fn enumerate(&mut self) -> Vec<DeviceDescriptor> {
        let Some(api) = self.api.as_mut() else {
            return Vec::new();
        };

        if let Err(e) = api.refresh_devices() {
            warn!("HID device refresh failed: {}", e);
            return Vec::new();
        }

        let mut descriptors = Vec::new();
        for info in api.device_list() {
            let name = info.product_string().unwrap_or("Unknown HID Device");
            let vendor_id = info.vendor_id();

            if !self.classifier.accept(name, vendor_id) {
                continue;
            }

            let path = info.path().to_string_lossy().into_owned();
            debug!(
                "Accepted HID device {:04x}:{:04x} \"{}\" at {}",
                vendor_id,
                info.product_id(),
                name,
                path
            );
            descriptors.push(DeviceDescriptor {
                name: name.to_string(),
                vendor_id,
                product_id: info.product_id(),
                path: Some(path),
                slot: None,
                kind: ControllerType::from_vendor(vendor_id),
            });
        }
        descriptors
    }
}
