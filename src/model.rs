//! Controller domain model
//!
//! Plain value objects produced by the detection pipeline. A fresh
//! [`Controller`] list is built on every poll cycle; change detection is
//! structural equality against the previous list, position by position.
//! Nothing in here is persisted.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Family a detected controller belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControllerType {
    Xbox,
    PlayStation,
    Nintendo,
    Unknown,
}

impl ControllerType {
    /// Infer the controller family from a USB/Bluetooth vendor id.
    pub fn from_vendor(vendor_id: u16) -> Self {
        match vendor_id {
            0x045E => ControllerType::Xbox,
            0x054C => ControllerType::PlayStation,
            0x057E => ControllerType::Nintendo,
            _ => ControllerType::Unknown,
        }
    }
}

impl fmt::Display for ControllerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ControllerType::Xbox => "Xbox",
            ControllerType::PlayStation => "PlayStation",
            ControllerType::Nintendo => "Nintendo",
            ControllerType::Unknown => "Unknown",
        };
        write!(f, "{}", label)
    }
}

/// Transport the controller is attached over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionType {
    Usb,
    Bluetooth,
    Unknown,
}

impl ConnectionType {
    /// Infer the connection medium from a device bus path.
    ///
    /// Case-insensitive substring match: a Bluetooth token wins over USB,
    /// a missing or unrecognized path yields [`ConnectionType::Unknown`].
    pub fn from_path(path: Option<&str>) -> Self {
        let Some(path) = path else {
            return ConnectionType::Unknown;
        };
        let path = path.to_ascii_lowercase();
        if path.contains("bluetooth") || path.contains("#bth#") {
            ConnectionType::Bluetooth
        } else if path.contains("usb") {
            ConnectionType::Usb
        } else {
            ConnectionType::Unknown
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionType::Usb => "USB",
            ConnectionType::Bluetooth => "Bluetooth",
            ConnectionType::Unknown => "Unknown",
        };
        write!(f, "{}", label)
    }
}

/// Raw enumeration result, rebuilt on every scan and never persisted.
///
/// `slot` carries the XInput user index for slot-scanned devices; HID
/// devices carry their bus `path` instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub name: String,
    pub vendor_id: u16,
    pub product_id: u16,
    pub path: Option<String>,
    pub slot: Option<u32>,
    pub kind: ControllerType,
}

/// Detected controller as published to subscribers.
///
/// Structural equality over all fields drives the poller's change
/// detection. `battery` is a percentage in `0..=100` when known.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Controller {
    pub name: String,
    pub kind: ControllerType,
    pub connection: ConnectionType,
    pub battery: Option<u8>,
}

impl Controller {
    /// Build the published value from a scan descriptor and its battery
    /// lookup result.
    pub fn from_descriptor(descriptor: &DeviceDescriptor, battery: Option<u8>) -> Self {
        Self {
            name: descriptor.name.clone(),
            kind: descriptor.kind,
            connection: ConnectionType::from_path(descriptor.path.as_deref()),
            battery,
        }
    }
}

impl fmt::Display for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.battery {
            Some(pct) => write!(
                f,
                "{} [{}] {}% ({})",
                self.name, self.kind, pct, self.connection
            ),
            None => write!(f, "{} [{}] N/A ({})", self.name, self.kind, self.connection),
        }
    }
}
