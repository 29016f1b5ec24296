//! XInput capability handle
//!
//! Thin wrapper over the XInput slot API. Constructed explicitly at startup
//! and handed to the enumerator and the battery provider; there is no
//! process-global instance. Off Windows every query answers `None`, which
//! callers treat the same as an empty slot.

use tracing::debug;

/// Number of simultaneously supported XInput slots.
pub const SLOT_COUNT: u32 = 4;

// XInput device subtypes (XINPUT_DEVSUBTYPE_*).
const DEVSUBTYPE_GAMEPAD: u8 = 0x01;
const DEVSUBTYPE_WHEEL: u8 = 0x02;
const DEVSUBTYPE_ARCADE_STICK: u8 = 0x03;
const DEVSUBTYPE_FLIGHT_STICK: u8 = 0x04;
const DEVSUBTYPE_DANCE_PAD: u8 = 0x05;
const DEVSUBTYPE_GUITAR: u8 = 0x06;
const DEVSUBTYPE_DRUM_KIT: u8 = 0x08;

/// Capability answer for an occupied slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotCapabilities {
    pub subtype: u8,
}

/// Human-readable device name for an XInput capability subtype.
pub fn subtype_name(subtype: u8) -> &'static str {
    match subtype {
        DEVSUBTYPE_GAMEPAD => "Xbox Controller",
        DEVSUBTYPE_WHEEL => "Xbox Racing Wheel",
        DEVSUBTYPE_ARCADE_STICK => "Xbox Arcade Stick",
        DEVSUBTYPE_FLIGHT_STICK => "Xbox Flight Stick",
        DEVSUBTYPE_DANCE_PAD => "Xbox Dance Pad",
        DEVSUBTYPE_GUITAR => "Xbox Guitar",
        DEVSUBTYPE_DRUM_KIT => "Xbox Drum Kit",
        _ => "Xbox Compatible Controller",
    }
}

/// Handle to the XInput API.
///
/// Methods answer `None` for empty slots, for any native failure, and
/// unconditionally on platforms without XInput.
pub struct XInputHandle {
    _private: (),
}

impl XInputHandle {
    pub fn new() -> Self {
        debug!("Constructed XInput handle");
        Self { _private: () }
    }

    /// Query capabilities for one slot. `Some` iff the slot is occupied.
    #[cfg(windows)]
    pub fn capabilities(&self, slot: u32) -> Option<SlotCapabilities> {
        use windows_sys::Win32::UI::Input::XboxController::{
            XInputGetCapabilities, XINPUT_CAPABILITIES,
        };

        // FFI struct: must be manually zeroed.
        let mut caps: XINPUT_CAPABILITIES = unsafe { std::mem::zeroed() };
        // Returns 0 (ERROR_SUCCESS) only when the slot is occupied.
        let result = unsafe { XInputGetCapabilities(slot, 0, &mut caps) };
        if result != 0 {
            return None;
        }
        Some(SlotCapabilities {
            subtype: caps.SubType,
        })
    }

    #[cfg(not(windows))]
    pub fn capabilities(&self, _slot: u32) -> Option<SlotCapabilities> {
        None
    }

    /// Query the discrete battery charge level (0..=3) for one slot.
    #[cfg(windows)]
    pub fn battery_level(&self, slot: u32) -> Option<u8> {
        use windows_sys::Win32::UI::Input::XboxController::{
            XInputGetBatteryInformation, XINPUT_BATTERY_INFORMATION,
        };

        // BATTERY_DEVTYPE_GAMEPAD: query the controller itself, not a
        // headset attached to it.
        const BATTERY_DEVTYPE_GAMEPAD: u8 = 0x00;

        let mut info: XINPUT_BATTERY_INFORMATION = unsafe { std::mem::zeroed() };
        let result =
            unsafe { XInputGetBatteryInformation(slot, BATTERY_DEVTYPE_GAMEPAD, &mut info) };
        if result != 0 {
            return None;
        }
        Some(info.BatteryLevel)
    }

    #[cfg(not(windows))]
    pub fn battery_level(&self, _slot: u32) -> Option<u8> {
        None
    }
}

impl Default for XInputHandle {
    fn default() -> Self {
        Self::new()
    }
}
