//! Raw event decoding and input state tracking
//!
//! Turns canonical (kind, code, value) triples into human-readable event
//! descriptions and keeps the continuous [`InputState`] for a session.
//! Normalization contract:
//!
//! - triggers (`ABS_Z`, `ABS_RZ`): raw 0..=255 -> `[0.0, 1.0]`
//! - sticks (`ABS_X`, `ABS_Y`, `ABS_RX`, `ABS_RY`): raw 0..=65535 centered
//!   at 32768 -> `[-1.0, 1.0]`, with magnitudes below 0.1 clamped to
//!   exactly 0.0
//! - d-pad (`ABS_HAT0X`, `ABS_HAT0Y`): signed integer passed through as
//!   float, no deadzone
//!
//! Unknown button or axis codes keep their raw code as the display name;
//! nothing is dropped as malformed.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::monitor::source::{EventKind, RawInputEvent};

/// Stick magnitude below which a centered sample reads as exactly zero.
pub const STICK_DEADZONE: f32 = 0.1;

/// Axis samples quieter than this are tracked but not announced.
/// Triggers are exempt and always announce.
const EVENT_THRESHOLD: f32 = 0.1;

const TRIGGER_AXES: [&str; 2] = ["ABS_Z", "ABS_RZ"];
const STICK_AXES: [&str; 4] = ["ABS_X", "ABS_Y", "ABS_RX", "ABS_RY"];
const HAT_AXES: [&str; 2] = ["ABS_HAT0X", "ABS_HAT0Y"];

/// Human-readable button name for a key code (Xbox-style layout).
///
/// Unknown codes are their own name.
pub fn button_name(code: &str) -> &str {
    match code {
        "BTN_SOUTH" => "A",
        "BTN_EAST" => "B",
        "BTN_WEST" => "X",
        "BTN_NORTH" => "Y",
        "BTN_TL" => "LB",
        "BTN_TR" => "RB",
        "BTN_SELECT" => "Back",
        "BTN_START" => "Start",
        "BTN_MODE" => "Xbox",
        "BTN_THUMBL" => "L3",
        "BTN_THUMBR" => "R3",
        other => other,
    }
}

/// Human-readable axis name for an absolute code.
pub fn axis_name(code: &str) -> &str {
    match code {
        "ABS_X" => "Left Stick X",
        "ABS_Y" => "Left Stick Y",
        "ABS_RX" => "Right Stick X",
        "ABS_RY" => "Right Stick Y",
        "ABS_Z" => "Left Trigger",
        "ABS_RZ" => "Right Trigger",
        "ABS_HAT0X" => "D-pad X",
        "ABS_HAT0Y" => "D-pad Y",
        other => other,
    }
}

pub fn is_trigger(code: &str) -> bool {
    TRIGGER_AXES.contains(&code)
}

/// Normalize a raw axis sample according to its code.
pub fn normalize_axis(code: &str, raw: i32) -> f32 {
    if TRIGGER_AXES.contains(&code) {
        return raw as f32 / 255.0;
    }
    if STICK_AXES.contains(&code) {
        let centered = (raw - 32768) as f32 / 32768.0;
        if centered.abs() < STICK_DEADZONE {
            return 0.0;
        }
        return centered;
    }
    if HAT_AXES.contains(&code) {
        return raw as f32;
    }
    raw as f32
}

/// Continuous input state for one monitoring session.
///
/// Owned and mutated exclusively by the session's read loop; everything
/// published outward is a clone taken after an event batch was applied.
#[derive(Clone, Debug, Default, Serialize)]
pub struct InputState {
    /// Names of currently held buttons, sorted for stable display.
    pub buttons: BTreeSet<String>,
    pub left_stick: (f32, f32),
    pub right_stick: (f32, f32),
    pub left_trigger: f32,
    pub right_trigger: f32,
    /// Latest normalized sample per raw axis code.
    axes: HashMap<String, f32>,
}

impl InputState {
    /// Apply one raw event, returning the description to announce, if any.
    pub fn apply(&mut self, event: &RawInputEvent) -> Option<String> {
        match event.kind {
            EventKind::Key => self.apply_button(event),
            EventKind::Absolute => self.apply_axis(event),
            // Sync markers delimit hardware reports and carry nothing.
            EventKind::Sync | EventKind::Other => None,
        }
    }

    fn apply_button(&mut self, event: &RawInputEvent) -> Option<String> {
        let name = button_name(&event.code);
        match event.value {
            1 => {
                self.buttons.insert(name.to_string());
                Some(format!("Button {} pressed", name))
            }
            0 => {
                self.buttons.remove(name);
                Some(format!("Button {} released", name))
            }
            // Autorepeat and exotic values change nothing.
            _ => None,
        }
    }

    fn apply_axis(&mut self, event: &RawInputEvent) -> Option<String> {
        let normalized = normalize_axis(&event.code, event.value);
        self.axes.insert(event.code.clone(), normalized);
        self.refresh_analog();

        if normalized.abs() > EVENT_THRESHOLD || is_trigger(&event.code) {
            Some(format!("{}: {:.2}", axis_name(&event.code), normalized))
        } else {
            None
        }
    }

    /// Pull the stick and trigger slots from the raw axis map.
    fn refresh_analog(&mut self) {
        let axis = |code: &str| self.axes.get(code).copied().unwrap_or(0.0);
        self.left_stick = (axis("ABS_X"), axis("ABS_Y"));
        self.right_stick = (axis("ABS_RX"), axis("ABS_RY"));
        self.left_trigger = axis("ABS_Z");
        self.right_trigger = axis("ABS_RZ");
    }
}
