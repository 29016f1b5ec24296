//! gilrs-backed raw event source
//!
//! Binds to a single gamepad and translates gilrs events into the
//! canonical raw triples the decoder expects. gilrs hands out
//! pre-normalized floats, so sticks are restored to the 0..=65535 range
//! centered at 32768, triggers to 0..=255 and the d-pad to -1/0/1 before
//! they leave this module.
//!
//! gilrs reports stick Y with up positive; the canonical encoding follows
//! the evdev convention (up negative), hence the sign flip on Y axes.

use std::thread;
use std::time::Duration;

use gilrs::{Axis, Button, Event, EventType, GamepadId, Gilrs};
use tracing::{debug, info, warn};

use crate::monitor::source::{RawEventSource, RawInputEvent, SourceError};

/// How long to idle when no events are pending, keeping the read loop
/// responsive to shutdown without spinning.
const IDLE_WAIT: Duration = Duration::from_millis(2);

pub struct GilrsEventSource {
    gilrs: Gilrs,
    target: Option<GamepadId>,
}

impl GilrsEventSource {
    /// Open the gilrs context and bind to the gamepad at `index`.
    ///
    /// With fewer gamepads than `index` the first one is used; with none
    /// at all the session fails its start-up check before reading.
    pub fn new(index: usize) -> Result<Self, SourceError> {
        info!("Initializing gilrs event source");
        let gilrs = match Gilrs::new() {
            Ok(g) => g,
            Err(e) => {
                warn!("Failed to initialize gilrs: {}", e);
                return Err(SourceError::Init(e.to_string()));
            }
        };

        let gamepads: Vec<(GamepadId, String)> = gilrs
            .gamepads()
            .map(|(id, pad)| (id, pad.name().to_string()))
            .collect();
        for (id, name) in &gamepads {
            info!("Available gamepad {}: {}", id, name);
        }

        let target = gamepads
            .get(index)
            .or_else(|| gamepads.first())
            .map(|(id, name)| {
                info!("Monitoring gamepad {} ({})", name, id);
                *id
            });

        Ok(Self { gilrs, target })
    }
}

impl RawEventSource for GilrsEventSource {
    fn connected_gamepads(&self) -> usize {
        self.gilrs.gamepads().count()
    }

    fn next_events(&mut self) -> Result<Vec<RawInputEvent>, SourceError> {
        let mut batch = Vec::new();

        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            if let Some(target) = self.target {
                if id != target {
                    debug!("Skipping event from non-monitored gamepad {}", id);
                    continue;
                }
            }

            if matches!(event, EventType::Disconnected) {
                warn!("Monitored gamepad {} disconnected", id);
                return Err(SourceError::Disconnected);
            }

            if let Some(raw) = convert_event(event) {
                batch.push(raw);
            }
        }

        if batch.is_empty() {
            thread::sleep(IDLE_WAIT);
        }
        Ok(batch)
    }
}

/// Translate one gilrs event into the canonical raw encoding.
fn convert_event(event: EventType) -> Option<RawInputEvent> {
    match event {
        EventType::ButtonPressed(button, _) => {
            button_code(button).map(|code| RawInputEvent::key(code, 1))
        }
        EventType::ButtonReleased(button, _) => {
            button_code(button).map(|code| RawInputEvent::key(code, 0))
        }
        EventType::ButtonChanged(button, value, _) => button_travel(button, value),
        EventType::AxisChanged(axis, value, _) => axis_sample(axis, value),
        EventType::ButtonRepeated(..) => None,
        EventType::Connected => {
            info!("Gamepad connected during session");
            None
        }
        _ => None,
    }
}

fn button_code(button: Button) -> Option<&'static str> {
    match button {
        Button::South => Some("BTN_SOUTH"),
        Button::East => Some("BTN_EAST"),
        Button::West => Some("BTN_WEST"),
        Button::North => Some("BTN_NORTH"),
        Button::LeftTrigger => Some("BTN_TL"),
        Button::RightTrigger => Some("BTN_TR"),
        Button::Select => Some("BTN_SELECT"),
        Button::Start => Some("BTN_START"),
        Button::Mode => Some("BTN_MODE"),
        Button::LeftThumb => Some("BTN_THUMBL"),
        Button::RightThumb => Some("BTN_THUMBR"),
        // Analog triggers and d-pad directions travel as value changes.
        _ => None,
    }
}

/// Analog travel reported through gilrs button-changed events.
fn button_travel(button: Button, value: f32) -> Option<RawInputEvent> {
    match button {
        Button::LeftTrigger2 => Some(RawInputEvent::absolute("ABS_Z", trigger_to_raw(value))),
        Button::RightTrigger2 => Some(RawInputEvent::absolute("ABS_RZ", trigger_to_raw(value))),
        // D-pads surface as buttons on some backends.
        Button::DPadUp => Some(RawInputEvent::absolute("ABS_HAT0Y", -hat_to_raw(value))),
        Button::DPadDown => Some(RawInputEvent::absolute("ABS_HAT0Y", hat_to_raw(value))),
        Button::DPadLeft => Some(RawInputEvent::absolute("ABS_HAT0X", -hat_to_raw(value))),
        Button::DPadRight => Some(RawInputEvent::absolute("ABS_HAT0X", hat_to_raw(value))),
        _ => None,
    }
}

fn axis_sample(axis: Axis, value: f32) -> Option<RawInputEvent> {
    match axis {
        Axis::LeftStickX => Some(RawInputEvent::absolute("ABS_X", stick_to_raw(value))),
        Axis::LeftStickY => Some(RawInputEvent::absolute("ABS_Y", stick_to_raw(-value))),
        Axis::RightStickX => Some(RawInputEvent::absolute("ABS_RX", stick_to_raw(value))),
        Axis::RightStickY => Some(RawInputEvent::absolute("ABS_RY", stick_to_raw(-value))),
        Axis::LeftZ => Some(RawInputEvent::absolute("ABS_Z", trigger_to_raw(value))),
        Axis::RightZ => Some(RawInputEvent::absolute("ABS_RZ", trigger_to_raw(value))),
        Axis::DPadX => Some(RawInputEvent::absolute("ABS_HAT0X", hat_to_raw(value))),
        Axis::DPadY => Some(RawInputEvent::absolute("ABS_HAT0Y", -hat_to_raw(value))),
        _ => None,
    }
}

fn stick_to_raw(value: f32) -> i32 {
    let scaled = (value.clamp(-1.0, 1.0) * 32768.0).round() as i32 + 32768;
    scaled.clamp(0, 65535)
}

fn trigger_to_raw(value: f32) -> i32 {
    (value.clamp(0.0, 1.0) * 255.0).round() as i32
}

fn hat_to_raw(value: f32) -> i32 {
    value.clamp(-1.0, 1.0).round() as i32
}
