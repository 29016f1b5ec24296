//! Raw input event source abstraction
//!
//! The monitor consumes low-level input as (kind, code, value) triples in
//! the canonical evdev-style encoding: `BTN_*` key codes with value 1/0,
//! `ABS_X`/`ABS_Y`/`ABS_RX`/`ABS_RY` sticks in 0..=65535 centered at 32768,
//! `ABS_Z`/`ABS_RZ` triggers in 0..=255, `ABS_HAT0X`/`ABS_HAT0Y` d-pad in
//! -1/0/1. Whatever backend produces the events is hidden behind
//! [`RawEventSource`] so the decode pipeline stays testable without
//! hardware.

use thiserror::Error;

/// Category of a raw input event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    /// Button transition ("Key" events).
    Key,
    /// Absolute axis sample (sticks, triggers, d-pad).
    Absolute,
    /// Synchronization marker, carries no payload.
    Sync,
    /// Anything else; ignored by the decoder.
    Other,
}

/// One hardware event in canonical raw encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawInputEvent {
    pub kind: EventKind,
    pub code: String,
    pub value: i32,
}

impl RawInputEvent {
    pub fn key(code: &str, value: i32) -> Self {
        Self {
            kind: EventKind::Key,
            code: code.to_string(),
            value,
        }
    }

    pub fn absolute(code: &str, value: i32) -> Self {
        Self {
            kind: EventKind::Absolute,
            code: code.to_string(),
            value,
        }
    }
}

/// Errors terminating a read loop.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to initialize event source: {0}")]
    Init(String),

    #[error("Controller unplugged")]
    Disconnected,

    #[error("Input read failed: {0}")]
    Io(String),
}

/// Blocking supplier of raw input batches for one controller.
///
/// `next_events` may wait briefly for hardware and may return an empty
/// batch; callers loop on it. A disconnect or read failure is terminal for
/// the session.
pub trait RawEventSource: Send {
    /// Number of raw-input-capable gamepads currently attached.
    fn connected_gamepads(&self) -> usize;

    /// Next batch of events, possibly empty.
    fn next_events(&mut self) -> Result<Vec<RawInputEvent>, SourceError>;
}
