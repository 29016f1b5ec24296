//! Input monitoring subsystem
//!
//! Decodes raw controller input into human-readable events and a
//! continuous state snapshot:
//!
//! 1. [`source`] - raw (kind, code, value) event supplier abstraction
//! 2. [`gilrs_source`] - production backend bound to one gamepad
//! 3. [`decode`] - code tables, normalization and [`decode::InputState`]
//! 4. [`input_monitor`] - session lifecycle, read loop and 20 Hz ticker
//!
//! # Architecture
//!
//! ```text
//! Gamepad ──► RawEventSource ──► read loop ──► SessionEvent feed
//!                                    │
//!                                InputState ──► 20 Hz snapshot feed
//! ```
//!
//! A session binds to one controller for its whole lifetime and ends
//! terminally on disconnect; it is the caller's job to open a new one.

pub mod decode;
pub mod gilrs_source;
pub mod input_monitor;
pub mod source;

#[cfg(test)]
mod tests_monitor;

pub use decode::{axis_name, button_name, normalize_axis, InputState, STICK_DEADZONE};
pub use gilrs_source::GilrsEventSource;
pub use input_monitor::{MonitorError, MonitorHandle, MonitorSettings, SessionEvent};
pub use source::{EventKind, RawEventSource, RawInputEvent, SourceError};
