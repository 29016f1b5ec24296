//! Controller polling subsystem
//!
//! Owns the scan → compare → publish cycle that keeps subscribers fed
//! with the current controller list:
//!
//! ```text
//! Enumerator ──► DevicePoller ──► Vec<Controller> updates
//! Battery    ──►      │          (only when something changed)
//! ```
//!
//! Battery lookups run concurrently per cycle, bounded and individually
//! timed out, so one slow device cannot stall detection of the others.

pub mod device_poller;

#[cfg(test)]
mod tests_poller;

pub use device_poller::{DevicePoller, PollerError, PollerHandle, PollerSettings, ScanBatch};
