//! Application configuration
//!
//! Loaded once at startup from `<config_dir>/padwatch/config.toml`. A
//! missing file is written out with defaults so users have something to
//! edit; a malformed file logs a warning and falls back to defaults rather
//! than preventing startup.
//!
//! The HID classification tables live here as data. The vendor list is a
//! subset of known wireless-receiver vendors and is expected to be extended
//! through the config file, not through code changes.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
#[serde(default)]
pub struct Config {
    pub poller: PollerConfig,
    pub monitor: MonitorConfig,
    pub detection: DetectionConfig,
}

/// Settings for the controller poll loop.
#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(default)]
pub struct PollerConfig {
    /// Pause between poll cycles in milliseconds. The effective period is
    /// this plus however long the scan itself takes.
    pub poll_interval_ms: u64,
    /// Hard per-device timeout for a battery lookup.
    pub battery_timeout_ms: u64,
    /// Maximum battery lookups in flight at once.
    pub battery_concurrency: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
            battery_timeout_ms: 1000,
            battery_concurrency: 4,
        }
    }
}

/// Settings for input monitoring sessions.
#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(default)]
pub struct MonitorConfig {
    /// Interval between full input-state snapshots (50 ms = 20 Hz).
    pub state_interval_ms: u64,
    /// Which connected gamepad a session binds to.
    pub controller_index: usize,
    /// Open a monitoring session at startup and log its event feed.
    /// Stands in for the events window when running headless.
    pub autostart_session: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            state_interval_ms: 50,
            controller_index: 0,
            autostart_session: false,
        }
    }
}

/// Keyword and vendor tables for the HID classification heuristic.
///
/// Matching is case-insensitive substring on the product name. The tables
/// are a best-effort filter; false negatives and positives are expected
/// and acceptable.
#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(default)]
pub struct DetectionConfig {
    /// A device whose name contains any of these is never a controller.
    pub excluded_keywords: Vec<String>,
    /// Name fragments that mark a device as gaming-related.
    pub gaming_keywords: Vec<String>,
    /// Vendor ids known to ship wireless gamepad receivers (subset).
    pub wireless_vendors: Vec<u16>,
    /// Vendors whose devices count as controllers even without a gaming
    /// keyword in the name.
    pub trusted_vendors: Vec<u16>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            excluded_keywords: [
                "keyboard",
                "mouse",
                "trackpad",
                "touchpad",
                "sensor",
                "headset",
                "microphone",
                "webcam",
                "generic",
                "composite",
                "receiver control",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            gaming_keywords: [
                "gamepad",
                "joystick",
                "joypad",
                "game",
                "xbox",
                "playstation",
                "dualshock",
                "dualsense",
                "pro controller",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            wireless_vendors: vec![
                0x045E, // Microsoft
                0x054C, // Sony
                0x057E, // Nintendo
                0x046D, // Logitech
                0x0E6F, // PDP
                0x0F0D, // Hori
                0x24C6, // PowerA
                0x2DC8, // 8BitDo
                0x28DE, // Valve
                0x0738, // Mad Catz
            ],
            trusted_vendors: vec![0x045E, 0x054C, 0x057E],
        }
    }
}

impl Config {
    /// Load the configuration, creating a default file on first run.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            warn!("No platform config directory available, using defaults");
            return Self::default();
        };
        Self::load_from(path)
    }

    /// Load from an explicit path; any failure degrades to defaults.
    pub fn load_from(path: PathBuf) -> Self {
        if !path.exists() {
            info!("No config file at {}, writing defaults", path.display());
            let config = Self::default();
            config.write_to(&path);
            return config;
        }

        match fs::read_to_string(&path) {
            Ok(raw) => match toml::from_str(&raw) {
                Ok(config) => {
                    info!("Loaded configuration from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read {}: {}, using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    fn write_to(&self, path: &PathBuf) {
        let Ok(serialized) = toml::to_string_pretty(self) else {
            warn!("Failed to serialize default configuration");
            return;
        };
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!("Failed to create {}: {}", parent.display(), e);
                return;
            }
        }
        match fs::write(path, serialized) {
            Ok(()) => debug!("Wrote default configuration to {}", path.display()),
            Err(e) => warn!("Failed to write {}: {}", path.display(), e),
        }
    }

    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("padwatch").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_timings() {
        let config = Config::default();
        assert_eq!(config.poller.poll_interval_ms, 2000);
        assert_eq!(config.poller.battery_timeout_ms, 1000);
        assert_eq!(config.poller.battery_concurrency, 4);
        assert_eq!(config.monitor.state_interval_ms, 50);
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            [poller]
            poll_interval_ms = 500
            "#,
        )
        .expect("partial config should parse");
        assert_eq!(config.poller.poll_interval_ms, 500);
        assert_eq!(config.poller.battery_concurrency, 4);
        assert!(!config.detection.gaming_keywords.is_empty());
    }

    #[test]
    fn missing_file_is_written_out_with_defaults() {
        let dir = std::env::temp_dir().join(format!("padwatch-test-{}", std::process::id()));
        let path = dir.join("config.toml");
        let _ = fs::remove_file(&path);

        let config = Config::load_from(path.clone());
        assert_eq!(config.poller.poll_interval_ms, 2000);
        assert!(path.exists(), "defaults should have been written out");

        let reloaded = Config::load_from(path);
        assert_eq!(reloaded.poller.battery_timeout_ms, 1000);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = std::env::temp_dir().join(format!("padwatch-test-bad-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join("config.toml");
        fs::write(&path, "not valid toml [").expect("write malformed file");

        let config = Config::load_from(path);
        assert_eq!(config.poller.battery_concurrency, 4);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn detection_defaults_round_trip_through_toml() {
        let config = Config::default();
        let raw = toml::to_string_pretty(&config).expect("serialize");
        let back: Config = toml::from_str(&raw).expect("parse");
        assert_eq!(
            back.detection.wireless_vendors,
            config.detection.wireless_vendors
        );
        assert_eq!(
            back.detection.trusted_vendors,
            config.detection.trusted_vendors
        );
    }
}
