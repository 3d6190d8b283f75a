//! Scanner interface trait and configuration

use crate::hardware::error::ScanResult;
use crate::core::RawSample;
use serde::{Deserialize, Serialize};

/// Source of WiFi scan passes
///
/// One call performs one scan pass and returns every access point the radio
/// saw. An empty vector is a valid result. Errors are recoverable per tick.
pub trait WifiScanner {
    /// Perform one scan pass
    fn scan_once(&mut self) -> ScanResult<Vec<RawSample>>;

    /// Short backend name for logs
    fn name(&self) -> &str;
}

/// Scan backend types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ScannerBackend {
    /// `iw dev <iface> scan` on Linux
    Iw,
    /// Recorded passes from a JSON file
    Replay,
    /// Scripted passes for testing and demos
    Mock,
}

/// Scanner configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerSettings {
    pub backend: ScannerBackend,
    /// Wireless interface for the `iw` backend
    pub interface: String,
    /// Read cached results (`scan dump`) instead of triggering a scan
    pub use_cached: bool,
    /// Recorded scan file for the replay backend
    pub replay_path: Option<String>,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self {
            backend: ScannerBackend::Iw,
            interface: "wlan0".to_string(),
            use_cached: false,
            replay_path: None,
        }
    }
}
