//! Scanner that replays recorded passes from a JSON file

use crate::core::{ApId, RawSample};
use crate::hardware::{ScanError, ScanResult, WifiScanner};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One recorded observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedSample {
    pub bssid: String,
    pub rssi: i32,
    #[serde(default)]
    pub ssid: Option<String>,
}

impl From<&RecordedSample> for RawSample {
    fn from(recorded: &RecordedSample) -> Self {
        RawSample {
            ap: ApId::new(&recorded.bssid),
            rssi: recorded.rssi,
            ssid: recorded.ssid.clone(),
        }
    }
}

/// Replays recorded passes in order, wrapping around at the end
pub struct ReplayScanner {
    passes: Vec<Vec<RecordedSample>>,
    cursor: usize,
}

impl ReplayScanner {
    pub fn new(passes: Vec<Vec<RecordedSample>>) -> Self {
        Self { passes, cursor: 0 }
    }

    /// Load `[[{"bssid", "rssi", "ssid"}, ...], ...]` from disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> ScanResult<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = fs::read_to_string(&path).map_err(|e| ScanError::ReplayError {
            path: path_str.clone(),
            message: e.to_string(),
        })?;

        let passes: Vec<Vec<RecordedSample>> =
            serde_json::from_str(&content).map_err(|e| ScanError::ReplayError {
                path: path_str,
                message: e.to_string(),
            })?;

        Ok(Self::new(passes))
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }
}

impl WifiScanner for ReplayScanner {
    fn scan_once(&mut self) -> ScanResult<Vec<RawSample>> {
        if self.passes.is_empty() {
            return Ok(Vec::new());
        }

        let pass = self.passes[self.cursor].iter().map(RawSample::from).collect();
        self.cursor = (self.cursor + 1) % self.passes.len();
        Ok(pass)
    }

    fn name(&self) -> &str {
        "replay"
    }
}
