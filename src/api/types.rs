//! Per-tick report types shared by the refresh loop and its sinks

use crate::core::{EstimatedPosition, WeightedAnchor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Outcome of one refresh tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickStatus {
    /// A position was estimated
    Located,
    /// The scans returned no access points
    NoSignal,
    /// Access points were seen but none contributed to an estimate
    NoMatch,
    /// Every scan pass in the cycle failed
    ScanFailed,
}

impl TickStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TickStatus::Located => "located",
            TickStatus::NoSignal => "no_signal",
            TickStatus::NoMatch => "no_match",
            TickStatus::ScanFailed => "scan_failed",
        }
    }
}

impl fmt::Display for TickStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a presentation layer needs to render one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Tick counter, starting at 1
    pub sequence: u64,
    /// Wall-clock time of the report (milliseconds since epoch)
    pub timestamp_ms: u64,
    pub status: TickStatus,
    /// Estimated device position in image pixels
    pub position: Option<EstimatedPosition>,
    /// Anchor with the strongest raw RSSI
    pub strongest: Option<WeightedAnchor>,
    /// Every anchor that contributed, in survey order
    pub anchors: Vec<WeightedAnchor>,
    /// Distinct access points observed across the cycle's passes
    pub samples_observed: usize,
    /// Scan passes that failed during the cycle
    pub failed_passes: usize,
}

impl TickReport {
    pub fn is_located(&self) -> bool {
        self.status == TickStatus::Located
    }
}

/// Current wall-clock time in milliseconds, 0 if the clock is before the epoch
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&TickStatus::ScanFailed).unwrap();
        assert_eq!(json, "\"scan_failed\"");
        assert_eq!(TickStatus::NoMatch.to_string(), "no_match");
    }

    #[test]
    fn test_report_json_shape() {
        let report = TickReport {
            sequence: 4,
            timestamp_ms: 1_700_000_000_000,
            status: TickStatus::Located,
            position: Some(EstimatedPosition { x: 12.5, y: 40.0 }),
            strongest: None,
            anchors: Vec::new(),
            samples_observed: 3,
            failed_passes: 0,
        };

        let value: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["status"], "located");
        assert_eq!(value["position"]["x"], 12.5);
        assert!(value["strongest"].is_null());
        assert!(report.is_located());
    }

    #[test]
    fn test_now_ms_is_after_2020() {
        assert!(now_ms() > 1_577_836_800_000);
    }
}
