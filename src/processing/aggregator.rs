//! Multi-pass scan aggregation
//!
//! RSSI from a stationary device wanders by several dB between consecutive
//! scans. Each refresh cycle runs several passes and reduces every access
//! point's readings to their median.

use crate::core::{AggregatedSample, ApId, RawSample, DEFAULT_PASSES_PER_CYCLE, NO_READING_RSSI};
use crate::hardware::{ScanError, WifiScanner};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Result of collecting one cycle's worth of scan passes
#[derive(Debug, Clone, PartialEq)]
pub struct ScanCollection {
    pub samples: Vec<AggregatedSample>,
    /// Passes that returned an error and were counted as empty
    pub failed_passes: usize,
    pub passes: usize,
    pub last_error: Option<ScanError>,
}

impl ScanCollection {
    /// Every pass failed
    pub fn all_failed(&self) -> bool {
        self.passes > 0 && self.failed_passes == self.passes
    }
}

/// Groups repeated scan passes by access point and takes the median RSSI
#[derive(Debug, Clone, PartialEq)]
pub struct ScanAggregator {
    passes: usize,
    ssid_filter: Option<String>,
}

impl ScanAggregator {
    /// Aggregator running `passes` scan passes per cycle (at least one)
    pub fn new(passes: usize) -> Self {
        Self {
            passes: passes.max(1),
            ssid_filter: None,
        }
    }

    /// Only keep access points broadcasting this network name
    pub fn with_ssid_filter(mut self, ssid: Option<String>) -> Self {
        self.ssid_filter = ssid
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        self
    }

    pub fn passes(&self) -> usize {
        self.passes
    }

    pub fn ssid_filter(&self) -> Option<&str> {
        self.ssid_filter.as_deref()
    }

    /// Whether a sample passes the SSID filter
    pub fn accepts(&self, sample: &RawSample) -> bool {
        match (&self.ssid_filter, &sample.ssid) {
            (None, _) => true,
            (Some(wanted), Some(ssid)) => ssid.trim().to_lowercase() == *wanted,
            (Some(_), None) => false,
        }
    }

    /// Run the configured number of passes against a scanner and aggregate them
    ///
    /// A failed pass is logged and counted as empty; it never aborts the cycle.
    pub fn collect(&self, scanner: &mut dyn WifiScanner) -> ScanCollection {
        let mut passes: Vec<Vec<RawSample>> = Vec::with_capacity(self.passes);
        let mut failed_passes = 0;
        let mut last_error = None;

        for pass in 0..self.passes {
            match scanner.scan_once() {
                Ok(samples) => {
                    debug!(scanner = scanner.name(), pass, observed = samples.len(), "scan pass");
                    passes.push(samples.into_iter().filter(|s| self.accepts(s)).collect());
                }
                Err(e) => {
                    warn!(scanner = scanner.name(), pass, error = %e, recoverable = e.is_recoverable(), "scan pass failed, treating as empty");
                    failed_passes += 1;
                    last_error = Some(e);
                }
            }
        }

        ScanCollection {
            samples: Self::aggregate(&passes),
            failed_passes,
            passes: self.passes,
            last_error,
        }
    }

    /// Reduce raw passes to one median reading per access point
    ///
    /// Output follows first-seen order. Empty input gives an empty result.
    /// The 0 dBm no-reading sentinel never enters the median, so an access
    /// point reported only with it is not emitted.
    pub fn aggregate(passes: &[Vec<RawSample>]) -> Vec<AggregatedSample> {
        let mut order: Vec<ApId> = Vec::new();
        let mut readings: HashMap<ApId, Vec<i32>> = HashMap::new();

        for sample in passes.iter().flatten() {
            if sample.rssi == NO_READING_RSSI {
                debug!(ap = %sample.ap, "skipping no-reading sample");
                continue;
            }
            readings
                .entry(sample.ap.clone())
                .or_insert_with(|| {
                    order.push(sample.ap.clone());
                    Vec::new()
                })
                .push(sample.rssi);
        }

        order
            .into_iter()
            .filter_map(|ap| {
                let values = readings.remove(&ap)?;
                let rssi = median(values)?;
                Some(AggregatedSample { ap, rssi })
            })
            .collect()
    }
}

impl Default for ScanAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_PASSES_PER_CYCLE)
    }
}

/// Integer median; even counts average the middle pair, truncating toward zero
pub fn median(mut values: Vec<i32>) -> Option<i32> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();

    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        let sum = values[mid - 1] as i64 + values[mid] as i64;
        Some((sum / 2) as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::MockScanner;

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(vec![-60, -50, -70]), Some(-60));
        assert_eq!(median(vec![-50, -60]), Some(-55));
        assert_eq!(median(vec![-50, -51]), Some(-50));
        assert_eq!(median(vec![-42]), Some(-42));
        assert_eq!(median(vec![-80, -40, -45, -90]), Some(-62));
        assert_eq!(median(Vec::new()), None);
    }

    #[test]
    fn test_aggregate_groups_by_normalized_identifier() {
        let passes = vec![
            vec![RawSample::new("AA:BB:CC", -50), RawSample::new("11:22:33", -80)],
            vec![RawSample::new("aa-bb-cc", -70)],
            vec![RawSample::new("aabbcc", -60)],
        ];

        let aggregated = ScanAggregator::aggregate(&passes);
        assert_eq!(aggregated.len(), 2);
        assert_eq!(aggregated[0], AggregatedSample { ap: ApId::new("aabbcc"), rssi: -60 });
        // Seen in one pass only, still emitted
        assert_eq!(aggregated[1], AggregatedSample { ap: ApId::new("112233"), rssi: -80 });
    }

    #[test]
    fn test_aggregate_rejects_outlier_pass() {
        let passes = vec![
            vec![RawSample::new("ap", -55)],
            vec![RawSample::new("ap", -92)],
            vec![RawSample::new("ap", -57)],
        ];
        assert_eq!(ScanAggregator::aggregate(&passes)[0].rssi, -57);
    }

    #[test]
    fn test_aggregate_skips_no_reading_sentinel() {
        let passes = vec![
            vec![RawSample::new("near", -50), RawSample::new("far", -80), RawSample::new("ghost", 0)],
            vec![RawSample::new("near", -50), RawSample::new("far", 0), RawSample::new("ghost", 0)],
        ];

        let aggregated = ScanAggregator::aggregate(&passes);
        assert_eq!(
            aggregated,
            vec![
                AggregatedSample { ap: ApId::new("near"), rssi: -50 },
                AggregatedSample { ap: ApId::new("far"), rssi: -80 },
            ]
        );
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(ScanAggregator::aggregate(&[]).is_empty());
        assert!(ScanAggregator::aggregate(&[Vec::new(), Vec::new()]).is_empty());
    }

    #[test]
    fn test_ssid_filter() {
        let aggregator = ScanAggregator::new(1).with_ssid_filter(Some(" Eduroam ".to_string()));
        assert!(aggregator.accepts(&RawSample::new("ap", -50).with_ssid("eduroam")));
        assert!(!aggregator.accepts(&RawSample::new("ap", -50).with_ssid("GuestWifi")));
        assert!(!aggregator.accepts(&RawSample::new("ap", -50)));

        let aggregator = ScanAggregator::new(1).with_ssid_filter(Some("  ".to_string()));
        assert_eq!(aggregator.ssid_filter(), None);
        assert!(aggregator.accepts(&RawSample::new("ap", -50)));
    }

    #[test]
    fn test_collect_runs_configured_passes() {
        let mut scanner = MockScanner::new();
        scanner.push_readings(&[("ap1", -50), ("ap2", -70)]);
        scanner.push_readings(&[("ap1", -54)]);
        scanner.push_readings(&[("ap1", -52), ("ap2", -74)]);

        let collection = ScanAggregator::new(3).collect(&mut scanner);
        assert_eq!(scanner.scans_performed(), 3);
        assert_eq!(collection.failed_passes, 0);
        assert_eq!(collection.samples[0].rssi, -52);
        assert_eq!(collection.samples[1].rssi, -72);
    }

    #[test]
    fn test_collect_treats_failures_as_empty_passes() {
        let mut scanner = MockScanner::new();
        scanner.disconnect();

        let collection = ScanAggregator::new(2).collect(&mut scanner);
        assert!(collection.samples.is_empty());
        assert_eq!(collection.failed_passes, 2);
        assert!(collection.all_failed());
        assert!(collection.last_error.is_some());
    }

    #[test]
    fn test_collect_applies_ssid_filter() {
        let mut scanner = MockScanner::new();
        scanner.push_pass(vec![
            RawSample::new("ap1", -50).with_ssid("eduroam"),
            RawSample::new("ap2", -40).with_ssid("Guest"),
        ]);

        let collection = ScanAggregator::new(1)
            .with_ssid_filter(Some("eduroam".to_string()))
            .collect(&mut scanner);
        assert_eq!(collection.samples.len(), 1);
        assert_eq!(collection.samples[0].ap, ApId::new("ap1"));
    }

    #[test]
    fn test_zero_passes_clamped_to_one() {
        assert_eq!(ScanAggregator::new(0).passes(), 1);
    }
}
