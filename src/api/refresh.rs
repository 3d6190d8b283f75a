//! Periodic scan, estimate and publish loop
//!
//! Synchronous and single-threaded. The loop blocks only inside the scanner
//! and its interval sleep; a shared stop flag ends it between ticks.

use crate::algorithms::PositionEstimator;
use crate::api::formatting::PositionSink;
use crate::api::types::{now_ms, TickReport, TickStatus};
use crate::core::{ApRegistry, DEFAULT_REFRESH_INTERVAL_MS};
use crate::hardware::WifiScanner;
use crate::processing::ScanAggregator;
use crate::utils::LocatorConfig;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Longest uninterrupted sleep while waiting for the next tick
const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// Owns the scan, estimate and publish pipeline
pub struct RefreshLoop {
    scanner: Box<dyn WifiScanner>,
    aggregator: ScanAggregator,
    estimator: PositionEstimator,
    sink: Box<dyn PositionSink>,
    interval: Duration,
    max_ticks: Option<u64>,
    sequence: u64,
}

impl RefreshLoop {
    pub fn new(
        scanner: Box<dyn WifiScanner>,
        aggregator: ScanAggregator,
        estimator: PositionEstimator,
        sink: Box<dyn PositionSink>,
    ) -> Self {
        Self {
            scanner,
            aggregator,
            estimator,
            sink,
            interval: Duration::from_millis(DEFAULT_REFRESH_INTERVAL_MS),
            max_ticks: None,
            sequence: 0,
        }
    }

    /// Wire the pipeline from a validated configuration
    pub fn from_config(
        config: &LocatorConfig,
        registry: &ApRegistry,
        scanner: Box<dyn WifiScanner>,
        sink: Box<dyn PositionSink>,
    ) -> Self {
        let aggregator = ScanAggregator::new(config.passes)
            .with_ssid_filter(config.ssid_filter.clone());
        let estimator = PositionEstimator::new(registry, config.image, config.signal_model)
            .with_min_weight(config.min_weight);

        Self::new(scanner, aggregator, estimator, sink)
            .with_interval(config.refresh_interval())
            .with_max_ticks(config.max_ticks)
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_ticks(mut self, max_ticks: Option<u64>) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /// Ticks completed so far
    pub fn ticks(&self) -> u64 {
        self.sequence
    }

    /// Run one cycle and publish its report
    pub fn tick(&mut self) -> TickReport {
        self.sequence += 1;

        let collection = self.aggregator.collect(self.scanner.as_mut());
        let estimation = self.estimator.estimate(&collection.samples);

        let status = if collection.all_failed() {
            TickStatus::ScanFailed
        } else if collection.samples.is_empty() {
            TickStatus::NoSignal
        } else if estimation.position.is_none() {
            TickStatus::NoMatch
        } else {
            TickStatus::Located
        };

        match status {
            TickStatus::Located => debug!(
                sequence = self.sequence,
                anchors = estimation.anchors.len(),
                "position updated"
            ),
            TickStatus::NoSignal => info!(sequence = self.sequence, "no access points in range"),
            TickStatus::NoMatch => info!(
                sequence = self.sequence,
                observed = collection.samples.len(),
                matched = estimation.matched,
                "no surveyed access point usable"
            ),
            TickStatus::ScanFailed => warn!(
                sequence = self.sequence,
                error = ?collection.last_error.as_ref().map(|e| e.to_string()),
                "every scan pass failed"
            ),
        }

        let report = TickReport {
            sequence: self.sequence,
            timestamp_ms: now_ms(),
            status,
            position: estimation.position,
            strongest: estimation.strongest,
            anchors: estimation.anchors,
            samples_observed: collection.samples.len(),
            failed_passes: collection.failed_passes,
        };

        if let Err(e) = self.sink.publish(&report) {
            warn!(sequence = self.sequence, error = %e, "failed to publish report");
        }

        report
    }

    /// Tick on the configured interval until `stop` is set or the tick limit is hit
    ///
    /// Returns the number of ticks run by this call.
    pub fn run(&mut self, stop: &AtomicBool) -> u64 {
        let start = self.sequence;
        let dimensions = self.estimator.dimensions();
        info!(
            scanner = self.scanner.name(),
            model = self.estimator.model().name(),
            access_points = self.estimator.survey_len(),
            width = dimensions.width,
            height = dimensions.height,
            interval_ms = self.interval.as_millis() as u64,
            max_ticks = ?self.max_ticks,
            "refresh loop started"
        );

        loop {
            if stop.load(Ordering::Relaxed) || self.limit_reached(start) {
                break;
            }

            let started = Instant::now();
            self.tick();

            if self.limit_reached(start) {
                break;
            }
            self.sleep_until(started + self.interval, stop);
        }

        let ran = self.sequence - start;
        info!(ticks = ran, "refresh loop stopped");
        ran
    }

    fn limit_reached(&self, start: u64) -> bool {
        self.max_ticks
            .map_or(false, |max| self.sequence - start >= max)
    }

    fn sleep_until(&self, deadline: Instant, stop: &AtomicBool) {
        while !stop.load(Ordering::Relaxed) {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep((deadline - now).min(SLEEP_SLICE));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::formatting::{ChannelSink, SinkError, SinkResult};
    use crate::core::{ImageDimensions, SurveyRecord};
    use crate::hardware::MockScanner;
    use crate::processing::SignalModel;
    use std::sync::mpsc::{self, Receiver};
    use std::sync::Arc;

    fn create_test_registry() -> ApRegistry {
        ApRegistry::from_records(vec![
            SurveyRecord { id: "aa:bb:cc:00:00:01".to_string(), x: 0.0, y: 0.0 },
            SurveyRecord { id: "aa:bb:cc:00:00:02".to_string(), x: 1.0, y: 0.0 },
        ])
        .unwrap()
    }

    fn create_test_loop(scanner: MockScanner, passes: usize) -> (RefreshLoop, Receiver<TickReport>) {
        let (tx, rx) = mpsc::channel();
        let estimator = PositionEstimator::new(
            &create_test_registry(),
            ImageDimensions::new(100.0, 100.0),
            SignalModel::linear_shift(),
        );
        let refresh = RefreshLoop::new(
            Box::new(scanner),
            ScanAggregator::new(passes),
            estimator,
            Box::new(ChannelSink::new(tx)),
        )
        .with_interval(Duration::ZERO);
        (refresh, rx)
    }

    struct FailingSink;

    impl PositionSink for FailingSink {
        fn publish(&mut self, _report: &TickReport) -> SinkResult<()> {
            Err(SinkError::Disconnected)
        }
    }

    #[test]
    fn test_tick_locates_and_publishes() {
        let mut scanner = MockScanner::new();
        scanner.push_readings(&[("AA:BB:CC:00:00:01", -50), ("AA:BB:CC:00:00:02", -50)]);
        let (mut refresh, rx) = create_test_loop(scanner, 1);

        let report = refresh.tick();
        assert_eq!(report.status, TickStatus::Located);
        assert_eq!(report.sequence, 1);
        let position = report.position.unwrap();
        assert!((position.x - 50.0).abs() < 1e-9);
        assert_eq!(report.anchors.len(), 2);

        assert_eq!(rx.recv().unwrap(), report);
    }

    #[test]
    fn test_tick_status_for_empty_states() {
        let mut scanner = MockScanner::new();
        scanner.push_pass(Vec::new());
        scanner.push_readings(&[("ff:ff:ff:ff:ff:ff", -40)]);
        let (mut refresh, _rx) = create_test_loop(scanner, 1);

        assert_eq!(refresh.tick().status, TickStatus::NoSignal);

        let report = refresh.tick();
        assert_eq!(report.status, TickStatus::NoMatch);
        assert_eq!(report.samples_observed, 1);
        assert!(report.position.is_none());
    }

    #[test]
    fn test_no_reading_pass_does_not_pull_estimate() {
        let mut scanner = MockScanner::new();
        scanner.push_readings(&[("aabbcc000001", -50), ("aabbcc000002", -80)]);
        scanner.push_readings(&[("aabbcc000001", -50), ("aabbcc000002", 0)]);
        let (mut refresh, _rx) = create_test_loop(scanner, 2);

        let report = refresh.tick();
        assert_eq!(report.status, TickStatus::Located);
        assert_eq!(report.strongest.unwrap().label, "aa:bb:cc:00:00:01");
        assert_eq!(report.anchors[1].rssi, -80);
        assert!(report.position.unwrap().x < 50.0);
    }

    #[test]
    fn test_tick_reports_scan_failure() {
        let mut scanner = MockScanner::new();
        scanner.disconnect();
        let (mut refresh, _rx) = create_test_loop(scanner, 3);

        let report = refresh.tick();
        assert_eq!(report.status, TickStatus::ScanFailed);
        assert_eq!(report.failed_passes, 3);
    }

    #[test]
    fn test_sink_failure_does_not_stop_loop() {
        let mut scanner = MockScanner::new().repeat_last(true);
        scanner.push_readings(&[("aabbcc000001", -60)]);

        let estimator = PositionEstimator::new(
            &create_test_registry(),
            ImageDimensions::default(),
            SignalModel::log_distance(),
        );
        let mut refresh = RefreshLoop::new(
            Box::new(scanner),
            ScanAggregator::new(1),
            estimator,
            Box::new(FailingSink),
        )
        .with_interval(Duration::ZERO)
        .with_max_ticks(Some(3));

        assert_eq!(refresh.run(&AtomicBool::new(false)), 3);
    }

    #[test]
    fn test_run_honors_tick_limit() {
        let mut scanner = MockScanner::new().repeat_last(true);
        scanner.push_readings(&[("aabbcc000002", -45)]);
        let (refresh, rx) = create_test_loop(scanner, 2);
        let mut refresh = refresh.with_max_ticks(Some(4));

        assert_eq!(refresh.run(&AtomicBool::new(false)), 4);
        let sequences: Vec<u64> = rx.try_iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_run_with_stop_already_set() {
        let (mut refresh, rx) = create_test_loop(MockScanner::new(), 1);
        assert_eq!(refresh.run(&AtomicBool::new(true)), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_stop_flag_from_another_thread() {
        let mut scanner = MockScanner::new().repeat_last(true);
        scanner.push_readings(&[("aabbcc000001", -50)]);
        let (refresh, _rx) = create_test_loop(scanner, 1);
        let mut refresh = refresh.with_interval(Duration::from_secs(60));

        let stop = Arc::new(AtomicBool::new(false));
        let stopper = {
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(100));
                stop.store(true, Ordering::Relaxed);
            })
        };

        let started = Instant::now();
        assert_eq!(refresh.run(&stop), 1);
        assert!(started.elapsed() < Duration::from_secs(10));
        stopper.join().unwrap();
    }
}
