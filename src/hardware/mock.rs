//! Mock scanner implementation for testing and development

use crate::core::{ApRegistry, RawSample};
use crate::hardware::{ScanError, ScanResult, WifiScanner};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Mock scanner that replays scripted scan passes
pub struct MockScanner {
    passes: VecDeque<Vec<RawSample>>,
    last_pass: Option<Vec<RawSample>>,
    repeat_last: bool,
    jitter_db: i32,
    simulate_errors: bool,
    error_probability: f32,
    connected: bool,
    scans_performed: u32,
    rng: StdRng,
}

impl MockScanner {
    /// Create a new mock scanner with no scripted passes
    pub fn new() -> Self {
        Self {
            passes: VecDeque::new(),
            last_pass: None,
            repeat_last: false,
            jitter_db: 0,
            simulate_errors: false,
            error_probability: 0.0,
            connected: true,
            scans_performed: 0,
            rng: StdRng::from_entropy(),
        }
    }

    /// Use a fixed seed so jitter and injected errors are reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Keep returning the last scripted pass once the queue is drained
    pub fn repeat_last(mut self, enable: bool) -> Self {
        self.repeat_last = enable;
        self
    }

    /// Add uniform noise of up to `db` dBm to every returned sample
    pub fn with_jitter(mut self, db: i32) -> Self {
        self.jitter_db = db.abs();
        self
    }

    /// Scanner that hears every surveyed access point from a fixed spot
    ///
    /// `device_x` and `device_y` use the survey's normalized coordinates.
    /// Signal falls off linearly with normalized distance, from -35 dBm at the
    /// access point down to -95 dBm, and the pass repeats with 3 dB jitter.
    pub fn surveyed(registry: &ApRegistry, device_x: f64, device_y: f64) -> Self {
        let pass = registry
            .records()
            .iter()
            .map(|record| {
                let distance = (record.x - device_x).hypot(record.y - device_y);
                let rssi = (-35.0 - 60.0 * distance).max(-95.0).round() as i32;
                RawSample::new(record.id.clone(), rssi)
            })
            .collect();

        let mut scanner = Self::new().repeat_last(true).with_jitter(3);
        scanner.push_pass(pass);
        scanner
    }

    /// Queue one scan pass
    pub fn push_pass(&mut self, pass: Vec<RawSample>) {
        self.passes.push_back(pass);
    }

    /// Queue a pass from `(identifier, rssi)` pairs
    pub fn push_readings(&mut self, readings: &[(&str, i32)]) {
        let pass = readings
            .iter()
            .map(|&(id, rssi)| RawSample::new(id, rssi))
            .collect();
        self.push_pass(pass);
    }

    /// Enable error simulation with given probability (0.0 to 1.0)
    pub fn simulate_errors(&mut self, enable: bool, probability: f32) {
        self.simulate_errors = enable;
        self.error_probability = probability.clamp(0.0, 1.0);
    }

    /// Simulate the wireless interface disappearing
    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    /// Restore the interface
    pub fn reconnect(&mut self) {
        self.connected = true;
    }

    /// Number of scan passes attempted so far
    pub fn scans_performed(&self) -> u32 {
        self.scans_performed
    }

    /// Number of scripted passes still queued
    pub fn queued_pass_count(&self) -> usize {
        self.passes.len()
    }

    fn should_simulate_error(&mut self) -> bool {
        if !self.simulate_errors {
            return false;
        }
        self.rng.gen::<f32>() < self.error_probability
    }

    fn apply_jitter(&mut self, mut pass: Vec<RawSample>) -> Vec<RawSample> {
        if self.jitter_db == 0 {
            return pass;
        }
        for sample in &mut pass {
            // Leave the no-reading sentinel alone
            if sample.rssi != 0 {
                sample.rssi += self.rng.gen_range(-self.jitter_db..=self.jitter_db);
            }
        }
        pass
    }
}

impl Default for MockScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl WifiScanner for MockScanner {
    fn scan_once(&mut self) -> ScanResult<Vec<RawSample>> {
        self.scans_performed += 1;

        if !self.connected {
            return Err(ScanError::InterfaceUnavailable {
                interface: "mock0".to_string(),
            });
        }

        if self.should_simulate_error() {
            return Err(ScanError::Simulated {
                description: "driver returned no results".to_string(),
            });
        }

        let pass = match self.passes.pop_front() {
            Some(pass) => {
                self.last_pass = Some(pass.clone());
                pass
            }
            None if self.repeat_last => self.last_pass.clone().unwrap_or_default(),
            None => Vec::new(),
        };

        Ok(self.apply_jitter(pass))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_passes() {
        let mut scanner = MockScanner::new();
        scanner.push_readings(&[("aa:bb", -50), ("cc:dd", -70)]);
        assert_eq!(scanner.queued_pass_count(), 1);

        let pass = scanner.scan_once().unwrap();
        assert_eq!(pass.len(), 2);
        assert_eq!(pass[0].rssi, -50);

        // Drained queue yields empty passes
        assert!(scanner.scan_once().unwrap().is_empty());
        assert_eq!(scanner.scans_performed(), 2);
    }

    #[test]
    fn test_repeat_last() {
        let mut scanner = MockScanner::new().repeat_last(true);
        scanner.push_readings(&[("aa:bb", -50)]);

        scanner.scan_once().unwrap();
        let pass = scanner.scan_once().unwrap();
        assert_eq!(pass.len(), 1);
    }

    #[test]
    fn test_jitter_stays_in_bounds() {
        let mut scanner = MockScanner::new().with_seed(7).with_jitter(3).repeat_last(true);
        scanner.push_readings(&[("aa:bb", -60), ("cc:dd", 0)]);

        for _ in 0..50 {
            let pass = scanner.scan_once().unwrap();
            assert!((-63..=-57).contains(&pass[0].rssi));
            assert_eq!(pass[1].rssi, 0);
        }
    }

    #[test]
    fn test_connection_simulation() {
        let mut scanner = MockScanner::new();
        scanner.disconnect();
        assert!(matches!(
            scanner.scan_once(),
            Err(ScanError::InterfaceUnavailable { .. })
        ));

        scanner.reconnect();
        assert!(scanner.scan_once().unwrap().is_empty());
    }

    #[test]
    fn test_surveyed_pass_is_strongest_nearby() {
        let registry = ApRegistry::from_records(vec![
            crate::core::SurveyRecord { id: "AA:00".to_string(), x: 0.1, y: 0.1 },
            crate::core::SurveyRecord { id: "BB:00".to_string(), x: 0.9, y: 0.9 },
        ])
        .unwrap();

        let mut scanner = MockScanner::surveyed(&registry, 0.1, 0.1).with_seed(3);
        for _ in 0..5 {
            let pass = scanner.scan_once().unwrap();
            assert_eq!(pass.len(), 2);
            assert!(pass[0].rssi > pass[1].rssi);
            assert!((-38..=-32).contains(&pass[0].rssi));
        }
    }

    #[test]
    fn test_error_simulation() {
        let mut scanner = MockScanner::new().with_seed(1);
        scanner.simulate_errors(true, 1.0);
        assert!(matches!(scanner.scan_once(), Err(ScanError::Simulated { .. })));
    }
}
