//! Scanning capability
//!
//! The estimation core only sees the [`WifiScanner`] trait. Backends here
//! cover Linux `iw`, recorded scan files and a scripted mock.

pub mod scanner;
pub mod iw;
pub mod replay;
pub mod mock;
pub mod error;

pub use scanner::{WifiScanner, ScannerBackend, ScannerSettings};
pub use iw::{IwScanner, parse_iw_scan_output};
pub use replay::{ReplayScanner, RecordedSample};
pub use mock::MockScanner;
pub use error::{ScanError, ScanResult, RecoveryStrategy};

use crate::core::ApRegistry;

/// Build the scanner selected by the settings
///
/// The mock backend simulates a device standing at the middle of the surveyed
/// floor plan.
pub fn build_scanner(
    settings: &ScannerSettings,
    registry: &ApRegistry,
) -> ScanResult<Box<dyn WifiScanner>> {
    match settings.backend {
        ScannerBackend::Iw => Ok(Box::new(
            IwScanner::new(settings.interface.clone()).use_cached(settings.use_cached),
        )),
        ScannerBackend::Replay => {
            let path = settings.replay_path.as_deref().ok_or_else(|| ScanError::ReplayError {
                path: String::new(),
                message: "no replay file configured".to_string(),
            })?;
            Ok(Box::new(ReplayScanner::from_file(path)?))
        }
        ScannerBackend::Mock => Ok(Box::new(MockScanner::surveyed(registry, 0.5, 0.5))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_scanner() {
        let settings = ScannerSettings {
            backend: ScannerBackend::Mock,
            ..Default::default()
        };
        assert_eq!(build_scanner(&settings, &ApRegistry::empty()).unwrap().name(), "mock");

        let settings = ScannerSettings {
            backend: ScannerBackend::Replay,
            replay_path: None,
            ..Default::default()
        };
        assert!(build_scanner(&settings, &ApRegistry::empty()).is_err());
    }
}
