//! Scan error types and handling

use std::fmt;

/// Failures of the scanning capability
#[derive(Debug, Clone, PartialEq)]
pub enum ScanError {
    /// Wireless interface is missing or went away
    InterfaceUnavailable { interface: String },
    /// Scan backend process could not be started
    ProcessError { command: String, message: String },
    /// Scan backend ran but reported failure
    ScanFailed { reason: String },
    /// Backend output could not be understood
    ParseError { details: String },
    /// Recorded scan data could not be loaded
    ReplayError { path: String, message: String },
    /// Injected failure from a test scanner
    Simulated { description: String },
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::InterfaceUnavailable { interface } => {
                write!(f, "Wireless interface '{}' is unavailable", interface)
            }
            ScanError::ProcessError { command, message } => {
                write!(f, "Failed to run `{}`: {}", command, message)
            }
            ScanError::ScanFailed { reason } => {
                write!(f, "Scan failed: {}", reason)
            }
            ScanError::ParseError { details } => {
                write!(f, "Unreadable scan output: {}", details)
            }
            ScanError::ReplayError { path, message } => {
                write!(f, "Failed to load recorded scans '{}': {}", path, message)
            }
            ScanError::Simulated { description } => {
                write!(f, "Simulated scan error: {}", description)
            }
        }
    }
}

impl std::error::Error for ScanError {}

/// Result type for scan operations
pub type ScanResult<T> = Result<T, ScanError>;

/// What the refresh loop should do after a scan failure
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecoveryStrategy {
    /// Count the pass as empty and try again next tick
    SkipPass,
    /// Scanner cannot work in this setup; the loop keeps ticking but will not recover
    Unrecoverable,
}

impl ScanError {
    /// Get the recommended recovery strategy for this error
    pub fn recovery_strategy(&self) -> RecoveryStrategy {
        match self {
            ScanError::InterfaceUnavailable { .. } => RecoveryStrategy::SkipPass,
            ScanError::ProcessError { .. } => RecoveryStrategy::Unrecoverable,
            ScanError::ScanFailed { .. } => RecoveryStrategy::SkipPass,
            ScanError::ParseError { .. } => RecoveryStrategy::SkipPass,
            ScanError::ReplayError { .. } => RecoveryStrategy::Unrecoverable,
            ScanError::Simulated { .. } => RecoveryStrategy::SkipPass,
        }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        !matches!(self.recovery_strategy(), RecoveryStrategy::Unrecoverable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovery_strategy() {
        let err = ScanError::ScanFailed { reason: "device busy".to_string() };
        assert!(err.is_recoverable());

        let err = ScanError::ProcessError {
            command: "iw dev wlan0 scan".to_string(),
            message: "No such file or directory".to_string(),
        };
        assert_eq!(err.recovery_strategy(), RecoveryStrategy::Unrecoverable);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_display() {
        let err = ScanError::InterfaceUnavailable { interface: "wlan0".to_string() };
        assert_eq!(err.to_string(), "Wireless interface 'wlan0' is unavailable");
    }
}
