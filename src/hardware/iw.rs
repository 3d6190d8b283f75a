//! Linux scanner backed by `iw dev <iface> scan`
//!
//! Triggering a fresh scan needs `CAP_NET_ADMIN`. `scan dump` reads the
//! kernel's cached results and usually works unprivileged, at the cost of
//! possibly stale readings.

use crate::core::{ApId, RawSample};
use crate::hardware::{ScanError, ScanResult, WifiScanner};
use std::process::Command;
use tracing::debug;

/// Scanner that shells out to the `iw` utility
pub struct IwScanner {
    interface: String,
    use_dump: bool,
}

impl IwScanner {
    /// Create a scanner for a wireless interface
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            use_dump: false,
        }
    }

    /// Read cached results instead of triggering a scan
    pub fn use_cached(mut self, enable: bool) -> Self {
        self.use_dump = enable;
        self
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    fn args(&self) -> Vec<&str> {
        if self.use_dump {
            vec!["dev", self.interface.as_str(), "scan", "dump"]
        } else {
            vec!["dev", self.interface.as_str(), "scan"]
        }
    }
}

impl WifiScanner for IwScanner {
    fn scan_once(&mut self) -> ScanResult<Vec<RawSample>> {
        let args = self.args();
        let command = format!("iw {}", args.join(" "));

        let output = Command::new("iw")
            .args(&args)
            .output()
            .map_err(|e| ScanError::ProcessError {
                command: command.clone(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            if stderr.contains("No such device") {
                return Err(ScanError::InterfaceUnavailable {
                    interface: self.interface.clone(),
                });
            }
            return Err(ScanError::ScanFailed {
                reason: format!("`{}` exited with {}: {}", command, output.status, stderr),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let samples = parse_iw_scan_output(&stdout)?;
        debug!(interface = %self.interface, access_points = samples.len(), "iw scan complete");
        Ok(samples)
    }

    fn name(&self) -> &str {
        "iw"
    }
}

#[derive(Default)]
struct BssStanza {
    bssid: String,
    ssid: Option<String>,
    signal_dbm: Option<f64>,
}

impl BssStanza {
    /// Stanzas without a signal line carry no usable reading
    fn into_sample(self) -> Option<RawSample> {
        let rssi = self.signal_dbm?.round() as i32;
        Some(RawSample {
            ap: ApId::new(&self.bssid),
            rssi,
            ssid: self.ssid,
        })
    }
}

/// Parse `iw dev <iface> scan` output into raw samples
///
/// Each access point starts with a `BSS aa:bb:cc:dd:ee:ff(on wlan0)` line
/// followed by indented `key: value` lines.
pub fn parse_iw_scan_output(output: &str) -> ScanResult<Vec<RawSample>> {
    let mut samples = Vec::new();
    let mut current: Option<BssStanza> = None;

    for line in output.lines() {
        if let Some(rest) = line.strip_prefix("BSS ") {
            if let Some(sample) = current.take().and_then(BssStanza::into_sample) {
                samples.push(sample);
            }

            let mac_end = rest
                .find(|c: char| !c.is_ascii_hexdigit() && c != ':')
                .unwrap_or(rest.len());
            let mac = &rest[..mac_end];
            if mac.len() != 17 {
                return Err(ScanError::ParseError {
                    details: format!("malformed BSS line '{}'", line.trim()),
                });
            }

            current = Some(BssStanza {
                bssid: mac.to_string(),
                ..Default::default()
            });
            continue;
        }

        let Some(stanza) = current.as_mut() else {
            continue;
        };

        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("SSID:") {
            stanza.ssid = Some(rest.trim().to_string());
        } else if let Some(rest) = trimmed.strip_prefix("signal:") {
            stanza.signal_dbm = parse_signal_dbm(rest);
        }
    }

    if let Some(sample) = current.take().and_then(BssStanza::into_sample) {
        samples.push(sample);
    }

    Ok(samples)
}

/// Parse "-52.00 dBm" into dBm
fn parse_signal_dbm(s: &str) -> Option<f64> {
    let value: f64 = s.split_whitespace().next()?.parse().ok()?;
    value.is_finite().then_some(value)
}
