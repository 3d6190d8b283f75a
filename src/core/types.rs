//! Core data types for the localization pipeline

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized access point identifier.
///
/// Survey files and scan backends disagree on MAC formatting
/// (`AA:BB:CC:DD:EE:FF`, `aa-bb-cc-dd-ee-ff`, `aabb.ccdd.eeff`), so the
/// identifier is lowercased and stripped of separators before comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ApId(String);

impl ApId {
    /// Normalize a raw identifier string
    pub fn new(raw: &str) -> Self {
        let normalized = raw
            .chars()
            .filter(|c| !is_separator(*c))
            .flat_map(char::to_lowercase)
            .collect();
        ApId(normalized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn is_separator(c: char) -> bool {
    matches!(c, ':' | '-' | '.') || c.is_whitespace()
}

impl fmt::Display for ApId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for ApId {
    fn from(raw: &str) -> Self {
        ApId::new(raw)
    }
}

impl From<String> for ApId {
    fn from(raw: String) -> Self {
        ApId::new(&raw)
    }
}

impl From<ApId> for String {
    fn from(id: ApId) -> Self {
        id.0
    }
}

/// Surveyed access point with coordinates normalized to the unit square
#[derive(Debug, Clone, PartialEq)]
pub struct ApRecord {
    pub id: ApId,
    /// Identifier as written in the survey file
    pub label: String,
    pub x: f64,
    pub y: f64,
}

/// One access point observed in one scan pass
#[derive(Debug, Clone, PartialEq)]
pub struct RawSample {
    pub ap: ApId,
    /// Received signal strength (dBm)
    pub rssi: i32,
    /// Network name, when the backend reports one
    pub ssid: Option<String>,
}

impl RawSample {
    pub fn new(ap: impl Into<ApId>, rssi: i32) -> Self {
        Self {
            ap: ap.into(),
            rssi,
            ssid: None,
        }
    }

    pub fn with_ssid(mut self, ssid: impl Into<String>) -> Self {
        self.ssid = Some(ssid.into());
        self
    }
}

/// Median RSSI of every sample observed for one access point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedSample {
    pub ap: ApId,
    pub rssi: i32,
}

/// Pixel dimensions of the floor plan the survey was marked on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: f64,
    pub height: f64,
}

impl ImageDimensions {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Scale a normalized survey coordinate into pixel space
    pub fn scale(&self, x: f64, y: f64) -> Point2<f64> {
        Point2::new(x * self.width, y * self.height)
    }
}

impl Default for ImageDimensions {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 1000.0,
        }
    }
}

/// Surveyed access point that contributed to one estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedAnchor {
    pub label: String,
    /// Pixel position of the access point
    pub x: f64,
    pub y: f64,
    /// Strictly positive, finite
    pub weight: f64,
    /// Aggregated RSSI the weight was derived from (dBm)
    pub rssi: i32,
    /// Estimated range, only for models that produce one (meters)
    pub distance_m: Option<f64>,
}

impl WeightedAnchor {
    pub fn position(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }
}

/// Estimated device position in pixel space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimatedPosition {
    pub x: f64,
    pub y: f64,
}

impl From<Point2<f64>> for EstimatedPosition {
    fn from(point: Point2<f64>) -> Self {
        Self {
            x: point.x,
            y: point.y,
        }
    }
}

impl From<EstimatedPosition> for Point2<f64> {
    fn from(position: EstimatedPosition) -> Self {
        Point2::new(position.x, position.y)
    }
}

impl fmt::Display for EstimatedPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}
