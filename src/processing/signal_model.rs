//! RSSI to position-weight conversion
//!
//! Two strategies are supported and selected explicitly by configuration:
//!
//! - **Linear shift**: `weight = (rssi - floor)²`, readings at or below the
//!   floor are dropped. No range estimate.
//! - **Log-distance path loss**: `d = d0 · 10^((rssi0 - rssi) / (10·n))` and
//!   `weight = 1 / d²`, so nearer access points dominate.
//!
//! Either way a retained reading always has a finite, strictly positive weight.
//! Anything else is reported as `None` and never reaches the estimator.

use crate::core::{
    RawSample, DEFAULT_PATH_LOSS_EXPONENT, DEFAULT_REFERENCE_DISTANCE_M,
    DEFAULT_REFERENCE_RSSI_DBM, LINEAR_SHIFT_FLOOR_DBM, NO_READING_RSSI,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Invalid signal model parameters
#[derive(Debug, Clone, PartialEq)]
pub enum SignalModelError {
    InvalidParameter { parameter: String, value: String, reason: String },
}

impl fmt::Display for SignalModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalModelError::InvalidParameter { parameter, value, reason } => {
                write!(f, "Invalid signal model parameter {} = {}: {}", parameter, value, reason)
            }
        }
    }
}

impl std::error::Error for SignalModelError {}

fn default_floor_dbm() -> i32 {
    LINEAR_SHIFT_FLOOR_DBM
}

fn default_rssi0_dbm() -> f64 {
    DEFAULT_REFERENCE_RSSI_DBM
}

fn default_d0_m() -> f64 {
    DEFAULT_REFERENCE_DISTANCE_M
}

fn default_exponent() -> f64 {
    DEFAULT_PATH_LOSS_EXPONENT
}

/// Signal strength to weight strategy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SignalModel {
    LinearShift {
        /// RSSI that maps to zero weight (dBm)
        #[serde(default = "default_floor_dbm")]
        floor_dbm: i32,
    },
    LogDistance {
        /// RSSI measured at the reference distance (dBm)
        #[serde(default = "default_rssi0_dbm")]
        rssi0_dbm: f64,
        /// Reference distance (meters)
        #[serde(default = "default_d0_m")]
        d0_m: f64,
        /// Path-loss exponent, 2 in free space, 3-5 indoors
        #[serde(default = "default_exponent")]
        exponent: f64,
    },
}

/// Weight and optional range derived from one reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalEstimate {
    pub weight: f64,
    pub distance_m: Option<f64>,
}

impl SignalModel {
    /// Linear-shift model with the standard -100 dBm floor
    pub fn linear_shift() -> Self {
        SignalModel::LinearShift {
            floor_dbm: LINEAR_SHIFT_FLOOR_DBM,
        }
    }

    /// Log-distance model with indoor defaults (-46 dBm at 1 m, n = 4)
    pub fn log_distance() -> Self {
        SignalModel::LogDistance {
            rssi0_dbm: DEFAULT_REFERENCE_RSSI_DBM,
            d0_m: DEFAULT_REFERENCE_DISTANCE_M,
            exponent: DEFAULT_PATH_LOSS_EXPONENT,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SignalModel::LinearShift { .. } => "linear_shift",
            SignalModel::LogDistance { .. } => "log_distance",
        }
    }

    /// Check the model parameters
    pub fn validate(&self) -> Result<(), SignalModelError> {
        match *self {
            SignalModel::LinearShift { floor_dbm } => {
                if floor_dbm >= 0 {
                    return Err(invalid("floor_dbm", floor_dbm, "floor must be a negative dBm value"));
                }
            }
            SignalModel::LogDistance { rssi0_dbm, d0_m, exponent } => {
                if !rssi0_dbm.is_finite() {
                    return Err(invalid("rssi0_dbm", rssi0_dbm, "reference RSSI must be finite"));
                }
                if !d0_m.is_finite() || d0_m <= 0.0 {
                    return Err(invalid("d0_m", d0_m, "reference distance must be positive"));
                }
                if !exponent.is_finite() || exponent <= 0.0 {
                    return Err(invalid("exponent", exponent, "path-loss exponent must be positive"));
                }
            }
        }
        Ok(())
    }

    /// Estimated range for models that produce one
    ///
    /// Returns `None` for the linear-shift model and for the 0 dBm no-reading
    /// sentinel.
    pub fn distance_m(&self, rssi: i32) -> Option<f64> {
        match *self {
            SignalModel::LinearShift { .. } => None,
            SignalModel::LogDistance { rssi0_dbm, d0_m, exponent } => {
                if rssi == NO_READING_RSSI {
                    return None;
                }
                let distance = d0_m * 10f64.powf((rssi0_dbm - rssi as f64) / (10.0 * exponent));
                (distance.is_finite() && distance > 0.0).then_some(distance)
            }
        }
    }

    /// Convert one reading into a weight, `None` when the reading is unusable
    pub fn evaluate(&self, rssi: i32) -> Option<SignalEstimate> {
        let estimate = match *self {
            SignalModel::LinearShift { floor_dbm } => {
                let shift = rssi as i64 - floor_dbm as i64;
                if shift <= 0 {
                    return None;
                }
                SignalEstimate {
                    weight: (shift as f64).powi(2),
                    distance_m: None,
                }
            }
            SignalModel::LogDistance { .. } => {
                let distance = self.distance_m(rssi)?;
                SignalEstimate {
                    weight: 1.0 / (distance * distance),
                    distance_m: Some(distance),
                }
            }
        };

        (estimate.weight.is_finite() && estimate.weight > 0.0).then_some(estimate)
    }
}

impl Default for SignalModel {
    fn default() -> Self {
        Self::log_distance()
    }
}

fn invalid(parameter: &str, value: impl ToString, reason: &str) -> SignalModelError {
    SignalModelError::InvalidParameter {
        parameter: parameter.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// One access point in a nearby-AP listing
#[derive(Debug, Clone, PartialEq)]
pub struct RankedReading {
    pub sample: RawSample,
    pub distance_m: Option<f64>,
}

/// Sort readings strongest first and attach the model's range estimate
///
/// Equal RSSI keeps scan order.
pub fn rank_by_signal(samples: Vec<RawSample>, model: &SignalModel) -> Vec<RankedReading> {
    let mut ranked: Vec<RankedReading> = samples
        .into_iter()
        .map(|sample| RankedReading {
            distance_m: model.distance_m(sample.rssi),
            sample,
        })
        .collect();
    ranked.sort_by(|a, b| b.sample.rssi.cmp(&a.sample.rssi));
    ranked
}
