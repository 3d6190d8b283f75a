//! Signal model defaults and loop parameters

/// RSSI below which the linear-shift model gives no weight (dBm)
pub const LINEAR_SHIFT_FLOOR_DBM: i32 = -100;

/// Reference RSSI at the reference distance for the log-distance model (dBm)
pub const DEFAULT_REFERENCE_RSSI_DBM: f64 = -46.0;

/// Reference distance for the log-distance model (meters)
pub const DEFAULT_REFERENCE_DISTANCE_M: f64 = 1.0;

/// Indoor path-loss exponent
pub const DEFAULT_PATH_LOSS_EXPONENT: f64 = 4.0;

/// Drivers report 0 dBm when they have no reading
pub const NO_READING_RSSI: i32 = 0;

pub const DEFAULT_PASSES_PER_CYCLE: usize = 3;
pub const MAX_PASSES_PER_CYCLE: usize = 20;

pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 5_000;
pub const MIN_REFRESH_INTERVAL_MS: u64 = 100;
pub const MAX_REFRESH_INTERVAL_MS: u64 = 600_000;
