//! WiFi Indoor Positioning
//!
//! Estimates a device's position on a floor plan from the signal strength of
//! surveyed WiFi access points, using a weighted centroid of their positions.

pub mod core;
pub mod algorithms;
pub mod processing;
pub mod utils;
pub mod hardware;
pub mod api;

// Re-export commonly used types
pub use core::{
    ApId, ApRecord, ApRegistry, RawSample, AggregatedSample, ImageDimensions, WeightedAnchor,
    EstimatedPosition, RegistryError,
};
pub use algorithms::{PositionEstimator, Estimation};
pub use processing::{ScanAggregator, SignalModel, rank_by_signal};
pub use hardware::{WifiScanner, ScanError, MockScanner, IwScanner, ReplayScanner, build_scanner};
pub use api::{
    RefreshLoop, TickReport, TickStatus, PositionSink, SinkError, TextSink, JsonLinesSink, ChannelSink,
};
pub use utils::{LocatorConfig, ConfigError, LogLevel, init_tracing};
