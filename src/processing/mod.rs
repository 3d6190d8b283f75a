//! Signal processing: scan aggregation and RSSI weighting

pub mod aggregator;
pub mod signal_model;

pub use aggregator::{ScanAggregator, ScanCollection, median};
pub use signal_model::{SignalModel, SignalEstimate, SignalModelError, RankedReading, rank_by_signal};
