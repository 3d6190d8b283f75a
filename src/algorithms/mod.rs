//! Position estimation algorithms

pub mod centroid;

pub use centroid::{PositionEstimator, Estimation, weighted_centroid, strongest_anchor};
