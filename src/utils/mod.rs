//! Configuration and logging setup

pub mod config;
pub mod logging;

pub use config::{LocatorConfig, ConfigError, LogLevel};
pub use logging::init_tracing;
