//! Core types, constants and the access point registry

pub mod types;
pub mod constants;
pub mod registry;

pub use types::*;
pub use constants::*;
pub use registry::{ApRegistry, RegistryError, RegistryResult, SurveyRecord};
