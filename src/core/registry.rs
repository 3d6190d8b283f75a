//! Surveyed access point registry
//!
//! The registry is loaded once from the survey file written by the floor-plan
//! marking tool and is read-only afterwards. Every record is validated at load
//! time so that malformed survey data stops the program before the refresh
//! loop starts.

use crate::core::types::{ApId, ApRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// One entry of the survey file, coordinates normalized to `[0, 1]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyRecord {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

/// Survey loading errors
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// Survey file exists but could not be read
    IoError { path: String, message: String },
    /// Survey file is not a JSON array of `{id, x, y}` records
    ParseError { path: String, message: String },
    /// Record has an unusable identifier or coordinate
    InvalidRecord { index: usize, id: String, reason: String },
    /// Two records normalize to the same identifier
    DuplicateIdentifier { id: String, first_index: usize, duplicate_index: usize },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::IoError { path, message } => {
                write!(f, "Failed to read survey '{}': {}", path, message)
            }
            RegistryError::ParseError { path, message } => {
                write!(f, "Malformed survey '{}': {}", path, message)
            }
            RegistryError::InvalidRecord { index, id, reason } => {
                write!(f, "Invalid survey record #{} ('{}'): {}", index, id, reason)
            }
            RegistryError::DuplicateIdentifier { id, first_index, duplicate_index } => {
                write!(
                    f,
                    "Duplicate access point '{}' in survey records #{} and #{}",
                    id, first_index, duplicate_index
                )
            }
        }
    }
}

impl std::error::Error for RegistryError {}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Known access points in survey order
#[derive(Debug, Clone, Default)]
pub struct ApRegistry {
    records: Vec<ApRecord>,
    index: HashMap<ApId, usize>,
}

impl ApRegistry {
    /// Registry with no known access points
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a registry from survey records, rejecting invalid or duplicate entries
    pub fn from_records(records: Vec<SurveyRecord>) -> RegistryResult<Self> {
        let mut registry = Self::empty();

        for (index, record) in records.into_iter().enumerate() {
            let id = ApId::new(&record.id);
            if id.is_empty() {
                return Err(RegistryError::InvalidRecord {
                    index,
                    id: record.id,
                    reason: "identifier is empty".to_string(),
                });
            }

            for (axis, value) in [("x", record.x), ("y", record.y)] {
                if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                    return Err(RegistryError::InvalidRecord {
                        index,
                        id: record.id,
                        reason: format!("{} = {} is outside [0, 1]", axis, value),
                    });
                }
            }

            if let Some(&first_index) = registry.index.get(&id) {
                return Err(RegistryError::DuplicateIdentifier {
                    id: record.id,
                    first_index,
                    duplicate_index: index,
                });
            }

            registry.index.insert(id.clone(), registry.records.len());
            registry.records.push(ApRecord {
                id,
                label: record.id,
                x: record.x,
                y: record.y,
            });
        }

        Ok(registry)
    }

    /// Parse survey JSON text
    pub fn from_json_str(content: &str, source: &str) -> RegistryResult<Self> {
        let records: Vec<SurveyRecord> = serde_json::from_str(content)
            .map_err(|e| RegistryError::ParseError {
                path: source.to_string(),
                message: e.to_string(),
            })?;
        Self::from_records(records)
    }

    /// Load the survey file; a missing file yields an empty registry
    pub fn load<P: AsRef<Path>>(path: P) -> RegistryResult<Self> {
        let path = path.as_ref();
        let path_str = path.to_string_lossy().to_string();

        if !path.exists() {
            warn!(path = %path_str, "survey file not found, starting with an empty registry");
            return Ok(Self::empty());
        }

        let content = fs::read_to_string(path).map_err(|e| RegistryError::IoError {
            path: path_str.clone(),
            message: e.to_string(),
        })?;

        let registry = Self::from_json_str(&content, &path_str)?;
        debug!(path = %path_str, access_points = registry.len(), "loaded survey");
        Ok(registry)
    }

    /// Look up a record and its survey position by normalized identifier
    pub fn get(&self, id: &ApId) -> Option<(usize, &ApRecord)> {
        self.index.get(id).map(|&i| (i, &self.records[i]))
    }

    pub fn contains(&self, id: &ApId) -> bool {
        self.index.contains_key(id)
    }

    pub fn records(&self) -> &[ApRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
