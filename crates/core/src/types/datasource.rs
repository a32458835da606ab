//! Folders tracked for incremental re-scan

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a datasource
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasourceId(String);

impl DatasourceId {
    /// Generates a fresh identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wraps a stored identifier
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DatasourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DatasourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A previously imported folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datasource {
    pub id: DatasourceId,
    pub location: String,
}

impl Datasource {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            id: DatasourceId::new(),
            location: location.into(),
        }
    }
}
