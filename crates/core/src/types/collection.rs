//! User-defined audiobook collections

use serde::{Deserialize, Serialize};
use std::fmt;

/// Auto-assigned collection identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CollectionId(i64);

impl CollectionId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for CollectionId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A named grouping of audiobooks.
///
/// Membership is stored on the audiobook side as a sorted id list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,
}

impl Collection {
    pub fn new(id: CollectionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Case-insensitive name comparison used for duplicate detection
    pub fn has_name(&self, name: &str) -> bool {
        self.name.trim().to_lowercase() == name.trim().to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_name_ignores_case() {
        let collection = Collection::new(CollectionId::new(1), "Sci-Fi");
        assert!(collection.has_name("sci-fi"));
        assert!(collection.has_name(" SCI-FI "));
        assert!(!collection.has_name("Fantasy"));
    }

    #[test]
    fn test_id_ordering() {
        assert!(CollectionId::new(1) < CollectionId::new(2));
        assert_eq!(CollectionId::from(7).value(), 7);
    }
}
