use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Identifier of a migration; equal to the base name of the file it was
/// loaded from.
pub type MigrationId = String;

/// A named, timestamped schema change.
///
/// Dependencies are held as shared records so that a migration required by
/// several others is stored once and referenced from each of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Migration {
    pub id: MigrationId,
    pub created: DateTime<Utc>,
    pub description: Option<String>,
    pub apply: String,
    pub revert: Option<String>,
    pub dependencies: Vec<Arc<Migration>>,
}

impl Migration {
    pub fn new(id: impl Into<MigrationId>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// IDs of the resolved dependencies, in declared order.
    pub fn dependency_ids(&self) -> impl Iterator<Item = &str> {
        self.dependencies.iter().map(|dep| dep.id.as_str())
    }

    pub fn depends_on(&self, id: &str) -> bool {
        self.dependency_ids().any(|dep| dep == id)
    }
}
