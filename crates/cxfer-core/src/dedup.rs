//! Duplicate identifier removal
//!
//! Removal is total: every occurrence of a repeated identifier is dropped,
//! including the first one. There is no keep-first mode.

use crate::types::{Resource, ResourceId};
use indexmap::IndexSet;
use std::collections::HashSet;

/// Result of deduplication
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Deduplicated {
    /// Resources whose identifier occurred exactly once, in input order
    pub resources: Vec<Resource>,
    /// Identifiers that occurred more than once, in order of first repeat
    pub duplicates: IndexSet<ResourceId>,
}

/// Identifiers occurring two or more times
#[must_use]
pub fn find_duplicates(resources: &[Resource]) -> IndexSet<ResourceId> {
    let mut seen = HashSet::with_capacity(resources.len());
    let mut duplicates = IndexSet::new();

    for resource in resources {
        if !seen.insert(&resource.id) {
            duplicates.insert(resource.id.clone());
        }
    }

    duplicates
}

/// Drop every resource whose identifier is repeated anywhere in the batch
#[must_use]
pub fn deduplicate(resources: Vec<Resource>) -> Deduplicated {
    let duplicates = find_duplicates(&resources);
    if duplicates.is_empty() {
        return Deduplicated {
            resources,
            duplicates,
        };
    }

    let before = resources.len();
    let resources: Vec<Resource> = resources
        .into_iter()
        .filter(|r| !duplicates.contains(&r.id))
        .collect();

    tracing::debug!(
        before,
        after = resources.len(),
        duplicates = duplicates.len(),
        "removed duplicate resources"
    );

    Deduplicated {
        resources,
        duplicates,
    }
}
