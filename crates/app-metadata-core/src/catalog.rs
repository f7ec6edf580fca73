use std::sync::{Arc, PoisonError, RwLock};

use crate::AppMetadata;

/// Append-only, insertion-ordered store of admitted records.
///
/// Appends are serialized behind a write lock. [`Catalog::snapshot`] hands out a
/// shared immutable view; an append made while a snapshot is alive copies the
/// backing vector instead of mutating it.
#[derive(Debug, Default)]
pub struct Catalog {
    records: RwLock<Arc<Vec<AppMetadata>>>,
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record to the end of the catalog.
    ///
    /// The caller is responsible for having run [`crate::validate`] first.
    pub fn append(&self, record: AppMetadata) {
        // A push either completes or leaves the vector untouched, so a poisoned lock
        // still guards a consistent value.
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        Arc::make_mut(&mut records).push(record);
    }

    /// Point-in-time view of every record, in insertion order.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Vec<AppMetadata>> {
        Arc::clone(&self.records.read().unwrap_or_else(PoisonError::into_inner))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
