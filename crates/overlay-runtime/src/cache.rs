#![forbid(unsafe_code)]

//! Resolution cache.
//!
//! Maps event ids to their resolved records. The cache only ever grows by
//! merge-insert; entries are never partially overwritten and nothing is
//! evicted except by a full [`clear`](ResolutionCache::clear) when the event
//! list empties. Stale entries for ids that dropped out of the list are
//! harmless: the scan only consults ids that are present.

use std::collections::HashMap;
use std::sync::Arc;

use overlay_core::{EventId, ResolvedError};

/// Owned mapping from [`EventId`] to [`ResolvedError`].
#[derive(Debug, Clone, Default)]
pub struct ResolutionCache {
    entries: HashMap<EventId, Arc<ResolvedError>>,
}

impl ResolutionCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached record for `id`.
    #[must_use]
    pub fn get(&self, id: EventId) -> Option<&Arc<ResolvedError>> {
        self.entries.get(&id)
    }

    /// Whether `id` has been resolved.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: EventId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Insert a record under its own id, leaving every other entry alone.
    ///
    /// Returns the record previously stored under that id, if any.
    pub fn merge(&mut self, record: ResolvedError) -> Option<Arc<ResolvedError>> {
        self.entries.insert(record.id, Arc::new(record))
    }

    /// Drop every entry. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        removed
    }

    /// Number of cached records.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached ids in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<EventId> {
        let mut ids: Vec<_> = self.entries.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlay_core::ErrorReason;

    fn record(id: u64, message: &str) -> ResolvedError {
        ResolvedError::new(id, ErrorReason::new("Error", message, ""))
    }

    #[test]
    fn merge_adds_without_touching_other_entries() {
        let mut cache = ResolutionCache::new();
        cache.merge(record(1, "a"));
        cache.merge(record(3, "c"));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(EventId(1)).unwrap().reason.message, "a");
        assert!(cache.contains(EventId(3)));
        assert!(!cache.contains(EventId(2)));
        assert_eq!(cache.ids(), vec![EventId(1), EventId(3)]);
    }

    #[test]
    fn merge_same_id_returns_previous() {
        let mut cache = ResolutionCache::new();
        assert!(cache.merge(record(1, "first")).is_none());
        let prev = cache.merge(record(1, "second")).unwrap();
        assert_eq!(prev.reason.message, "first");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_empties_and_counts() {
        let mut cache = ResolutionCache::new();
        cache.merge(record(1, "a"));
        cache.merge(record(2, "b"));
        assert_eq!(cache.clear(), 2);
        assert!(cache.is_empty());
        assert_eq!(cache.clear(), 0);
    }
}
