//! A locally persisted mirror of one box's performers.
//!
//! The cache holds every performer snapshot plus a single watermark (`as_of`)
//! recording how far the box's edit log has been folded in. Refreshing is
//! incremental: only edits closed since the watermark are fetched and
//! replayed, unless the cache is so stale that a full reload is cheaper
//! (see [`manager::CacheManager`]).

pub mod manager;
pub mod store;

pub use manager::{CacheManager, RefreshOutcome};
pub use store::CacheStore;

use crate::history;
use crate::model::Performer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised loading or persisting a cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// An in-memory snapshot collection for one box, keyed by performer ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotCache {
    /// The box this cache mirrors.
    #[serde(rename = "box")]
    pub box_name: String,
    /// Watermark: every edit closed at or before this instant is reflected
    /// in `performers`.
    pub as_of: DateTime<Utc>,
    performers: BTreeMap<String, Performer>,
}

impl SnapshotCache {
    /// An empty cache whose watermark predates everything, so the first
    /// refresh always does a full reload.
    #[must_use]
    pub fn new(box_name: impl Into<String>) -> Self {
        Self {
            box_name: box_name.into(),
            as_of: history::dawn(),
            performers: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Performer> {
        self.performers.get(id)
    }

    /// Insert or replace a snapshot, keyed by its own ID.
    pub fn upsert(&mut self, performer: Performer) {
        self.performers.insert(performer.id.clone(), performer);
    }

    /// Remove a snapshot. Removing an absent ID is a no-op: the performer
    /// may have been merged or destroyed by an edit the cache never saw.
    pub fn remove(&mut self, id: &str) {
        self.performers.remove(id);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.performers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.performers.is_empty()
    }

    /// All cached snapshots, in ID order.
    pub fn performers(&self) -> impl Iterator<Item = &Performer> {
        self.performers.values()
    }

    /// Replace the whole collection after a full reload.
    pub fn replace_all(&mut self, performers: Vec<Performer>, as_of: DateTime<Utc>) {
        self.performers = performers
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();
        self.as_of = as_of;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_cache_is_empty_with_dawn_watermark() {
        let cache = SnapshotCache::new("alpha");
        assert!(cache.is_empty());
        assert_eq!(cache.as_of, history::dawn());
    }

    #[test]
    fn upsert_replaces_by_id() {
        let mut cache = SnapshotCache::new("alpha");
        let mut p = Performer::with_id("p-1");
        p.name = Some("Jane".into());
        cache.upsert(p.clone());
        p.name = Some("Janet".into());
        cache.upsert(p);
        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.get("p-1").and_then(|p| p.name.as_deref()),
            Some("Janet")
        );
    }

    #[test]
    fn remove_absent_id_is_a_noop() {
        let mut cache = SnapshotCache::new("alpha");
        cache.upsert(Performer::with_id("p-1"));
        cache.remove("p-2");
        cache.remove("p-1");
        cache.remove("p-1");
        assert!(cache.is_empty());
    }

    #[test]
    fn serializes_with_box_key() {
        let cache = SnapshotCache::new("alpha");
        let value = serde_json::to_value(&cache).unwrap();
        assert_eq!(value["box"], "alpha");
        assert!(value.get("as_of").is_some());
    }
}
