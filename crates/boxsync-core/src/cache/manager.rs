//! The cache refresh state machine.
//!
//! Three regimes, decided by the watermark's age:
//! - fresh: nothing to do, zero network calls;
//! - recoverable: fetch only the edits closed since the watermark and fold
//!   them in, oldest first;
//! - too stale: the edit backlog would be larger than the box itself, so
//!   discard and refetch everything.

use super::{CacheError, CacheStore, SnapshotCache};
use crate::client::{BoxClient, ClientError};
use crate::edit::{self, Edit, Operation};
use crate::model::Performer;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

/// A refresh failure. Client errors abort the refresh and leave the cache
/// at its previous watermark, so the next run retries the same span.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// What a refresh did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Watermark younger than the freshness limit; nothing fetched.
    Fresh,
    /// Watermark beyond the hard-reload limit; every performer refetched.
    FullReload { performers: usize },
    /// Edits since the watermark folded into the cache.
    Incremental { edits_applied: usize },
}

/// Owns a [`SnapshotCache`] and keeps it current against one box.
pub struct CacheManager<C> {
    client: C,
    store: Option<CacheStore>,
    cache: SnapshotCache,
}

impl<C: BoxClient> CacheManager<C> {
    /// A manager with no disk persistence.
    #[must_use]
    pub fn new(client: C, box_name: &str) -> Self {
        Self {
            client,
            store: None,
            cache: SnapshotCache::new(box_name),
        }
    }

    /// A manager that loads from and persists to `store`.
    ///
    /// # Errors
    ///
    /// Fails if an existing cache file is unreadable or corrupt.
    pub fn with_store(client: C, store: CacheStore, box_name: &str) -> Result<Self, CacheError> {
        let cache = store.load(box_name)?;
        Ok(Self {
            client,
            store: Some(store),
            cache,
        })
    }

    #[must_use]
    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    #[must_use]
    pub fn into_cache(self) -> SnapshotCache {
        self.cache
    }

    /// Bring the cache up to date with the box.
    ///
    /// # Errors
    ///
    /// Any client failure aborts the refresh with the watermark unchanged;
    /// persistence failures surface after the cache was already updated in
    /// memory.
    pub fn refresh(
        &mut self,
        max_age_hours: i64,
        hard_reload_days: i64,
    ) -> Result<RefreshOutcome, RefreshError> {
        self.refresh_at(Utc::now(), max_age_hours, hard_reload_days)
    }

    fn refresh_at(
        &mut self,
        now: DateTime<Utc>,
        max_age_hours: i64,
        hard_reload_days: i64,
    ) -> Result<RefreshOutcome, RefreshError> {
        let age = now - self.cache.as_of;
        if age < Duration::hours(max_age_hours) {
            tracing::debug!(box_name = %self.cache.box_name, "cache is fresh");
            return Ok(RefreshOutcome::Fresh);
        }

        if age > Duration::days(hard_reload_days) {
            tracing::info!(
                box_name = %self.cache.box_name,
                as_of = %self.cache.as_of,
                "cache too stale to refresh incrementally, reloading"
            );
            let performers = self.client.fetch_all_performers()?;
            let count = performers.len();
            self.cache.replace_all(performers, Utc::now());
            self.persist()?;
            return Ok(RefreshOutcome::FullReload { performers: count });
        }

        let horizon = self.cache.as_of;
        let mut edits = self.client.fetch_edits_since(horizon)?;
        // The client may hand back a whole trailing page; enforce both the
        // horizon and the ordering guarantee here.
        edits.retain(|e| e.closed >= horizon);
        edits.sort_by_key(|e| e.closed);
        tracing::info!(
            box_name = %self.cache.box_name,
            edits = edits.len(),
            since = %horizon,
            "applying edits to cache"
        );
        for e in &edits {
            self.fold_edit(e);
        }
        self.cache.as_of = Utc::now();
        self.persist()?;
        Ok(RefreshOutcome::Incremental {
            edits_applied: edits.len(),
        })
    }

    fn fold_edit(&mut self, e: &Edit) {
        let id = e.target.id.as_str();
        tracing::trace!(operation = %e.operation, id, "folding edit");
        match e.operation {
            Operation::Create => {
                let mut seed = Performer::with_id(id);
                seed.created = e.target.created.or(Some(e.closed));
                let mut performer = edit::apply(&seed, e);
                performer.updated = Some(e.closed);
                self.cache.upsert(performer);
            }
            Operation::Modify => {
                if let Some(existing) = self.cache.get(id) {
                    let mut next = edit::apply(existing, e);
                    next.updated = Some(e.closed);
                    self.cache.upsert(next);
                } else {
                    // Expected race: the target was merged or destroyed by
                    // an edit outside our window.
                    tracing::debug!(id, "MODIFY target not cached, skipping");
                }
            }
            Operation::Destroy => self.cache.remove(id),
            Operation::Merge => {
                if let Some(existing) = self.cache.get(id) {
                    let mut next = edit::apply(existing, e);
                    next.updated = Some(e.closed);
                    self.cache.upsert(next);
                } else {
                    tracing::debug!(id, "MERGE survivor not cached, skipping");
                }
                for source_id in e.merge_source_ids() {
                    self.cache.remove(source_id);
                }
            }
        }
    }

    fn persist(&self) -> Result<(), CacheError> {
        if let Some(store) = &self.store {
            store.save(&self.cache)?;
        }
        Ok(())
    }
}
