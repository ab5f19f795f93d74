//! Reconstructing a performer's state at any past instant from its edit log.
//!
//! Replay is forward: seed from the CREATE edit's payload, then apply every
//! later applied MODIFY/MERGE in `closed` order, recording a snapshot per
//! applicable edit. Boxes that were bulk-imported have performers with no
//! CREATE edit; for those the chain is reversed from the current state
//! instead (see [`reverse`]), and the seed is pinned to a [`dawn`] sentinel
//! predating every real box.

mod reverse;

use crate::edit::{self, Edit, Operation};
use crate::model::Performer;
use crate::sites::SiteMapper;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;
use thiserror::Error;

/// Sentinel timestamp for states whose true instant is unrecoverable.
/// Predates the launch of every known box.
#[must_use]
pub fn dawn() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2000, 1, 1, 1, 1, 1)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Errors raised while reconstructing a history.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The performer has an empty edit log and no creation timestamp, so
    /// there is nothing to anchor even a single-state timeline on.
    #[error("performer {id} has no edit log and no creation timestamp")]
    Unanchored { id: String },
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

/// An ordered map from instant to the performer's full state at that
/// instant. Lookups resolve to the newest state at-or-before the queried
/// time.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    states: BTreeMap<DateTime<Utc>, Performer>,
}

impl Timeline {
    fn insert(&mut self, at: DateTime<Utc>, state: Performer) {
        self.states.insert(at, state);
    }

    /// The state in effect at `at`, i.e. produced by the newest edit with
    /// `closed <= at`. `None` means the performer did not exist yet.
    #[must_use]
    pub fn at_date_time(&self, at: DateTime<Utc>) -> Option<&Performer> {
        self.states.range(..=at).next_back().map(|(_, state)| state)
    }

    /// Whether any state was recorded strictly after `at`.
    #[must_use]
    pub fn has_change_after(&self, at: DateTime<Utc>) -> bool {
        self.states
            .range((Bound::Excluded(at), Bound::Unbounded))
            .next()
            .is_some()
    }

    /// The instant of the earliest recorded state.
    #[must_use]
    pub fn first_recorded(&self) -> Option<DateTime<Utc>> {
        self.states.keys().next().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// All recorded states, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = (DateTime<Utc>, &Performer)> {
        self.states.iter().map(|(at, state)| (*at, state))
    }
}

// ---------------------------------------------------------------------------
// PerformerHistory
// ---------------------------------------------------------------------------

/// A performer's current state together with every past state its edit log
/// can account for.
#[derive(Debug, Clone)]
pub struct PerformerHistory {
    /// The current state as the box reports it.
    pub performer: Performer,
    pub timeline: Timeline,
    /// Aliases a human editor removed at any point in the log. Pushing one
    /// of these back would resurrect deliberately deleted content.
    pub removed_aliases: BTreeSet<String>,
    /// IDs of images removed at any point in the log.
    pub removed_image_ids: BTreeSet<String>,
}

impl PerformerHistory {
    /// Replay a performer's edit log into a timeline of past states.
    ///
    /// Edits that only touch URLs with no counterpart site in the
    /// destination box are skipped: they cannot be replicated, so treating
    /// them as changes would flag every such performer as perpetually
    /// behind. The `mapper` decides which sites count.
    ///
    /// # Errors
    ///
    /// Fails only for a performer with no edits and no creation timestamp.
    pub fn reconstruct(
        performer: &Performer,
        edits: &[Edit],
        mapper: &SiteMapper,
    ) -> Result<Self, HistoryError> {
        let mut timeline = Timeline::default();

        if edits.is_empty() {
            // Bulk-imported without history. The current state is the only
            // state, anchored at creation.
            let created = performer.created.ok_or_else(|| HistoryError::Unanchored {
                id: performer.id.clone(),
            })?;
            timeline.insert(created, performer.clone());
            return Ok(Self {
                performer: performer.clone(),
                timeline,
                removed_aliases: BTreeSet::new(),
                removed_image_ids: BTreeSet::new(),
            });
        }

        let mut replay: Vec<&Edit> = edits
            .iter()
            .filter(|e| {
                e.applied && matches!(e.operation, Operation::Modify | Operation::Merge)
            })
            .collect();
        replay.sort_by_key(|e| e.closed);

        let create = edits
            .iter()
            .find(|e| e.operation == Operation::Create && e.details.is_some());
        let (mut state, seeded_at) = match create {
            Some(create) => (
                edit::apply(&Performer::with_id(&performer.id), create),
                create.closed,
            ),
            None => {
                tracing::debug!(
                    performer = %performer.id,
                    edits = replay.len(),
                    "no CREATE edit; reversing the edit chain"
                );
                (reverse::reverse_chain(performer, &replay), dawn())
            }
        };
        timeline.insert(seeded_at, state.clone());

        // Track everything editors ever removed so a later push does not
        // resurrect it.
        let mut removed_aliases = BTreeSet::new();
        let mut removed_image_ids = BTreeSet::new();
        for e in &replay {
            if is_applicable(e, mapper) {
                if let Some(details) = &e.details {
                    removed_aliases.extend(details.removed_aliases.iter().cloned());
                    removed_image_ids
                        .extend(details.removed_images.iter().map(|img| img.id.clone()));
                }
                state = edit::apply(&state, e);
                timeline.insert(e.closed, state.clone());
            }
        }

        Ok(Self {
            performer: performer.clone(),
            timeline,
            removed_aliases,
            removed_image_ids,
        })
    }

    /// The state in effect at `at`, or `None` before the performer existed.
    #[must_use]
    pub fn state_at(&self, at: DateTime<Utc>) -> Option<&Performer> {
        self.timeline.at_date_time(at)
    }

    /// Whether any applicable edit landed strictly after `at`.
    #[must_use]
    pub fn has_update(&self, at: DateTime<Utc>) -> bool {
        self.timeline.has_change_after(at)
    }

    /// Whether `target` is missing data that this history's state at `at`
    /// already had. Catches copies that were created through lossy manual
    /// entry: missing disambiguation, body modifications, birth date, or a
    /// shorter image list.
    #[must_use]
    pub fn is_incomplete(&self, at: DateTime<Utc>, target: &Performer) -> bool {
        let Some(local) = self.state_at(at) else {
            return false;
        };
        fn has(s: &Option<String>) -> bool {
            s.as_deref().is_some_and(|v| !v.is_empty())
        }
        if has(&local.disambiguation) && !has(&target.disambiguation) {
            return true;
        }
        if !local.tattoos.is_empty() && target.tattoos.is_empty() {
            return true;
        }
        if !local.piercings.is_empty() && target.piercings.is_empty() {
            return true;
        }
        if has(&local.birth_date) && !has(&target.birth_date) {
            return true;
        }
        local.images.len() > target.images.len()
    }
}

/// Whether an edit makes any change the destination box could observe.
fn is_applicable(edit: &Edit, mapper: &SiteMapper) -> bool {
    let Some(details) = &edit.details else {
        // Field-less edits (ID-only merges) still mark a state transition.
        return true;
    };
    if details.touches_scalar() || details.touches_collections() {
        return true;
    }
    details
        .added_urls
        .iter()
        .chain(&details.removed_urls)
        .any(|url| mapper.has_mapping(&url.site_id))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
