//! The governing decision: is it safe to push the source's state to the
//! destination?
//!
//! An automated write is only safe when the destination still looks exactly
//! like the source did at the destination's last update. Any other
//! difference at that instant means a human edited the destination copy,
//! and overwriting their work is never acceptable.

use crate::compare::{self, DiffCode};
use crate::history::PerformerHistory;
use crate::model::Performer;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// The outcome of evaluating one performer pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncDecision {
    /// Nothing happened on the source since the destination last updated,
    /// and the destination is not missing anything. Skip.
    UpToDate,
    /// The destination no longer matches the source's historical state at
    /// its own last update: a human diverged it. Never overwrite.
    ManualDrift(BTreeSet<DiffCode>),
    /// The source changed, but the destination already carries everything
    /// the current source state has. Skip.
    NothingNew,
    /// The destination is an unmodified copy of an older source state and
    /// the source has more now. Safe to push; the codes say what differs.
    SafeToUpdate(BTreeSet<DiffCode>),
}

impl SyncDecision {
    /// Short tag for summaries and CSV output.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::UpToDate => "up-to-date",
            Self::ManualDrift(_) => "manual-drift",
            Self::NothingNew => "nothing-new",
            Self::SafeToUpdate(_) => "safe-to-update",
        }
    }
}

/// Evaluate whether the destination copy (`target`, last updated at
/// `target_updated_at`) can be safely brought up to the source history's
/// current state.
#[must_use]
pub fn evaluate(
    history: &PerformerHistory,
    target: &Performer,
    target_updated_at: DateTime<Utc>,
) -> SyncDecision {
    let has_update = history.has_update(target_updated_at);
    let incomplete = history.is_incomplete(target_updated_at, target);
    if !has_update && !incomplete {
        return SyncDecision::UpToDate;
    }

    // Did anyone touch the destination since it was written? Compare it to
    // what the source looked like back then. An images-only difference is
    // tolerated: single-image uploads make that comparison unreliable.
    let never_existed = Performer::default();
    let state_then = history
        .state_at(target_updated_at)
        .unwrap_or(&never_existed);
    let codes_then = compare::compare(state_then, target);
    let identical: BTreeSet<DiffCode> = [DiffCode::Identical].into();
    let images_only: BTreeSet<DiffCode> = [DiffCode::Images].into();
    if codes_then != identical && codes_then != images_only {
        tracing::debug!(
            performer = %history.performer.id,
            codes = ?codes_then,
            "destination diverged from source history"
        );
        return SyncDecision::ManualDrift(codes_then);
    }

    let codes_now = compare::compare(&history.performer, target);
    if codes_now == identical {
        return SyncDecision::NothingNew;
    }
    SyncDecision::SafeToUpdate(codes_now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::{Edit, EditDetails, EditTarget, Operation};
    use crate::sites::SiteMapper;
    use chrono::{TimeZone, Utc};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 5, day, 12, 0, 0).single().unwrap()
    }

    fn edit(op: Operation, day: u32, details: EditDetails) -> Edit {
        Edit {
            operation: op,
            target: EditTarget {
                id: "p-1".into(),
                created: Some(at(1)),
            },
            closed: at(day),
            applied: true,
            details: Some(details),
            old_details: None,
            merge_sources: vec![],
        }
    }

    /// Created day 1 as "Jane Roe"/height 170, renamed day 5 to "Jane Doe".
    fn history() -> PerformerHistory {
        let mut current = Performer::with_id("p-1");
        current.name = Some("Jane Doe".into());
        current.height = Some(170);
        let edits = vec![
            edit(
                Operation::Create,
                1,
                EditDetails {
                    name: Some("Jane Roe".into()),
                    height: Some(170),
                    ..EditDetails::default()
                },
            ),
            edit(
                Operation::Modify,
                5,
                EditDetails {
                    name: Some("Jane Doe".into()),
                    ..EditDetails::default()
                },
            ),
        ];
        PerformerHistory::reconstruct(&current, &edits, &SiteMapper::empty()).unwrap()
    }

    fn copy_of_day(day: u32) -> Performer {
        let h = history();
        h.state_at(at(day)).unwrap().clone()
    }

    #[test]
    fn up_to_date_when_nothing_changed_since() {
        let target = copy_of_day(6);
        assert_eq!(evaluate(&history(), &target, at(6)), SyncDecision::UpToDate);
    }

    #[test]
    fn safe_to_update_pristine_older_copy() {
        // Destination was copied on day 2 and never touched.
        let target = copy_of_day(2);
        match evaluate(&history(), &target, at(2)) {
            SyncDecision::SafeToUpdate(codes) => {
                assert!(codes.contains(&DiffCode::Name));
            }
            other => panic!("expected SafeToUpdate, got {other:?}"),
        }
    }

    #[test]
    fn manual_drift_is_never_overwritten() {
        // Destination copied on day 2, then a human fixed the height.
        let mut target = copy_of_day(2);
        target.height = Some(175);
        match evaluate(&history(), &target, at(2)) {
            SyncDecision::ManualDrift(codes) => {
                assert!(codes.contains(&DiffCode::Height));
            }
            other => panic!("expected ManualDrift, got {other:?}"),
        }
    }

    #[test]
    fn nothing_new_when_the_update_carries_nothing_pushable() {
        // The only edit since the copy touched disambiguation, which the
        // comparator treats leniently; the destination copy is pristine and
        // there is nothing worth pushing.
        let edits = vec![
            edit(
                Operation::Create,
                1,
                EditDetails {
                    name: Some("Jane Doe".into()),
                    height: Some(170),
                    ..EditDetails::default()
                },
            ),
            edit(
                Operation::Modify,
                5,
                EditDetails {
                    disambiguation: Some("the tall one".into()),
                    ..EditDetails::default()
                },
            ),
        ];
        let mut current = Performer::with_id("p-1");
        current.name = Some("Jane Doe".into());
        current.height = Some(170);
        current.disambiguation = Some("the tall one".into());
        let h = PerformerHistory::reconstruct(&current, &edits, &SiteMapper::empty()).unwrap();

        let target = h.state_at(at(2)).unwrap().clone();
        assert_eq!(evaluate(&h, &target, at(2)), SyncDecision::NothingNew);
    }

    #[test]
    fn incompleteness_alone_triggers_evaluation() {
        // No source edit lands after the target's update, but the source
        // has a birth date the destination copy lost.
        let edits = vec![edit(
            Operation::Create,
            1,
            EditDetails {
                name: Some("Jane Doe".into()),
                height: Some(170),
                birth_date: Some("1990-02-03".into()),
                ..EditDetails::default()
            },
        )];
        let mut current = Performer::with_id("p-1");
        current.name = Some("Jane Doe".into());
        current.height = Some(170);
        current.birth_date = Some("1990-02-03".into());
        let h = PerformerHistory::reconstruct(&current, &edits, &SiteMapper::empty()).unwrap();

        let mut target = current.clone();
        target.birth_date = None;
        assert_ne!(evaluate(&h, &target, at(6)), SyncDecision::UpToDate);
    }

    #[test]
    fn decision_labels() {
        assert_eq!(SyncDecision::UpToDate.label(), "up-to-date");
        assert_eq!(
            SyncDecision::SafeToUpdate(BTreeSet::new()).label(),
            "safe-to-update"
        );
    }
}
