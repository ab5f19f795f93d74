//! Undoing an edit chain to recover a performer's earliest knowable state.
//!
//! Some boxes predate their own edit logs: imported performers have MODIFY
//! edits but no CREATE. The current state is still exact, so walking the
//! chain newest-to-oldest and undoing each edit — scalars restored from
//! `old_details`, set deltas inverted — yields the state before the first
//! surviving edit.

use crate::edit::Edit;
use crate::model::Performer;

fn restore_str(dst: &mut Option<String>, touched: &Option<String>, old: Option<String>) {
    if touched.as_deref().is_some_and(|v| !v.is_empty()) {
        // The pre-edit value may itself be absent; restoring to None is
        // correct and required.
        *dst = old.filter(|v| !v.is_empty());
    }
}

fn restore_num(dst: &mut Option<i32>, touched: Option<i32>, old: Option<i32>) {
    if touched.is_some() {
        *dst = old;
    }
}

/// Undo `edits` (ascending by `closed`) against the current state, newest
/// first, returning the state before any of them happened.
pub(crate) fn reverse_chain(current: &Performer, edits: &[&Edit]) -> Performer {
    let mut state = current.clone();
    state.merged_ids.clear();

    for edit in edits.iter().rev() {
        let Some(details) = &edit.details else {
            // A MERGE that folded IDs without touching fields.
            continue;
        };
        let old = edit.old_details.clone().unwrap_or_default();

        restore_str(&mut state.name, &details.name, old.name);
        restore_str(
            &mut state.disambiguation,
            &details.disambiguation,
            old.disambiguation,
        );
        restore_str(&mut state.gender, &details.gender, old.gender);
        restore_str(&mut state.ethnicity, &details.ethnicity, old.ethnicity);
        restore_str(&mut state.country, &details.country, old.country);
        restore_str(&mut state.eye_color, &details.eye_color, old.eye_color);
        restore_str(&mut state.hair_color, &details.hair_color, old.hair_color);
        restore_str(&mut state.birth_date, &details.birth_date, old.birth_date);
        restore_str(&mut state.cup_size, &details.cup_size, old.cup_size);
        restore_str(&mut state.breast_type, &details.breast_type, old.breast_type);
        restore_num(&mut state.height, details.height, old.height);
        restore_num(&mut state.band_size, details.band_size, old.band_size);
        restore_num(&mut state.waist_size, details.waist_size, old.waist_size);
        restore_num(&mut state.hip_size, details.hip_size, old.hip_size);
        restore_num(
            &mut state.career_start_year,
            details.career_start_year,
            old.career_start_year,
        );
        restore_num(
            &mut state.career_end_year,
            details.career_end_year,
            old.career_end_year,
        );

        // Invert the set deltas: what the edit added, take away; what it
        // removed, put back.
        for alias in &details.added_aliases {
            state.aliases.remove(alias);
        }
        for tattoo in &details.added_tattoos {
            state.tattoos.remove(tattoo);
        }
        for piercing in &details.added_piercings {
            state.piercings.remove(piercing);
        }
        for url in &details.added_urls {
            state.urls.remove(url);
        }
        for image in &details.added_images {
            state.remove_image_by_id(&image.id);
        }

        state.aliases.extend(details.removed_aliases.iter().cloned());
        state.tattoos.extend(details.removed_tattoos.iter().cloned());
        state
            .piercings
            .extend(details.removed_piercings.iter().cloned());
        state.urls.extend(details.removed_urls.iter().cloned());
        state.images.extend(details.removed_images.iter().cloned());
    }

    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::{EditDetails, EditTarget, Operation, apply};
    use crate::model::Image;
    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 5, day, 12, 0, 0).single().unwrap()
    }

    fn modify(day: u32, details: EditDetails, old: EditDetails) -> Edit {
        Edit {
            operation: Operation::Modify,
            target: EditTarget {
                id: "p-1".into(),
                created: None,
            },
            closed: at(day),
            applied: true,
            details: Some(details),
            old_details: Some(old),
            merge_sources: vec![],
        }
    }

    #[test]
    fn restores_scalar_to_absent_when_old_value_was_none() {
        let mut now = Performer::with_id("p-1");
        now.ethnicity = Some("Caucasian".into());
        let edit = modify(
            2,
            EditDetails {
                ethnicity: Some("Caucasian".into()),
                ..EditDetails::default()
            },
            EditDetails::default(),
        );
        let first = reverse_chain(&now, &[&edit]);
        assert!(first.ethnicity.is_none());
    }

    #[test]
    fn inverts_set_deltas_across_two_edits() {
        let mut now = Performer::with_id("p-1");
        now.aliases = ["B".to_string(), "C".to_string()].into();
        now.images = [Image {
            id: "img-2".into(),
            url: "https://cdn.example/2.jpg".into(),
        }]
        .into();

        // Edit 1 removed alias "A" and image img-1; edit 2 added "C" and
        // img-2.
        let e1 = modify(
            1,
            EditDetails {
                removed_aliases: vec!["A".into()],
                removed_images: vec![Image {
                    id: "img-1".into(),
                    url: "https://cdn.example/1.jpg".into(),
                }],
                ..EditDetails::default()
            },
            EditDetails::default(),
        );
        let e2 = modify(
            2,
            EditDetails {
                added_aliases: vec!["C".into()],
                added_images: vec![Image {
                    id: "img-2".into(),
                    url: "https://cdn.example/2.jpg".into(),
                }],
                ..EditDetails::default()
            },
            EditDetails::default(),
        );

        let first = reverse_chain(&now, &[&e1, &e2]);
        assert_eq!(
            first.aliases,
            ["A".to_string(), "B".to_string()].into_iter().collect()
        );
        assert_eq!(first.images.len(), 1);
        assert!(first.images.iter().any(|img| img.id == "img-1"));
    }

    #[test]
    fn details_less_edit_is_skipped() {
        let mut now = Performer::with_id("p-1");
        now.name = Some("Jane".into());
        let merge = Edit {
            operation: Operation::Merge,
            target: EditTarget {
                id: "p-1".into(),
                created: None,
            },
            closed: at(3),
            applied: true,
            details: None,
            old_details: None,
            merge_sources: vec![EditTarget {
                id: "p-2".into(),
                created: None,
            }],
        };
        assert_eq!(reverse_chain(&now, &[&merge]), now);
    }

    // -----------------------------------------------------------------------
    // Round-trip law: for a well-formed edit (old_details records the true
    // pre-values, adds are fresh, removes are present), reversing after
    // applying recovers the original state.
    // -----------------------------------------------------------------------

    fn arb_base() -> impl Strategy<Value = Performer> {
        (
            proptest::option::of("[A-Za-z]{1,12}"),
            proptest::option::of(150..200i32),
            proptest::collection::btree_set("[a-z]{3,8}", 0..5),
        )
            .prop_map(|(name, height, aliases)| {
                let mut p = Performer::with_id("p-1");
                p.name = name;
                p.height = height;
                p.aliases = aliases;
                p
            })
    }

    fn arb_case() -> impl Strategy<Value = (Performer, Edit)> {
        arb_base().prop_flat_map(|base| {
            let existing: Vec<String> = base.aliases.iter().cloned().collect();
            let removable = existing.len();
            (
                Just(base),
                proptest::option::of("[A-Za-z]{1,10}"),
                proptest::option::of(150..200i32),
                // Hyphenated prefix guarantees freshness: base aliases are
                // letters only.
                proptest::collection::vec("new-[a-z]{3,6}", 0..3),
                proptest::sample::subsequence(existing, 0..=removable),
            )
                .prop_map(|(base, new_name, new_height, added, removed)| {
                    let details = EditDetails {
                        name: new_name.clone(),
                        height: new_height,
                        added_aliases: added,
                        removed_aliases: removed,
                        ..EditDetails::default()
                    };
                    let old = EditDetails {
                        name: new_name.as_ref().and(base.name.clone()),
                        height: new_height.and(base.height),
                        ..EditDetails::default()
                    };
                    let edit = modify(2, details, old);
                    (base, edit)
                })
        })
    }

    proptest! {
        #[test]
        fn reverse_undoes_apply((base, edit) in arb_case()) {
            let after = apply(&base, &edit);
            let recovered = reverse_chain(&after, &[&edit]);
            prop_assert_eq!(recovered, base);
        }
    }
}
