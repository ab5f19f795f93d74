//! The edit application engine: a pure, total state-transition function.
//!
//! `apply(snapshot, edit) -> snapshot'` never fails. Fields the edit does
//! not mention are left untouched; set deltas are unioned/removed by value
//! equality, except removed images which are matched by ID because image
//! records carry derived fields.

use super::Edit;
use crate::model::Performer;

fn overwrite_str(dst: &mut Option<String>, src: &Option<String>) {
    if let Some(v) = src
        && !v.is_empty()
    {
        *dst = Some(v.clone());
    }
}

fn overwrite_num(dst: &mut Option<i32>, src: Option<i32>) {
    if src.is_some() {
        *dst = src;
    }
}

/// Apply one edit to a snapshot, producing the next snapshot.
///
/// Pure and deterministic. An edit without a `details` payload is a no-op
/// transition.
#[must_use]
pub fn apply(current: &Performer, edit: &Edit) -> Performer {
    let mut next = current.clone();
    let Some(details) = &edit.details else {
        return next;
    };

    overwrite_str(&mut next.name, &details.name);
    overwrite_str(&mut next.disambiguation, &details.disambiguation);
    overwrite_str(&mut next.gender, &details.gender);
    overwrite_str(&mut next.ethnicity, &details.ethnicity);
    overwrite_str(&mut next.country, &details.country);
    overwrite_str(&mut next.eye_color, &details.eye_color);
    overwrite_str(&mut next.hair_color, &details.hair_color);
    overwrite_str(&mut next.birth_date, &details.birth_date);
    overwrite_str(&mut next.cup_size, &details.cup_size);
    overwrite_str(&mut next.breast_type, &details.breast_type);
    overwrite_num(&mut next.height, details.height);
    overwrite_num(&mut next.band_size, details.band_size);
    overwrite_num(&mut next.waist_size, details.waist_size);
    overwrite_num(&mut next.hip_size, details.hip_size);
    overwrite_num(&mut next.career_start_year, details.career_start_year);
    overwrite_num(&mut next.career_end_year, details.career_end_year);

    // Set unions: re-adding an existing member is a no-op by construction.
    next.aliases.extend(details.added_aliases.iter().cloned());
    next.tattoos.extend(details.added_tattoos.iter().cloned());
    next.piercings
        .extend(details.added_piercings.iter().cloned());
    next.images.extend(details.added_images.iter().cloned());
    next.urls.extend(details.added_urls.iter().cloned());

    // Removals by value equality.
    for alias in &details.removed_aliases {
        next.aliases.remove(alias);
    }
    for tattoo in &details.removed_tattoos {
        next.tattoos.remove(tattoo);
    }
    for piercing in &details.removed_piercings {
        next.piercings.remove(piercing);
    }
    for url in &details.removed_urls {
        next.urls.remove(url);
    }
    // Images are removed by identity: the stored URL is a derived field and
    // may not match the one recorded in the edit.
    for image in &details.removed_images {
        next.remove_image_by_id(&image.id);
    }

    next
}
