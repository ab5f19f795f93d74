//! Structural comparison of two performer snapshots.
//!
//! [`compare`] returns the set of attributes that differ, as typed
//! [`DiffCode`]s, or `{Identical}` when nothing does. The rules encode a lot
//! of field lore: some attributes are known to be dropped by upstream
//! scrapers and only count when both sides disagree on an actual value,
//! birth dates come in two granularities, and single-image collections are
//! too unreliable to diff at all.

use crate::country;
use crate::model::Performer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// One comparable attribute, plus the `Identical` sentinel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DiffCode {
    Identical,
    Name,
    Disambiguation,
    Gender,
    Ethnicity,
    Country,
    EyeColor,
    HairColor,
    BirthDate,
    Height,
    CupSize,
    BandSize,
    WaistSize,
    HipSize,
    BreastType,
    CareerStartYear,
    CareerEndYear,
    Aliases,
    Images,
}

impl DiffCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Identical => "identical",
            Self::Name => "name",
            Self::Disambiguation => "disambiguation",
            Self::Gender => "gender",
            Self::Ethnicity => "ethnicity",
            Self::Country => "country",
            Self::EyeColor => "eye_color",
            Self::HairColor => "hair_color",
            Self::BirthDate => "birth_date",
            Self::Height => "height",
            Self::CupSize => "cup_size",
            Self::BandSize => "band_size",
            Self::WaistSize => "waist_size",
            Self::HipSize => "hip_size",
            Self::BreastType => "breast_type",
            Self::CareerStartYear => "career_start_year",
            Self::CareerEndYear => "career_end_year",
            Self::Aliases => "aliases",
            Self::Images => "images",
        }
    }
}

impl fmt::Display for DiffCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn present(s: &Option<String>) -> Option<&str> {
    s.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Strict string rule: differing values or one-sided presence both count.
fn diff_str(codes: &mut BTreeSet<DiffCode>, code: DiffCode, a: &Option<String>, b: &Option<String>) {
    match (present(a), present(b)) {
        (Some(x), Some(y)) => {
            if !x.eq_ignore_ascii_case(y) {
                codes.insert(code);
            }
        }
        (Some(_), None) | (None, Some(_)) => {
            codes.insert(code);
        }
        (None, None) => {}
    }
}

fn diff_num(codes: &mut BTreeSet<DiffCode>, code: DiffCode, a: Option<i32>, b: Option<i32>) {
    match (a, b) {
        (Some(x), Some(y)) => {
            if x != y {
                codes.insert(code);
            }
        }
        (Some(_), None) | (None, Some(_)) => {
            codes.insert(code);
        }
        (None, None) => {}
    }
}

/// Lenient rule for attributes upstream scrapers drop unreliably: only a
/// genuine value/value mismatch counts, never presence/absence.
fn diff_str_lenient(
    codes: &mut BTreeSet<DiffCode>,
    code: DiffCode,
    a: &Option<String>,
    b: &Option<String>,
) {
    if let (Some(x), Some(y)) = (present(a), present(b))
        && !x.eq_ignore_ascii_case(y)
    {
        codes.insert(code);
    }
}

fn diff_num_lenient(codes: &mut BTreeSet<DiffCode>, code: DiffCode, a: Option<i32>, b: Option<i32>) {
    if let (Some(x), Some(y)) = (a, b)
        && x != y
    {
        codes.insert(code);
    }
}

/// Whether a year-only date and a full date agree: the full date must be the
/// `-01-01` placeholder for the same year.
fn year_matches_placeholder(year: &str, full: &str) -> bool {
    full.strip_prefix(year)
        .is_some_and(|rest| rest.starts_with("-01-01"))
}

fn diff_birth_date(codes: &mut BTreeSet<DiffCode>, source: &Performer, target: &Performer) {
    match (present(&source.birth_date), present(&target.birth_date)) {
        (Some(s), Some(t)) if s != t => {
            if s.len() == t.len() {
                codes.insert(DiffCode::BirthDate);
            } else if s.len() == 4 {
                if !year_matches_placeholder(s, t) {
                    codes.insert(DiffCode::BirthDate);
                }
            } else if t.len() == 4 && !year_matches_placeholder(t, s) {
                codes.insert(DiffCode::BirthDate);
            }
            // Differing lengths where neither side is year-only are garbage
            // data either way; not worth flagging.
        }
        // The date silently appearing on the target is drift; the source
        // having one the target lacks is incompleteness, handled elsewhere.
        (None, Some(_)) => {
            codes.insert(DiffCode::BirthDate);
        }
        _ => {}
    }
}

/// Undo the comma-joining bug some boxes applied to alias lists: a single
/// alias containing commas was really several.
fn normalized_aliases(aliases: &BTreeSet<String>) -> BTreeSet<String> {
    if aliases.len() == 1 {
        if let Some(only) = aliases.iter().next()
            && only.contains(',')
        {
            return only
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(String::from)
                .collect();
        }
    }
    aliases.clone()
}

/// Compare a source-side snapshot against a destination-side one.
///
/// Always returns a non-empty set: `{Identical}` when no attribute
/// differs in a way that matters.
#[must_use]
pub fn compare(source: &Performer, target: &Performer) -> BTreeSet<DiffCode> {
    let mut codes = BTreeSet::new();

    diff_str(&mut codes, DiffCode::Name, &source.name, &target.name);
    diff_str(&mut codes, DiffCode::Gender, &source.gender, &target.gender);
    diff_str(
        &mut codes,
        DiffCode::Ethnicity,
        &source.ethnicity,
        &target.ethnicity,
    );
    diff_str(
        &mut codes,
        DiffCode::EyeColor,
        &source.eye_color,
        &target.eye_color,
    );
    diff_str(
        &mut codes,
        DiffCode::HairColor,
        &source.hair_color,
        &target.hair_color,
    );
    diff_str(
        &mut codes,
        DiffCode::BreastType,
        &source.breast_type,
        &target.breast_type,
    );
    diff_num(&mut codes, DiffCode::Height, source.height, target.height);
    diff_num(
        &mut codes,
        DiffCode::HipSize,
        source.hip_size,
        target.hip_size,
    );
    diff_num(
        &mut codes,
        DiffCode::CareerStartYear,
        source.career_start_year,
        target.career_start_year,
    );
    diff_num(
        &mut codes,
        DiffCode::CareerEndYear,
        source.career_end_year,
        target.career_end_year,
    );

    // Country values arrive as codes, names, or colloquialisms; normalize
    // before deciding they differ.
    let src_country = present(&source.country).map(country::to_alpha2);
    let dst_country = present(&target.country).map(country::to_alpha2);
    diff_str(&mut codes, DiffCode::Country, &src_country, &dst_country);

    diff_birth_date(&mut codes, source, target);

    diff_str_lenient(
        &mut codes,
        DiffCode::Disambiguation,
        &source.disambiguation,
        &target.disambiguation,
    );
    diff_str_lenient(
        &mut codes,
        DiffCode::CupSize,
        &source.cup_size,
        &target.cup_size,
    );
    diff_num_lenient(
        &mut codes,
        DiffCode::BandSize,
        source.band_size,
        target.band_size,
    );
    diff_num_lenient(
        &mut codes,
        DiffCode::WaistSize,
        source.waist_size,
        target.waist_size,
    );

    // Aliases: a target set the source fully contains is consistent with
    // later server-side removal and does not count as drift.
    let src_aliases = normalized_aliases(&source.aliases);
    let dst_aliases = normalized_aliases(&target.aliases);
    if !dst_aliases.is_subset(&src_aliases) {
        codes.insert(DiffCode::Aliases);
    }

    // Single-image collections are not reliable enough to diff.
    if target.images.len() > 1 && source.images.len() != target.images.len() {
        codes.insert(DiffCode::Images);
    }

    if codes.is_empty() {
        codes.insert(DiffCode::Identical);
    }
    codes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Image;

    fn performer() -> Performer {
        let mut p = Performer::with_id("p-1");
        p.name = Some("Jane Doe".into());
        p.gender = Some("FEMALE".into());
        p.country = Some("US".into());
        p.height = Some(170);
        p.aliases = ["JD".to_string()].into();
        p
    }

    fn codes_of(source: &Performer, target: &Performer) -> BTreeSet<DiffCode> {
        compare(source, target)
    }

    #[test]
    fn identical_snapshots() {
        let p = performer();
        assert_eq!(codes_of(&p, &p), [DiffCode::Identical].into());
    }

    #[test]
    fn scalar_comparison_is_case_insensitive() {
        let a = performer();
        let mut b = performer();
        b.gender = Some("Female".into());
        assert_eq!(codes_of(&a, &b), [DiffCode::Identical].into());
    }

    #[test]
    fn strict_scalars_flag_one_sided_presence() {
        let a = performer();
        let mut b = performer();
        b.height = None;
        assert!(codes_of(&a, &b).contains(&DiffCode::Height));
    }

    #[test]
    fn lenient_scalars_ignore_presence_but_flag_mismatch() {
        let mut a = performer();
        a.disambiguation = Some("the tall one".into());
        let b = performer();
        assert_eq!(codes_of(&a, &b), [DiffCode::Identical].into());

        let mut b = performer();
        b.disambiguation = Some("the other one".into());
        assert!(codes_of(&a, &b).contains(&DiffCode::Disambiguation));
    }

    #[test]
    fn country_is_normalized_before_comparison() {
        let mut a = performer();
        a.country = Some("United States".into());
        let mut b = performer();
        b.country = Some("us".into());
        assert_eq!(codes_of(&a, &b), [DiffCode::Identical].into());

        b.country = Some("Germany".into());
        assert!(codes_of(&a, &b).contains(&DiffCode::Country));
    }

    #[test]
    fn year_only_birth_date_matches_placeholder_full_date() {
        let mut a = performer();
        a.birth_date = Some("1990".into());
        let mut b = performer();
        b.birth_date = Some("1990-01-01".into());
        assert_eq!(codes_of(&a, &b), [DiffCode::Identical].into());

        b.birth_date = Some("1990-02-03".into());
        assert!(codes_of(&a, &b).contains(&DiffCode::BirthDate));

        b.birth_date = Some("1991-01-01".into());
        assert!(codes_of(&a, &b).contains(&DiffCode::BirthDate));
    }

    #[test]
    fn birth_date_presence_is_one_directional() {
        let a = performer();
        let mut b = performer();
        b.birth_date = Some("1990-01-01".into());
        assert!(
            codes_of(&a, &b).contains(&DiffCode::BirthDate),
            "appearing on the target is drift"
        );
        assert_eq!(
            codes_of(&b, &a),
            [DiffCode::Identical].into(),
            "missing from the target is incompleteness, not drift"
        );
    }

    #[test]
    fn alias_subset_of_source_is_not_drift() {
        let mut a = performer();
        a.aliases = ["JD".to_string(), "Janey".to_string()].into();
        let b = performer();
        assert_eq!(codes_of(&a, &b), [DiffCode::Identical].into());

        // Target has an alias the source never had.
        let mut c = performer();
        c.aliases = ["JD".to_string(), "Someone Else".to_string()].into();
        assert!(codes_of(&a, &c).contains(&DiffCode::Aliases));
    }

    #[test]
    fn comma_joined_aliases_are_unpacked() {
        let mut a = performer();
        a.aliases = ["JD".to_string(), "Janey".to_string()].into();
        let mut b = performer();
        b.aliases = ["JD, Janey".to_string()].into();
        assert_eq!(codes_of(&a, &b), [DiffCode::Identical].into());
    }

    #[test]
    fn single_image_collections_are_never_diffed() {
        let img = |id: &str| Image {
            id: id.into(),
            url: format!("https://cdn.example/{id}.jpg"),
        };
        let mut a = performer();
        a.images = [img("1"), img("2"), img("3")].into();
        let mut b = performer();
        b.images = [img("1")].into();
        assert_eq!(codes_of(&a, &b), [DiffCode::Identical].into());

        b.images = [img("1"), img("2")].into();
        assert!(codes_of(&a, &b).contains(&DiffCode::Images));
    }

    #[test]
    fn diffcode_serde_is_snake_case() {
        let json = serde_json::to_string(&DiffCode::EyeColor).unwrap();
        assert_eq!(json, "\"eye_color\"");
        let back: DiffCode = serde_json::from_str("\"career_start_year\"").unwrap();
        assert_eq!(back, DiffCode::CareerStartYear);
    }
}
