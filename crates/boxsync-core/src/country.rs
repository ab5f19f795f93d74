//! Normalizing country values to ISO 3166-1 alpha-2 codes.
//!
//! Boxes store whatever the submitter typed: a proper alpha-2 code, a full
//! English name, or a colloquialism. The comparator normalizes both sides
//! before deciding whether the values actually differ.

/// Colloquial and non-ISO spellings seen in the wild, beyond the standard
/// English short names.
const IRREGULAR: &[(&str, &str)] = &[
    ("USA", "US"),
    ("United States", "US"),
    ("United States of America", "US"),
    ("America", "US"),
    ("American", "US"),
    ("Czechia", "CZ"),
    ("England", "GB"),
    ("United Kingdom", "GB"),
    ("Russia", "RU"),
    ("Slovak Republic", "SK"),
];

/// Standard English short names for the countries that actually occur in
/// box data, keyed case-insensitively.
const NAMES: &[(&str, &str)] = &[
    ("Argentina", "AR"),
    ("Australia", "AU"),
    ("Austria", "AT"),
    ("Belgium", "BE"),
    ("Brazil", "BR"),
    ("Canada", "CA"),
    ("Chile", "CL"),
    ("China", "CN"),
    ("Colombia", "CO"),
    ("Croatia", "HR"),
    ("Cuba", "CU"),
    ("Czech Republic", "CZ"),
    ("Denmark", "DK"),
    ("Estonia", "EE"),
    ("Finland", "FI"),
    ("France", "FR"),
    ("Germany", "DE"),
    ("Greece", "GR"),
    ("Hungary", "HU"),
    ("India", "IN"),
    ("Ireland", "IE"),
    ("Israel", "IL"),
    ("Italy", "IT"),
    ("Japan", "JP"),
    ("Latvia", "LV"),
    ("Lithuania", "LT"),
    ("Mexico", "MX"),
    ("Netherlands", "NL"),
    ("New Zealand", "NZ"),
    ("Norway", "NO"),
    ("Peru", "PE"),
    ("Philippines", "PH"),
    ("Poland", "PL"),
    ("Portugal", "PT"),
    ("Romania", "RO"),
    ("Serbia", "RS"),
    ("Slovakia", "SK"),
    ("Slovenia", "SI"),
    ("South Africa", "ZA"),
    ("South Korea", "KR"),
    ("Spain", "ES"),
    ("Sweden", "SE"),
    ("Switzerland", "CH"),
    ("Thailand", "TH"),
    ("Ukraine", "UA"),
    ("Venezuela", "VE"),
    ("Vietnam", "VN"),
];

/// Normalize a stored country value to an upper-case alpha-2 code.
///
/// Two-character inputs are assumed to already be codes and pass through
/// (upper-cased). Unrecognized names are returned as-is rather than
/// guessed at, so a genuine mismatch still surfaces in comparison.
#[must_use]
pub fn to_alpha2(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.len() == 2 {
        return trimmed.to_ascii_uppercase();
    }
    for (name, code) in IRREGULAR.iter().chain(NAMES) {
        if name.eq_ignore_ascii_case(trimmed) {
            return (*code).to_string();
        }
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_letter_codes_pass_through_uppercased() {
        assert_eq!(to_alpha2("US"), "US");
        assert_eq!(to_alpha2("de"), "DE");
    }

    #[test]
    fn irregular_names_map() {
        assert_eq!(to_alpha2("USA"), "US");
        assert_eq!(to_alpha2("United States of America"), "US");
        assert_eq!(to_alpha2("England"), "GB");
        assert_eq!(to_alpha2("Slovak Republic"), "SK");
    }

    #[test]
    fn short_names_map_case_insensitively() {
        assert_eq!(to_alpha2("czech republic"), "CZ");
        assert_eq!(to_alpha2("JAPAN"), "JP");
    }

    #[test]
    fn unknown_names_are_left_alone() {
        assert_eq!(to_alpha2("Atlantis"), "Atlantis");
    }
}
