use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A tattoo or piercing. Equality is by full value; boxes treat two
/// modifications with the same location but different descriptions as
/// distinct entries.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyModification {
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A hosted performer image. Carries derived fields (the URL points at a
/// transcoded asset), so removal semantics key on `id` rather than value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Image {
    pub id: String,
    #[serde(default)]
    pub url: String,
}

/// An external link attached to a performer, tagged with the site it points
/// at. Site IDs are box-local; translating them between boxes is the
/// [`SiteMapper`](crate::sites::SiteMapper)'s job.
///
/// Boxes nest the site as `"site": {"id": ...}` on the wire while edit
/// payloads and cache files use a flat `site_id`; both shapes deserialize.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "UrlRepr")]
pub struct PerformerUrl {
    pub url: String,
    pub site_id: String,
}

#[derive(Deserialize)]
struct SiteRef {
    id: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UrlRepr {
    Nested { url: String, site: SiteRef },
    Flat {
        url: String,
        #[serde(default)]
        site_id: String,
    },
}

impl From<UrlRepr> for PerformerUrl {
    fn from(repr: UrlRepr) -> Self {
        match repr {
            UrlRepr::Nested { url, site } => Self {
                url,
                site_id: site.id,
            },
            UrlRepr::Flat { url, site_id } => Self { url, site_id },
        }
    }
}

/// The full current-state view of one performer in one box.
///
/// List-valued attributes are semantically **sets**: membership, not order
/// or duplication, is meaningful. They are modeled as `BTreeSet` so that
/// union/removal during edit replay and set comparison during diffing cannot
/// reintroduce the duplicate-alias bugs the upstream data is known for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Performer {
    pub id: String,

    // Scalars. `None` means the box has no value recorded; an edit that does
    // not mention a scalar leaves it untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disambiguation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ethnicity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eye_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hair_color: Option<String>,
    /// Either a full `YYYY-MM-DD` date or a bare `YYYY` year; boxes accept
    /// both and the comparator knows how to reconcile them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cup_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band_size: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waist_size: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hip_size: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breast_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub career_start_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub career_end_year: Option<i32>,

    // Set-valued attributes.
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub aliases: BTreeSet<String>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub tattoos: BTreeSet<BodyModification>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub piercings: BTreeSet<BodyModification>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub images: BTreeSet<Image>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub urls: BTreeSet<PerformerUrl>,

    // Bookkeeping.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    pub deleted: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub merged_ids: Vec<String>,
}

impl Performer {
    /// An empty performer with only the identity set. Used as the base state
    /// when replaying a CREATE edit.
    #[must_use]
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Remove an image by its ID, ignoring the derived fields. Returns
    /// whether an image was removed.
    pub fn remove_image_by_id(&mut self, image_id: &str) -> bool {
        let before = self.images.len();
        self.images.retain(|img| img.id != image_id);
        self.images.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Performer {
        let mut p = Performer::with_id("p-1");
        p.name = Some("Jane Roe".into());
        p.country = Some("US".into());
        p.aliases = ["JR".to_string(), "Janey".to_string()].into();
        p.images = [
            Image {
                id: "img-1".into(),
                url: "https://cdn.example/1.jpg".into(),
            },
            Image {
                id: "img-2".into(),
                url: "https://cdn.example/2.jpg".into(),
            },
        ]
        .into();
        p
    }

    #[test]
    fn default_is_empty() {
        let p = Performer::default();
        assert!(p.id.is_empty());
        assert!(p.name.is_none());
        assert!(p.aliases.is_empty());
        assert!(!p.deleted);
    }

    #[test]
    fn aliases_deduplicate_by_value() {
        let mut p = Performer::default();
        p.aliases.insert("JR".into());
        p.aliases.insert("JR".into());
        assert_eq!(p.aliases.len(), 1);
    }

    #[test]
    fn remove_image_by_id_ignores_url() {
        let mut p = sample();
        assert!(p.remove_image_by_id("img-1"));
        assert_eq!(p.images.len(), 1);
        assert!(!p.remove_image_by_id("img-1"));
    }

    #[test]
    fn json_roundtrip_preserves_absent_scalars() {
        let p = sample();
        let json = serde_json::to_string(&p).expect("serialize");
        // Absent optionals are omitted entirely, not written as null.
        assert!(!json.contains("ethnicity"));
        let back: Performer = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(p, back);
        assert!(back.ethnicity.is_none());
    }

    #[test]
    fn url_deserializes_from_both_wire_shapes() {
        let nested: PerformerUrl =
            serde_json::from_str(r#"{"url":"https://x.example/p/1","site":{"id":"s-1"}}"#)
                .expect("nested");
        let flat: PerformerUrl =
            serde_json::from_str(r#"{"url":"https://x.example/p/1","site_id":"s-1"}"#)
                .expect("flat");
        assert_eq!(nested, flat);
        // Serialization is always flat.
        let json = serde_json::to_string(&flat).expect("serialize");
        assert!(json.contains("site_id"));
    }

    #[test]
    fn deserializes_from_partial_json() {
        let p: Performer =
            serde_json::from_str(r#"{"id":"p-9","name":"Solo","deleted":false}"#).expect("parse");
        assert_eq!(p.id, "p-9");
        assert_eq!(p.name.as_deref(), Some("Solo"));
        assert!(p.urls.is_empty());
    }
}
