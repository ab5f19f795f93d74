//! Edit log records and the pure state-transition function that replays
//! them.
//!
//! An [`Edit`] is an immutable, timestamped change record from a box's
//! append-only log. It only ever describes *changed* fields: scalar
//! overwrites plus `added_*`/`removed_*` deltas per set attribute, and — for
//! MODIFY/MERGE — the pre-edit values of any scalar it changed, which is
//! what makes replaying the log backwards possible.

pub mod apply;

pub use apply::apply;

use crate::model::{BodyModification, Image, PerformerUrl};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// The four operation kinds a box's edit log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Bring a new performer into existence.
    Create,
    /// Change fields on an existing performer.
    Modify,
    /// Hard-delete a performer.
    Destroy,
    /// Fold one or more performers into a surviving target.
    Merge,
}

/// Error returned when parsing an unknown operation string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOperation {
    /// The unrecognised input string.
    pub raw: String,
}

impl fmt::Display for UnknownOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown edit operation '{}': expected one of CREATE, MODIFY, DESTROY, MERGE",
            self.raw
        )
    }
}

impl std::error::Error for UnknownOperation {}

impl Operation {
    /// All known operations in log order.
    pub const ALL: [Self; 4] = [Self::Create, Self::Modify, Self::Destroy, Self::Merge];

    /// The canonical upper-case wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Modify => "MODIFY",
            Self::Destroy => "DESTROY",
            Self::Merge => "MERGE",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(Self::Create),
            "MODIFY" => Ok(Self::Modify),
            "DESTROY" => Ok(Self::Destroy),
            "MERGE" => Ok(Self::Merge),
            _ => Err(UnknownOperation { raw: s.to_string() }),
        }
    }
}

// Custom serde: the wire format uses the upper-case string.
impl Serialize for Operation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Operation {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Edit
// ---------------------------------------------------------------------------

/// The performer an edit targets. Box responses embed the whole performer
/// here; only the identity and creation time matter to the engine, so the
/// rest is ignored on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditTarget {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
}

/// One applied change record from a box's edit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edit {
    pub operation: Operation,
    #[serde(default)]
    pub target: EditTarget,
    /// When the edit was accepted and applied. Replay order is ascending by
    /// this timestamp.
    pub closed: DateTime<Utc>,
    #[serde(default)]
    pub applied: bool,
    /// The changed fields. `None` happens in the wild (e.g. a MERGE that
    /// folds IDs without touching any field) and means "no-op transition".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<EditDetails>,
    /// Pre-edit values of every scalar the edit changed. Required to undo
    /// a MODIFY/MERGE when reconstructing the past.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_details: Option<EditDetails>,
    /// For MERGE: the performers folded into the target.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merge_sources: Vec<EditTarget>,
}

impl Edit {
    /// IDs of the performers a MERGE edit folded into its target.
    pub fn merge_source_ids(&self) -> impl Iterator<Item = &str> {
        self.merge_sources.iter().map(|s| s.id.as_str())
    }
}

/// The payload of an edit: optional scalar overwrites plus per-set deltas.
///
/// Absent scalars mean "not touched by this edit". Empty delta vectors mean
/// the same for set attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditDetails {
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

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub added_aliases: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub removed_aliases: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub added_tattoos: Vec<BodyModification>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub removed_tattoos: Vec<BodyModification>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub added_piercings: Vec<BodyModification>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub removed_piercings: Vec<BodyModification>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub added_images: Vec<Image>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub removed_images: Vec<Image>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub added_urls: Vec<PerformerUrl>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub removed_urls: Vec<PerformerUrl>,
}

impl EditDetails {
    /// Whether any tracked scalar carries a (non-empty) overwrite.
    #[must_use]
    pub fn touches_scalar(&self) -> bool {
        fn set(s: &Option<String>) -> bool {
            s.as_deref().is_some_and(|v| !v.is_empty())
        }
        set(&self.name)
            || set(&self.disambiguation)
            || set(&self.gender)
            || set(&self.ethnicity)
            || set(&self.country)
            || set(&self.eye_color)
            || set(&self.hair_color)
            || set(&self.birth_date)
            || set(&self.cup_size)
            || set(&self.breast_type)
            || self.height.is_some()
            || self.band_size.is_some()
            || self.waist_size.is_some()
            || self.hip_size.is_some()
            || self.career_start_year.is_some()
            || self.career_end_year.is_some()
    }

    /// Whether any alias/tattoo/piercing/image delta is present.
    #[must_use]
    pub fn touches_collections(&self) -> bool {
        !self.added_aliases.is_empty()
            || !self.removed_aliases.is_empty()
            || !self.added_tattoos.is_empty()
            || !self.removed_tattoos.is_empty()
            || !self.added_piercings.is_empty()
            || !self.removed_piercings.is_empty()
            || !self.added_images.is_empty()
            || !self.removed_images.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
