//! The API surface the engine needs from a box.
//!
//! Everything network-shaped goes through the [`BoxClient`] trait so the
//! engine itself stays synchronous and testable with in-memory fakes; the
//! HTTP implementation lives in the CLI crate.

use crate::edit::Edit;
use crate::model::Performer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A per-call failure talking to a box. Never retried; the caller treats
/// the affected performer or refresh as failed and moves on.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("performer {id} not found")]
    NotFound { id: String },
    #[error("box returned HTTP status {status}")]
    Status { status: u16 },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("failed to decode box response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("box API error: {0}")]
    Api(String),
}

/// A performer's current snapshot together with its own edit log, as a box
/// reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformerRecord {
    #[serde(flatten)]
    pub performer: Performer,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub edits: Vec<Edit>,
}

/// Read access to one box.
pub trait BoxClient {
    /// Fetch one performer and its edit log.
    ///
    /// # Errors
    ///
    /// [`ClientError::NotFound`] if the box has no such performer;
    /// transport/status/decode failures otherwise.
    fn fetch_performer(&self, id: &str) -> Result<PerformerRecord, ClientError>;

    /// Fetch every performer in the box. Used only for full cache reloads.
    ///
    /// # Errors
    ///
    /// Any per-page transport/status/decode failure aborts the fetch.
    fn fetch_all_performers(&self) -> Result<Vec<Performer>, ClientError>;

    /// Fetch all applied performer edits closed at or after `horizon`,
    /// returned oldest first. Implementations page newest-first and stop
    /// once a page's oldest edit precedes the horizon.
    ///
    /// # Errors
    ///
    /// Any per-page transport/status/decode failure aborts the fetch.
    fn fetch_edits_since(&self, horizon: DateTime<Utc>) -> Result<Vec<Edit>, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_flattens_performer_fields() {
        let json = r#"{
            "id": "p-1",
            "name": "Jane Doe",
            "deleted": false,
            "edits": [{
                "operation": "CREATE",
                "target": {"id": "p-1"},
                "closed": "2021-03-04T10:00:00Z",
                "applied": true,
                "details": {"name": "Jane Doe"}
            }]
        }"#;
        let record: PerformerRecord = serde_json::from_str(json).expect("deserialize");
        assert_eq!(record.performer.id, "p-1");
        assert_eq!(record.performer.name.as_deref(), Some("Jane Doe"));
        assert_eq!(record.edits.len(), 1);

        let back = serde_json::to_value(&record).expect("serialize");
        assert_eq!(back["id"], "p-1");
        assert!(back.get("performer").is_none(), "flattened, not nested");
    }

    #[test]
    fn record_without_edits_deserializes() {
        let record: PerformerRecord =
            serde_json::from_str(r#"{"id":"p-2","deleted":true}"#).expect("deserialize");
        assert!(record.edits.is_empty());
        assert!(record.performer.deleted);
    }
}
