//! `BoxClient` over HTTP: minimal GraphQL calls against a box endpoint.
//!
//! Boxes are community-run and rate-limited; paginated fetches pause between
//! pages and page size is fixed at 100, matching what the box operators
//! tolerate from bots.

use boxsync_core::client::{BoxClient, ClientError, PerformerRecord};
use boxsync_core::edit::Edit;
use boxsync_core::model::Performer;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::thread;
use std::time::Duration;

const PAGE_SIZE: u32 = 100;

const PERFORMER_FIELDS: &str = r"
  id
  name
  disambiguation
  gender
  ethnicity
  country
  eye_color
  hair_color
  birth_date
  height
  cup_size
  band_size
  waist_size
  hip_size
  breast_type
  career_start_year
  career_end_year
  aliases
  tattoos { location description }
  piercings { location description }
  images { id url }
  urls { url site { id } }
  created
  updated
  deleted
  merged_ids
";

const EDIT_FIELDS: &str = r"
  operation
  closed
  applied
  target { ... on Performer { id created } }
  details { ... on PerformerEdit {
    name disambiguation gender ethnicity country eye_color hair_color
    birth_date height cup_size band_size waist_size hip_size breast_type
    career_start_year career_end_year
    added_aliases removed_aliases
    added_tattoos { location description } removed_tattoos { location description }
    added_piercings { location description } removed_piercings { location description }
    added_images { id url } removed_images { id url }
    added_urls { url site { id } } removed_urls { url site { id } }
  } }
  old_details { ... on PerformerEdit {
    name disambiguation gender ethnicity country eye_color hair_color
    birth_date height cup_size band_size waist_size hip_size breast_type
    career_start_year career_end_year
  } }
  merge_sources { ... on Performer { id created } }
";

fn find_performer_query() -> String {
    format!(
        "query FindPerformer($input: ID!) {{ findPerformer(id: $input) {{ {PERFORMER_FIELDS} edits {{ {EDIT_FIELDS} }} }} }}"
    )
}

fn query_performers_query() -> String {
    format!(
        "query QueryPerformers($input: PerformerQueryInput!) {{ queryPerformers(input: $input) {{ count performers {{ {PERFORMER_FIELDS} }} }} }}"
    )
}

fn query_edits_query() -> String {
    format!(
        "query QueryEdits($input: EditQueryInput!) {{ queryEdits(input: $input) {{ count edits {{ {EDIT_FIELDS} }} }} }}"
    )
}

#[derive(Deserialize)]
struct GqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GqlError>,
}

#[derive(Deserialize)]
struct GqlError {
    message: String,
}

#[derive(Deserialize)]
struct FindPerformerData {
    #[serde(rename = "findPerformer")]
    find_performer: Option<PerformerRecord>,
}

#[derive(Deserialize)]
struct QueryPerformersData {
    #[serde(rename = "queryPerformers")]
    query_performers: PerformerPage,
}

#[derive(Deserialize)]
struct QueryEditsData {
    #[serde(rename = "queryEdits")]
    query_edits: EditPage,
}

#[derive(Deserialize)]
struct PerformerPage {
    count: u32,
    performers: Vec<Performer>,
}

#[derive(Deserialize)]
struct EditPage {
    count: u32,
    edits: Vec<Edit>,
}

/// A [`BoxClient`] talking GraphQL to one box over `ureq`.
pub struct HttpBoxClient {
    agent: ureq::Agent,
    endpoint: String,
    api_key: String,
    page_delay: Duration,
}

impl HttpBoxClient {
    #[must_use]
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, page_delay: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(60))
            .build();
        Self {
            agent,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            page_delay,
        }
    }

    fn post<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, ClientError> {
        let response = self
            .agent
            .post(&self.endpoint)
            .set("ApiKey", &self.api_key)
            .send_json(serde_json::json!({ "query": query, "variables": variables }));
        let response = match response {
            Ok(r) => r,
            Err(ureq::Error::Status(status, _)) => return Err(ClientError::Status { status }),
            Err(e) => return Err(ClientError::Transport(e.to_string())),
        };
        let body = response
            .into_string()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let envelope: GqlResponse<T> = serde_json::from_str(&body)?;
        if let Some(err) = envelope.errors.first() {
            return Err(ClientError::Api(err.message.clone()));
        }
        envelope
            .data
            .ok_or_else(|| ClientError::Api("response carried no data".into()))
    }

    fn pause_between_pages(&self) {
        thread::sleep(self.page_delay);
    }
}

impl BoxClient for HttpBoxClient {
    fn fetch_performer(&self, id: &str) -> Result<PerformerRecord, ClientError> {
        let data: FindPerformerData = self.post(
            &find_performer_query(),
            serde_json::json!({ "input": id }),
        )?;
        data.find_performer
            .ok_or_else(|| ClientError::NotFound { id: id.to_string() })
    }

    fn fetch_all_performers(&self) -> Result<Vec<Performer>, ClientError> {
        let query = query_performers_query();
        let mut page = 1u32;
        let mut performers = Vec::new();
        loop {
            let data: QueryPerformersData = self.post(
                &query,
                serde_json::json!({ "input": { "page": page, "per_page": PAGE_SIZE } }),
            )?;
            let total_pages = data.query_performers.count.div_ceil(PAGE_SIZE);
            performers.extend(data.query_performers.performers);
            tracing::info!(page, total_pages, "fetched performer page");
            if page >= total_pages {
                break;
            }
            page += 1;
            self.pause_between_pages();
        }
        Ok(performers)
    }

    fn fetch_edits_since(&self, horizon: DateTime<Utc>) -> Result<Vec<Edit>, ClientError> {
        let query = query_edits_query();
        let mut page = 1u32;
        let mut collected = Vec::new();
        loop {
            let data: QueryEditsData = self.post(
                &query,
                serde_json::json!({ "input": {
                    "applied": true,
                    "target_type": "PERFORMER",
                    "page": page,
                    "per_page": PAGE_SIZE,
                } }),
            )?;
            let total_pages = data.query_edits.count.div_ceil(PAGE_SIZE);
            // Pages arrive newest-first; once a page's oldest edit precedes
            // the horizon we have everything we need.
            let oldest = data.query_edits.edits.iter().map(|e| e.closed).min();
            collected.extend(
                data.query_edits
                    .edits
                    .into_iter()
                    .filter(|e| e.closed >= horizon),
            );
            tracing::info!(page, total_pages, "fetched edit page");
            if page >= total_pages || oldest.is_none_or(|o| o < horizon) {
                break;
            }
            page += 1;
            self.pause_between_pages();
        }
        collected.sort_by_key(|e| e.closed);
        Ok(collected)
    }
}
