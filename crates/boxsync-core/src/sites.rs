//! Translating box-local site IDs between boxes.
//!
//! Each box assigns its own UUID to every external site it links to. A
//! mapping file (CSV, one column per box name, one row per site) records
//! which IDs refer to the same site, so URLs can be carried from one box to
//! another. A URL whose site has no destination column entry cannot be
//! represented in the destination box and is dropped.

use crate::model::PerformerUrl;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading a site mapping file.
#[derive(Debug, Error)]
pub enum SiteMapError {
    #[error("failed to read site map: {0}")]
    Csv(#[from] csv::Error),
    #[error("site map has no column for box '{box_name}'")]
    MissingColumn { box_name: String },
}

/// A directed site-ID translation table from one box to another.
#[derive(Debug, Clone, Default)]
pub struct SiteMapper {
    /// Source site ID -> destination site ID. Only complete pairs are kept.
    map: HashMap<String, String>,
}

impl SiteMapper {
    /// A mapper with no entries: every URL is untranslatable.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a mapper from `(source_site_id, destination_site_id)` pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        Self {
            map: pairs
                .into_iter()
                .map(|(src, dst)| (src.into(), dst.into()))
                .collect(),
        }
    }

    /// Load the mapping between two named boxes from a CSV file.
    ///
    /// The file has a header row of box names and one row per site. Rows
    /// where either box's cell is empty are skipped: that site is unknown to
    /// one side and nothing can be translated through it.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or parsed, or if a named box has no
    /// column in the header.
    pub fn from_csv(
        path: impl AsRef<Path>,
        source_box: &str,
        destination_box: &str,
    ) -> Result<Self, SiteMapError> {
        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader.headers()?.clone();
        let column = |box_name: &str| {
            headers
                .iter()
                .position(|h| h == box_name)
                .ok_or_else(|| SiteMapError::MissingColumn {
                    box_name: box_name.to_string(),
                })
        };
        let src_col = column(source_box)?;
        let dst_col = column(destination_box)?;

        let mut map = HashMap::new();
        for record in reader.records() {
            let record = record?;
            let src = record.get(src_col).unwrap_or_default();
            let dst = record.get(dst_col).unwrap_or_default();
            if !src.is_empty() && !dst.is_empty() {
                map.insert(src.to_string(), dst.to_string());
            }
        }
        tracing::debug!(
            entries = map.len(),
            source = source_box,
            destination = destination_box,
            "loaded site map"
        );
        Ok(Self { map })
    }

    /// Whether a source site ID has a counterpart in the destination box.
    #[must_use]
    pub fn has_mapping(&self, source_site_id: &str) -> bool {
        self.map.contains_key(source_site_id)
    }

    /// The destination box's ID for a source site, if mapped.
    #[must_use]
    pub fn map_site(&self, source_site_id: &str) -> Option<&str> {
        self.map.get(source_site_id).map(String::as_str)
    }

    /// Translate a URL's site tag into the destination box's ID space.
    /// Returns `None` when the site is unmapped; such URLs are dropped.
    #[must_use]
    pub fn map_url(&self, url: &PerformerUrl) -> Option<PerformerUrl> {
        self.map_site(&url.site_id).map(|site_id| PerformerUrl {
            url: url.url.clone(),
            site_id: site_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_csv() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "site,alpha,beta").unwrap();
        writeln!(file, "links-example,a-111,b-111").unwrap();
        writeln!(file, "only-alpha,a-222,").unwrap();
        writeln!(file, "only-beta,,b-333").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn loads_complete_pairs_only() {
        let file = sample_csv();
        let mapper = SiteMapper::from_csv(file.path(), "alpha", "beta").unwrap();
        assert!(mapper.has_mapping("a-111"));
        assert_eq!(mapper.map_site("a-111"), Some("b-111"));
        assert!(!mapper.has_mapping("a-222"), "empty destination cell");
        assert!(!mapper.has_mapping("b-333"), "keys are source-side IDs");
    }

    #[test]
    fn direction_matters() {
        let file = sample_csv();
        let reverse = SiteMapper::from_csv(file.path(), "beta", "alpha").unwrap();
        assert!(reverse.has_mapping("b-111"));
        assert!(!reverse.has_mapping("a-111"));
    }

    #[test]
    fn missing_column_is_an_error() {
        let file = sample_csv();
        let err = SiteMapper::from_csv(file.path(), "alpha", "gamma").unwrap_err();
        assert!(matches!(err, SiteMapError::MissingColumn { box_name } if box_name == "gamma"));
    }

    #[test]
    fn map_url_translates_or_drops() {
        let mapper = SiteMapper::from_pairs([("a-111", "b-111")]);
        let mapped = mapper
            .map_url(&PerformerUrl {
                url: "https://links.example/p/1".into(),
                site_id: "a-111".into(),
            })
            .unwrap();
        assert_eq!(mapped.site_id, "b-111");
        assert_eq!(mapped.url, "https://links.example/p/1");

        assert!(
            mapper
                .map_url(&PerformerUrl {
                    url: "https://other.example/p/1".into(),
                    site_id: "unmapped".into(),
                })
                .is_none()
        );
    }

    #[test]
    fn empty_mapper_maps_nothing() {
        assert!(!SiteMapper::empty().has_mapping("anything"));
    }
}
