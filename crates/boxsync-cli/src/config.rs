//! TOML configuration: which boxes exist, which pair to sync, where state
//! lives on disk.
//!
//! Default location is `<config dir>/boxsync/config.toml`, overridable with
//! `--config`. A minimal file looks like:
//!
//! ```toml
//! source = "alpha"
//! target = "beta"
//! site_map = "site_ids_map.csv"
//!
//! [boxes.alpha]
//! url = "https://alpha.example/"
//! endpoint = "https://alpha.example/graphql"
//! api_key = "..."
//!
//! [boxes.beta]
//! url = "https://beta.example/"
//! endpoint = "https://beta.example/graphql"
//! api_key = "..."
//! ```

use anyhow::{Context, bail};
use boxsync_core::sites::SiteMapper;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

fn default_page_delay_secs() -> u64 {
    5
}

/// One box's connection details.
#[derive(Debug, Clone, Deserialize)]
pub struct BoxConfig {
    /// Public web URL prefix, used to recognize links pointing at this box.
    pub url: String,
    /// GraphQL endpoint.
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Box to read histories from.
    pub source: String,
    /// Box whose copies get evaluated and updated.
    pub target: String,
    /// Directory for persisted snapshot caches. Defaults to the platform
    /// cache dir.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    /// CSV table mapping site IDs between boxes. Without it every URL is
    /// treated as untranslatable.
    #[serde(default)]
    pub site_map: Option<PathBuf>,
    /// Pause between paginated fetches, to avoid overloading the boxes.
    #[serde(default = "default_page_delay_secs")]
    pub page_delay_secs: u64,
    pub boxes: BTreeMap<String, BoxConfig>,
}

impl Config {
    /// Load from `path`, or from the default location when `None`.
    ///
    /// # Errors
    ///
    /// Fails on missing/unreadable files, TOML errors, or when `source`/
    /// `target` name boxes that have no `[boxes.*]` section.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_path().context("cannot determine config directory")?,
        };
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("parsing {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        for name in [&self.source, &self.target] {
            if !self.boxes.contains_key(name) {
                bail!("config names box '{name}' but has no [boxes.{name}] section");
            }
        }
        if self.source == self.target {
            bail!("source and target must be different boxes");
        }
        Ok(())
    }

    /// Connection details for a named box.
    ///
    /// # Errors
    ///
    /// Fails when the box has no config section.
    pub fn box_config(&self, name: &str) -> anyhow::Result<&BoxConfig> {
        self.boxes
            .get(name)
            .with_context(|| format!("no [boxes.{name}] section in config"))
    }

    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("boxsync")
        })
    }

    /// Build the source-to-target site mapper. No configured table means an
    /// empty mapper: URL-only edits become invisible, everything else works.
    ///
    /// # Errors
    ///
    /// Fails when a configured table is unreadable or lacks the box columns.
    pub fn site_mapper(&self) -> anyhow::Result<SiteMapper> {
        match &self.site_map {
            Some(path) => SiteMapper::from_csv(path, &self.source, &self.target)
                .with_context(|| format!("loading site map from {}", path.display())),
            None => {
                tracing::warn!("no site_map configured; all URLs treated as unmapped");
                Ok(SiteMapper::empty())
            }
        }
    }
}

fn default_path() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join("boxsync").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
source = "alpha"
target = "beta"

[boxes.alpha]
url = "https://alpha.example/"
endpoint = "https://alpha.example/graphql"
api_key = "key-a"

[boxes.beta]
url = "https://beta.example/"
endpoint = "https://beta.example/graphql"
api_key = "key-b"
"#;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn parses_minimal_config_with_defaults() {
        let file = write_config(SAMPLE);
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.source, "alpha");
        assert_eq!(config.page_delay_secs, 5);
        assert!(config.site_map.is_none());
        assert_eq!(config.box_config("beta").unwrap().api_key, "key-b");
    }

    #[test]
    fn rejects_unknown_source_box() {
        let file = write_config(&SAMPLE.replace("source = \"alpha\"", "source = \"gamma\""));
        assert!(Config::load(Some(file.path())).is_err());
    }

    #[test]
    fn rejects_source_equal_to_target() {
        let file = write_config(&SAMPLE.replace("target = \"beta\"", "target = \"alpha\""));
        assert!(Config::load(Some(file.path())).is_err());
    }

    #[test]
    fn unknown_box_lookup_is_an_error() {
        let file = write_config(SAMPLE);
        let config = Config::load(Some(file.path())).unwrap();
        assert!(config.box_config("gamma").is_err());
    }
}
