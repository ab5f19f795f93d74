//! `bxs stats` — link statistics over the cached target box.

use crate::config::Config;
use crate::output::{OutputMode, kv, render};
use anyhow::Context;
use boxsync_core::cache::CacheStore;
use clap::Args;
use serde::Serialize;

/// Arguments for `bxs stats`.
#[derive(Args, Debug, Default)]
pub struct StatsArgs {}

/// Report payload for `bxs stats`.
#[derive(Debug, Serialize)]
pub struct StatsReport {
    box_name: String,
    as_of: String,
    performers: usize,
    deleted: usize,
    linked_to_source: usize,
    single_source_link: usize,
    multi_source_link: usize,
}

/// Execute `bxs stats`. Reads the persisted cache only; never touches the
/// network.
pub fn run_stats(_args: &StatsArgs, config: &Config, output: OutputMode) -> anyhow::Result<()> {
    let source_url = &config.box_config(&config.source)?.url;
    let store = CacheStore::new(config.cache_dir());
    let cache = store
        .load(&config.target)
        .context("loading target cache")?;

    let mut report = StatsReport {
        box_name: config.target.clone(),
        as_of: cache.as_of.to_rfc3339(),
        performers: cache.len(),
        deleted: 0,
        linked_to_source: 0,
        single_source_link: 0,
        multi_source_link: 0,
    };
    for p in cache.performers() {
        if p.deleted {
            report.deleted += 1;
        }
        let links = p
            .urls
            .iter()
            .filter(|u| u.url.starts_with(source_url))
            .count();
        match links {
            0 => {}
            1 => {
                report.linked_to_source += 1;
                report.single_source_link += 1;
            }
            _ => {
                report.linked_to_source += 1;
                report.multi_source_link += 1;
            }
        }
    }

    render(output, &report, |r, w| {
        kv(w, "box", &r.box_name)?;
        kv(w, "as of", &r.as_of)?;
        kv(w, "performers", r.performers.to_string())?;
        kv(w, "deleted", r.deleted.to_string())?;
        kv(w, "linked to source", r.linked_to_source.to_string())?;
        kv(w, "exactly one link", r.single_source_link.to_string())?;
        kv(w, "multiple links", r.multi_source_link.to_string())
    })
}
