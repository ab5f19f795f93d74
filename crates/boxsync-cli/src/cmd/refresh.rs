//! `bxs refresh` — bring a box's snapshot cache up to date and persist it.

use crate::config::Config;
use crate::http::HttpBoxClient;
use crate::output::{OutputMode, kv, render};
use anyhow::Context;
use boxsync_core::cache::{CacheManager, CacheStore, RefreshOutcome};
use clap::Args;
use serde::Serialize;
use std::time::Duration;

/// Arguments for `bxs refresh`.
#[derive(Args, Debug)]
pub struct RefreshArgs {
    /// Box to refresh; defaults to the configured target.
    #[arg(long = "box")]
    pub box_name: Option<String>,

    /// Cache is fresh below this age; no network calls happen.
    #[arg(long, default_value_t = 24)]
    pub max_age_hours: i64,

    /// Cache is discarded and fully reloaded beyond this age.
    #[arg(long, default_value_t = 7)]
    pub hard_reload_days: i64,
}

/// Report payload for `bxs refresh`.
#[derive(Debug, Serialize)]
pub struct RefreshReport {
    box_name: String,
    action: &'static str,
    entries: usize,
    as_of: String,
}

/// Execute `bxs refresh`.
pub fn run_refresh(args: &RefreshArgs, config: &Config, output: OutputMode) -> anyhow::Result<()> {
    let box_name = args.box_name.as_deref().unwrap_or(&config.target);
    let box_config = config.box_config(box_name)?;
    let client = HttpBoxClient::new(
        &box_config.endpoint,
        &box_config.api_key,
        Duration::from_secs(config.page_delay_secs),
    );
    let store = CacheStore::new(config.cache_dir());
    let mut manager =
        CacheManager::with_store(client, store, box_name).context("loading cache")?;
    let outcome = manager
        .refresh(args.max_age_hours, args.hard_reload_days)
        .with_context(|| format!("refreshing cache for {box_name}"))?;

    let action = match outcome {
        RefreshOutcome::Fresh => "fresh",
        RefreshOutcome::FullReload { .. } => "full-reload",
        RefreshOutcome::Incremental { .. } => "incremental",
    };
    let report = RefreshReport {
        box_name: box_name.to_string(),
        action,
        entries: manager.cache().len(),
        as_of: manager.cache().as_of.to_rfc3339(),
    };
    render(output, &report, |r, w| {
        kv(w, "box", &r.box_name)?;
        kv(w, "action", r.action)?;
        kv(w, "entries", r.entries.to_string())?;
        kv(w, "as of", &r.as_of)
    })
}
