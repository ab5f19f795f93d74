//! `bxs timeline` — reconstruct and print one performer's state history.

use crate::config::Config;
use crate::http::HttpBoxClient;
use crate::output::{OutputMode, render};
use boxsync_core::client::BoxClient;
use boxsync_core::history::PerformerHistory;
use boxsync_core::model::Performer;
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

/// Arguments for `bxs timeline`.
#[derive(Args, Debug)]
pub struct TimelineArgs {
    /// Performer ID in the source box.
    pub id: String,

    /// Read from this box instead of the configured source.
    #[arg(long = "box")]
    pub box_name: Option<String>,
}

#[derive(Debug, Serialize)]
struct TimelineEntry {
    at: String,
    snapshot: Performer,
}

/// Report payload for `bxs timeline`.
#[derive(Debug, Serialize)]
pub struct TimelineReport {
    id: String,
    entries: Vec<TimelineEntry>,
    removed_aliases: Vec<String>,
    removed_image_ids: Vec<String>,
}

/// Execute `bxs timeline`.
pub fn run_timeline(args: &TimelineArgs, config: &Config, output: OutputMode) -> anyhow::Result<()> {
    let box_name = args.box_name.as_deref().unwrap_or(&config.source);
    let box_config = config.box_config(box_name)?;
    let client = HttpBoxClient::new(
        &box_config.endpoint,
        &box_config.api_key,
        Duration::from_secs(config.page_delay_secs),
    );
    let mapper = config.site_mapper()?;

    let record = client.fetch_performer(&args.id)?;
    let history = PerformerHistory::reconstruct(&record.performer, &record.edits, &mapper)?;

    let report = TimelineReport {
        id: args.id.clone(),
        entries: history
            .timeline
            .iter()
            .map(|(at, snapshot)| TimelineEntry {
                at: at.to_rfc3339(),
                snapshot: snapshot.clone(),
            })
            .collect(),
        removed_aliases: history.removed_aliases.iter().cloned().collect(),
        removed_image_ids: history.removed_image_ids.iter().cloned().collect(),
    };

    render(output, &report, |r, w| {
        for entry in &r.entries {
            let s = &entry.snapshot;
            writeln!(
                w,
                "{}  {:<24} aliases:{:<3} images:{:<3} urls:{}",
                entry.at,
                s.name.as_deref().unwrap_or("<unnamed>"),
                s.aliases.len(),
                s.images.len(),
                s.urls.len(),
            )?;
        }
        if !r.removed_aliases.is_empty() {
            writeln!(w, "ever removed aliases: {}", r.removed_aliases.join(", "))?;
        }
        writeln!(w, "{} states", r.entries.len())
    })
}
