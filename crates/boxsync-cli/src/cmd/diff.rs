//! `bxs diff` — compare a source performer against a target performer and
//! print the drift codes.

use crate::config::Config;
use crate::http::HttpBoxClient;
use crate::output::{OutputMode, render};
use boxsync_core::client::BoxClient;
use boxsync_core::compare::{self, DiffCode};
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

/// Arguments for `bxs diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Performer ID in the source box.
    pub source_id: String,
    /// Performer ID in the target box.
    pub target_id: String,
}

/// Report payload for `bxs diff`.
#[derive(Debug, Serialize)]
pub struct DiffReport {
    source_id: String,
    target_id: String,
    codes: Vec<DiffCode>,
    identical: bool,
}

/// Execute `bxs diff`.
pub fn run_diff(args: &DiffArgs, config: &Config, output: OutputMode) -> anyhow::Result<()> {
    let delay = Duration::from_secs(config.page_delay_secs);
    let source_box = config.box_config(&config.source)?;
    let target_box = config.box_config(&config.target)?;
    let source = HttpBoxClient::new(&source_box.endpoint, &source_box.api_key, delay)
        .fetch_performer(&args.source_id)?;
    let target = HttpBoxClient::new(&target_box.endpoint, &target_box.api_key, delay)
        .fetch_performer(&args.target_id)?;

    let codes = compare::compare(&source.performer, &target.performer);
    let report = DiffReport {
        source_id: args.source_id.clone(),
        target_id: args.target_id.clone(),
        identical: codes.contains(&DiffCode::Identical),
        codes: codes.into_iter().collect(),
    };
    render(output, &report, |r, w| {
        if r.identical {
            writeln!(w, "identical")
        } else {
            for code in &r.codes {
                writeln!(w, "{code}")?;
            }
            Ok(())
        }
    })
}
