//! `bxs update` — the governing workflow: refresh the target cache, pick
//! candidate performers, reconstruct each one's source history, and report
//! which copies are safe to bring up to date.

use crate::config::Config;
use crate::http::HttpBoxClient;
use crate::output::{OutputMode, kv, render};
use anyhow::Context;
use boxsync_core::cache::{CacheManager, CacheStore};
use boxsync_core::client::BoxClient;
use boxsync_core::history::{self, PerformerHistory};
use boxsync_core::model::Performer;
use boxsync_core::sync::{self, SyncDecision};
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

/// Arguments for `bxs update`.
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Evaluate at most this many candidates.
    #[arg(long)]
    pub limit: Option<usize>,

    /// Write a CSV report of every evaluated performer to this path.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Target cache is fresh below this age.
    #[arg(long, default_value_t = 24)]
    pub max_age_hours: i64,

    /// Target cache is discarded and fully reloaded beyond this age.
    #[arg(long, default_value_t = 7)]
    pub hard_reload_days: i64,
}

#[derive(Debug, Serialize)]
struct Evaluated {
    name: String,
    target_id: String,
    source_id: String,
    outcome: &'static str,
}

/// Report payload for `bxs update`.
#[derive(Debug, Serialize)]
pub struct UpdateReport {
    candidates: usize,
    up_to_date: usize,
    safe_to_update: usize,
    manual_drift: usize,
    nothing_new: usize,
    failed: usize,
    performers: Vec<Evaluated>,
}

/// A target-box performer linked to exactly one source performer.
fn candidate_source_id(performer: &Performer, source_url_prefix: &str) -> Option<String> {
    let mut links = performer
        .urls
        .iter()
        .filter(|u| u.url.starts_with(source_url_prefix));
    let first = links.next()?;
    if links.next().is_some() {
        // Ambiguous: linked to several source performers, a human must sort
        // that out.
        return None;
    }
    let id = first.url.rsplit('/').next()?;
    (!id.is_empty()).then(|| id.to_string())
}

/// Execute `bxs update`.
///
/// Per-performer failures are logged and counted, never fatal; the exit
/// status reflects whether the scan itself completed.
pub fn run_update(args: &UpdateArgs, config: &Config, output: OutputMode) -> anyhow::Result<()> {
    let mapper = config.site_mapper()?;
    let source_box = config.box_config(&config.source)?;
    let target_box = config.box_config(&config.target)?;
    let delay = Duration::from_secs(config.page_delay_secs);
    let source_client = HttpBoxClient::new(&source_box.endpoint, &source_box.api_key, delay);
    let target_client = HttpBoxClient::new(&target_box.endpoint, &target_box.api_key, delay);

    let store = CacheStore::new(config.cache_dir());
    let mut manager = CacheManager::with_store(target_client, store, &config.target)
        .context("loading target cache")?;
    manager
        .refresh(args.max_age_hours, args.hard_reload_days)
        .context("refreshing target cache")?;
    let cache = manager.cache();

    let candidates: Vec<(&Performer, String)> = cache
        .performers()
        .filter(|p| !p.deleted)
        .filter_map(|p| candidate_source_id(p, &source_box.url).map(|id| (p, id)))
        .take(args.limit.unwrap_or(usize::MAX))
        .collect();
    tracing::info!(
        total = cache.len(),
        candidates = candidates.len(),
        "evaluating candidates"
    );

    let mut report = UpdateReport {
        candidates: candidates.len(),
        up_to_date: 0,
        safe_to_update: 0,
        manual_drift: 0,
        nothing_new: 0,
        failed: 0,
        performers: Vec::new(),
    };

    for (target, source_id) in candidates {
        let name = target.name.clone().unwrap_or_default();
        let outcome = match evaluate_one(&source_client, &mapper, target, &source_id) {
            Ok(decision) => {
                match decision {
                    SyncDecision::UpToDate => report.up_to_date += 1,
                    SyncDecision::SafeToUpdate(_) => report.safe_to_update += 1,
                    SyncDecision::ManualDrift(_) => report.manual_drift += 1,
                    SyncDecision::NothingNew => report.nothing_new += 1,
                }
                decision.label()
            }
            Err(e) => {
                tracing::warn!(performer = %name, source_id, error = %e, "evaluation failed");
                report.failed += 1;
                "error"
            }
        };
        report.performers.push(Evaluated {
            name,
            target_id: target.id.clone(),
            source_id,
            outcome,
        });
    }

    if let Some(path) = &args.output {
        write_csv_report(path, &report.performers)
            .with_context(|| format!("writing report to {}", path.display()))?;
    }

    render(output, &report, |r, w| {
        for p in &r.performers {
            writeln!(w, "{:<18} {} ({})", p.outcome, p.name, p.source_id)?;
        }
        kv(w, "candidates", r.candidates.to_string())?;
        kv(w, "up to date", r.up_to_date.to_string())?;
        kv(w, "safe to update", r.safe_to_update.to_string())?;
        kv(w, "manual drift", r.manual_drift.to_string())?;
        kv(w, "nothing new", r.nothing_new.to_string())?;
        kv(w, "failed", r.failed.to_string())
    })
}

fn evaluate_one(
    source: &impl BoxClient,
    mapper: &boxsync_core::sites::SiteMapper,
    target: &Performer,
    source_id: &str,
) -> anyhow::Result<SyncDecision> {
    let record = source.fetch_performer(source_id)?;
    let history = PerformerHistory::reconstruct(&record.performer, &record.edits, mapper)?;
    let updated_at = target.updated.or(target.created).unwrap_or_else(history::dawn);
    Ok(sync::evaluate(&history, target, updated_at))
}

fn write_csv_report(path: &std::path::Path, rows: &[Evaluated]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["name", "target_id", "source_id", "outcome"])?;
    for row in rows {
        writer.write_record([&row.name, &row.target_id, &row.source_id, row.outcome])?;
    }
    writer.flush()?;
    Ok(())
}
