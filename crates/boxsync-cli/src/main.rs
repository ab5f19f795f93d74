#![forbid(unsafe_code)]

mod cmd;
mod config;
mod http;
mod output;

use clap::{Parser, Subcommand};
use config::Config;
use output::OutputMode;
use std::env;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "boxsync: mirrors performer records between crowd-edited metadata boxes",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Path to the config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Evaluate which target-box copies can be safely updated",
        after_help = "EXAMPLES:\n    # Evaluate every candidate and write a CSV report\n    bxs update --output report.csv\n\n    # Only the first 50 candidates\n    bxs update --limit 50"
    )]
    Update(cmd::update::UpdateArgs),

    #[command(
        about = "Bring a box's snapshot cache up to date",
        after_help = "EXAMPLES:\n    # Refresh the target box cache\n    bxs refresh\n\n    # Force a full reload\n    bxs refresh --hard-reload-days 0"
    )]
    Refresh(cmd::refresh::RefreshArgs),

    #[command(
        about = "Print a performer's reconstructed state history",
        after_help = "EXAMPLES:\n    bxs timeline 1a2b3c\n    bxs timeline 1a2b3c --json"
    )]
    Timeline(cmd::timeline::TimelineArgs),

    #[command(
        about = "Print the drift codes between two performers",
        after_help = "EXAMPLES:\n    bxs diff <source-id> <target-id>"
    )]
    Diff(cmd::diff::DiffArgs),

    #[command(
        about = "Link statistics over the cached target box",
        after_help = "EXAMPLES:\n    bxs stats --json"
    )]
    Stats(cmd::stats::StatsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("BOXSYNC_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "boxsync=debug,info"
        } else {
            "boxsync=info,warn"
        })
    });

    let format = env::var("BOXSYNC_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry.with(fmt::layer().json().with_ansi(false)).init();
        }
        _ => {
            registry.with(fmt::layer().compact()).init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let config = Config::load(cli.config.as_deref())?;
    let output = cli.output_mode();

    match cli.command {
        Commands::Update(ref args) => cmd::update::run_update(args, &config, output),
        Commands::Refresh(ref args) => cmd::refresh::run_refresh(args, &config, output),
        Commands::Timeline(ref args) => cmd::timeline::run_timeline(args, &config, output),
        Commands::Diff(ref args) => cmd::diff::run_diff(args, &config, output),
        Commands::Stats(ref args) => cmd::stats::run_stats(args, &config, output),
    }
}
