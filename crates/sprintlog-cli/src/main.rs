#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use std::env;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "sprintlog: change history for project-board sprints",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (defaults to pretty on a TTY, text when piped).
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Record",
        about = "Record the current board export",
        long_about = "Diff the current board export against the sprint log and append the changes.",
        after_help = "EXAMPLES:\n    # Record a snapshot for the sprint named in SPRINT_NAME\n    sprintlog snapshot\n\n    # Preview without writing\n    sprintlog snapshot --sprint \"Sprint 7\" --dry-run"
    )]
    Snapshot(cmd::snapshot::SnapshotArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show the reconstructed board",
        long_about = "Replay the sprint log and print the board state it describes.",
        after_help = "EXAMPLES:\n    # Current state\n    sprintlog show --sprint \"Sprint 7\"\n\n    # State as of a point in time\n    sprintlog show --as-of 2026-01-06T12:00:00Z --format json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Read",
        about = "List recorded snapshots",
        long_about = "List every snapshot in the sprint log with its change counts."
    )]
    History(cmd::history::HistoryArgs),

    #[command(
        next_help_heading = "Read",
        about = "Summarize sprint estimates",
        long_about = "Sum the total and remaining estimate of the sprint's items.",
        after_help = "EXAMPLES:\n    # From the latest export\n    sprintlog burndown\n\n    # From the replayed log\n    sprintlog burndown --from-log"
    )]
    Burndown(cmd::burndown::BurndownArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("SPRINTLOG_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "sprintlog=debug,sprintlog_core=debug,info"
        } else {
            "sprintlog=info,sprintlog_core=info,warn"
        })
    });

    let format = env::var("SPRINTLOG_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let output = cli.output_mode();
    let result = env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|project_root| match &cli.command {
            Commands::Snapshot(args) => cmd::snapshot::run_snapshot(args, output, &project_root),
            Commands::Show(args) => cmd::show::run_show(args, output, &project_root),
            Commands::History(args) => cmd::history::run_history(args, output, &project_root),
            Commands::Burndown(args) => {
                cmd::burndown::run_burndown(args, output, &project_root)
            }
        });

    if let Err(err) = result {
        if render_error(output, &CliError::from_anyhow(&err)).is_err() {
            eprintln!("error: {err:#}");
        }
        std::process::exit(1);
    }
}
