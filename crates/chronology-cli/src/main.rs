mod cmd;
mod output;
mod root;
mod site;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, cron::CronSubcommand, events::EventsSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "chronology",
    about = "Schedule future actions against content and manage per-subject event queues",
    version,
    propagate_version = true
)]
struct Cli {
    /// Site root (default: auto-detect from .chronology/)
    #[arg(long, global = true, env = "CHRONOLOGY_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize chronology in the current site
    Init {
        /// Site name (default: directory name)
        #[arg(long)]
        name: Option<String>,
        /// Offset editors enter times in, e.g. +02:00
        #[arg(long)]
        utc_offset: Option<String>,
    },

    /// List the actions that may be scheduled for a subject
    Actions {
        id: u64,
        /// Subject type
        #[arg(long, default_value = "post")]
        kind: String,
    },

    /// Read and replace a subject's scheduled events
    Events {
        #[command(subcommand)]
        subcommand: EventsSubcommand,
    },

    /// Inspect and fire jobs held by the local timer
    Cron {
        #[command(subcommand)]
        subcommand: CronSubcommand,
    },

    /// Show or validate the site configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// List subject types that support scheduled events
    Types,
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Cron {
            subcommand: CronSubcommand::Run { .. },
        } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init { name, utc_offset } => {
            cmd::init::run(&root, name.as_deref(), utc_offset.as_deref())
        }
        Commands::Actions { id, kind } => cmd::actions::run(&root, id, &kind, cli.json),
        Commands::Events { subcommand } => cmd::events::run(&root, subcommand, cli.json),
        Commands::Cron { subcommand } => cmd::cron::run(&root, subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
        Commands::Types => cmd::types::run(&root, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
