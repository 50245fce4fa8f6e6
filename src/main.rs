//! Changegraph CLI entry point

use changegraph_core::{FileChange, ModeOverride};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "changegraph")]
#[command(about = "Split a changeset into dependency-aware atomic commits", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Repository root path (defaults to current directory)
    #[arg(short, long, global = true, default_value = ".")]
    root: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Group changed files into atomic commits
    Analyze {
        #[command(flatten)]
        input: ChangeInput,

        /// Force a mode instead of choosing by changeset size
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Glob of files to leave out (repeatable)
        #[arg(long = "exclude", value_name = "GLOB")]
        exclude: Vec<String>,

        /// Parse changed modules for imports, exports and API changes
        #[arg(long)]
        enhance: bool,

        /// Git revision whose exports are compared against the working tree
        #[arg(long, value_name = "REV")]
        baseline_ref: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the dependency graph of the given files
    Graph {
        #[command(flatten)]
        input: ChangeInput,

        /// Print the graph as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the files leaves-first, or the cycles that prevent it
    Order {
        #[command(flatten)]
        input: ChangeInput,
    },
    /// Show version
    Version,
}

#[derive(Args)]
struct ChangeInput {
    /// Changed files, relative to the root
    paths: Vec<String>,

    /// Read `git diff --name-status` output from FILE, or stdin for `-`
    #[arg(long, value_name = "FILE")]
    name_status: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Auto,
    Simple,
    Complex,
}

impl From<ModeArg> for ModeOverride {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Auto => ModeOverride::Auto,
            ModeArg::Simple => ModeOverride::Simple,
            ModeArg::Complex => ModeOverride::Complex,
        }
    }
}

fn read_input(root: &std::path::Path, input: ChangeInput) -> anyhow::Result<Vec<FileChange>> {
    commands::read_changes(root, input.paths, input.name_status.as_deref())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so `--json` output stays clean
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("changegraph={}", log_level)));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Changegraph v{}", env!("CARGO_PKG_VERSION"));
    tracing::debug!("Repository root: {}", cli.root.display());

    match cli.command {
        Commands::Analyze {
            input,
            mode,
            exclude,
            enhance,
            baseline_ref,
            json,
        } => {
            let changes = read_input(&cli.root, input)?;
            let overrides = config::Overrides {
                mode: mode.map(Into::into),
                exclude,
                enhance: enhance || baseline_ref.is_some(),
            };
            let options = overrides.apply(config::load(&cli.root)?);
            commands::analyze(&cli.root, &changes, &options, baseline_ref.as_deref(), json)
        }
        Commands::Graph { input, json } => {
            let changes = read_input(&cli.root, input)?;
            commands::graph(&cli.root, &changes, json)
        }
        Commands::Order { input } => {
            let changes = read_input(&cli.root, input)?;
            commands::order(&cli.root, &changes)
        }
        Commands::Version => {
            println!("Changegraph v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
