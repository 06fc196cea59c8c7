//! Designpref - preference data tooling for design-suggestion models
//!
//! Command-line entry point: synthetic pair generation, DPO dataset export,
//! schema validation, keyword learning and dataset statistics.

mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cli::{export::ExportArgs, helpers::GlobalArgs, validate::FileKind};
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "designpref")]
#[command(
    about = "Reward shaping and preference-pair generation for design suggestions",
    long_about = None
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Pipeline configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Set log level
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Keyword store path (overrides DESIGNPREF_KEYWORDS and config)
    #[arg(long, global = true)]
    keywords: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate synthetic preference pairs from rule batches
    Generate {
        /// Rule batches (JSONL)
        #[arg(short, long)]
        rules: PathBuf,

        /// Output file (JSONL of DPO records)
        #[arg(short, long)]
        output: PathBuf,

        /// Comma-separated strategies (default: all)
        #[arg(short, long)]
        strategies: Option<String>,

        /// Treat all rules as one group
        #[arg(long)]
        no_grouping: bool,
    },

    /// Build a train/val/test DPO dataset from events and rules
    Export {
        /// Rule batches for synthetic pairs (JSONL)
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Interaction events for real pairs (JSONL)
        #[arg(long)]
        events: Option<PathBuf>,

        /// Snapshot sources, tried in order (directory or JSONL)
        #[arg(long, num_args = 1..)]
        snapshots: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Only export real pairs
        #[arg(long)]
        no_synthetic: bool,

        /// Shuffle seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Validate a rules or preferences file
    Validate {
        /// File to validate
        file: PathBuf,

        /// Kind of records in the file
        #[arg(short, long, value_enum)]
        kind: FileKind,
    },

    /// Learned keyword management
    Keywords {
        #[command(subcommand)]
        command: KeywordCommands,
    },

    /// Quality statistics for a DPO pairs file
    Stats {
        /// Pairs file (JSONL of DPO records)
        #[arg(short, long)]
        pairs: PathBuf,
    },
}

#[derive(Subcommand)]
enum KeywordCommands {
    /// Learn keywords from labelled rules and save the store
    Learn {
        /// Rule batches (JSONL)
        #[arg(short, long)]
        rules: PathBuf,
    },

    /// Show keywords for a platform
    Show {
        #[arg(short, long)]
        platform: String,

        /// Restrict to one dimension
        #[arg(short, long)]
        dimension: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let filter = EnvFilter::new(format!(
        "designpref={level},designpref_core={level}",
        level = level.as_str().to_lowercase()
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // Write logs to stderr, not stdout
        .init();

    debug!("designpref v{} starting...", env!("CARGO_PKG_VERSION"));

    let global = GlobalArgs {
        config: cli.config,
        keywords: cli.keywords,
    };

    match cli.command {
        Commands::Generate {
            rules,
            output,
            strategies,
            no_grouping,
        } => cli::generate::handle(&global, &rules, &output, strategies.as_deref(), no_grouping),
        Commands::Export {
            rules,
            events,
            snapshots,
            output_dir,
            no_synthetic,
            seed,
        } => cli::export::handle(
            &global,
            ExportArgs {
                rules,
                events,
                snapshots,
                output_dir,
                no_synthetic,
                seed,
            },
        ),
        Commands::Validate { file, kind } => cli::validate::handle(&file, kind),
        Commands::Keywords { command } => match command {
            KeywordCommands::Learn { rules } => cli::keywords::learn(&global, &rules),
            KeywordCommands::Show {
                platform,
                dimension,
            } => cli::keywords::show(&global, &platform, dimension.as_deref()),
        },
        Commands::Stats { pairs } => cli::stats::handle(&pairs),
    }
}
