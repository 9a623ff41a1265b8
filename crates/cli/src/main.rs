use anyhow::Result;
use clap::{Parser, Subcommand};

use flowdoc::commands::{
    analyze_command, detect_command, diagrams_command, list_sources_command, run_command,
    validate_command, AnalyzeOptions,
};
use flowdoc::init_tracing;

/// Source-file analyzer: structured units and flowchart diagrams.
///
/// This CLI is a thin wrapper around `flowdoc-core` (exposed in code as `flowdoc_core`).
/// All substantive logic lives in the library so it can be tested thoroughly
/// and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "flowdoc",
    version,
    about = "Turn a source file into structured units and flowchart diagrams",
    long_about = None
)]
struct Cli {
    /// Log at debug level (overrides RUST_LOG).
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// File selection and source options shared by `analyze` and `run`.
#[derive(clap::Args, Debug)]
struct TargetArgs {
    /// Directory the path is resolved against. Defaults to the current working directory.
    #[arg(long, default_value = ".")]
    root: String,

    /// File to analyze, relative to --root.
    #[arg(long)]
    path: String,

    /// Optional git ref recorded in the document.
    #[arg(long = "ref")]
    git_ref: Option<String>,

    /// Optional repository owner recorded in the document.
    #[arg(long)]
    owner: Option<String>,

    /// Optional repository name recorded in the document.
    #[arg(long)]
    repo: Option<String>,

    /// Unit source to use (see `flowdoc sources`). Overrides config and environment.
    #[arg(long)]
    source: Option<String>,

    /// Analyzer config file (.json, .yaml or .yml).
    #[arg(long)]
    config: Option<String>,
}

impl From<TargetArgs> for AnalyzeOptions {
    fn from(args: TargetArgs) -> Self {
        AnalyzeOptions {
            root: args.root,
            path: args.path,
            git_ref: args.git_ref,
            owner: args.owner,
            repo: args.repo,
            source: args.source,
            config: args.config,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect the language of a file from its extension and content.
    Detect {
        /// Path to the file.
        #[arg(long)]
        path: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long)]
        json: bool,
    },

    /// Analyze a file into a versioned analysis document.
    Analyze {
        #[command(flatten)]
        target: TargetArgs,

        /// Write the document here instead of printing it.
        #[arg(long)]
        out: Option<String>,
    },

    /// Render diagrams for every unit of an analysis document.
    Diagrams {
        /// Analysis document produced by `analyze`.
        #[arg(long)]
        input: String,

        /// Write diagrams.json and one .mmd file per unit into this directory.
        #[arg(long)]
        out_dir: Option<String>,

        /// Emit the bundle as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Analyze a file and write the document, diagrams and run metadata.
    Run {
        #[command(flatten)]
        target: TargetArgs,

        /// Output directory for this run.
        #[arg(long)]
        out_dir: String,
    },

    /// Validate an analysis document against the unit schemas.
    Validate {
        /// Analysis document to check.
        #[arg(long)]
        input: String,
    },

    /// List available unit sources.
    Sources {
        /// Emit JSON instead of human-readable text.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Detect { path, json } => detect_command(&path, json)?,
        Command::Analyze { target, out } => analyze_command(&target.into(), out.as_deref())?,
        Command::Diagrams { input, out_dir, json } => {
            diagrams_command(&input, out_dir.as_deref(), json)?
        }
        Command::Run { target, out_dir } => run_command(&target.into(), &out_dir)?,
        Command::Validate { input } => validate_command(&input)?,
        Command::Sources { json } => list_sources_command(json)?,
    }

    Ok(())
}
