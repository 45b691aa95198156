use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::report::{OutputFormat, ReportMode};

/// Command line interface definition for sprint-health.
#[derive(Parser, Debug)]
#[command(name = "sprint-health")]
#[command(about = "Analyze a Jira sprint snapshot for completion, hygiene and delivery risk")]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbosity")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Command selected by CLI parsing.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Analyze a sprint snapshot and print a report
    Analyze(AnalyzeArgs),
    /// Validate a settings file and print the effective guidelines
    CheckConfig(CheckConfigArgs),
    /// Print the guideline table (recommended values, or those of --config)
    Guidelines(GuidelinesArgs),
}

/// Options for analyzing a snapshot.
#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Sprint snapshot JSON file ("-" reads stdin)
    #[arg(value_name = "SNAPSHOT")]
    pub snapshot: PathBuf,

    /// Settings file (YAML or JSON); overrides SPRINT_HEALTH_CONFIG
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Report mode; overrides SPRINT_HEALTH_MODE
    #[arg(short, long, value_enum)]
    pub mode: Option<ReportMode>,

    /// Output format; overrides SPRINT_HEALTH_FORMAT
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Analysis timestamp (RFC 3339 or YYYY-MM-DD); defaults to now
    #[arg(long, value_name = "WHEN")]
    pub as_of: Option<String>,

    /// Write the report here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Options for validating a settings file.
#[derive(Args, Debug, Clone)]
pub struct CheckConfigArgs {
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,
}

/// Options for printing the guideline table.
#[derive(Args, Debug, Clone)]
pub struct GuidelinesArgs {
    /// Settings file whose guidelines to show; overrides SPRINT_HEALTH_CONFIG
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}
