use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "urlcompare",
    version,
    about = "Reconcile page impressions between two analytics exports"
)]
pub struct Cli {
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ingest both sources and report missing and differing paths.
    Compare(CompareArgs),
    /// List the accepted URL conventions with an example of each.
    Conventions,
    /// Print a commented example run configuration.
    SampleConfig,
}

#[derive(clap::Args, Debug, Default)]
pub struct CompareArgs {
    #[arg(long, default_value = crate::config::DEFAULT_CONFIG)]
    pub config: PathBuf,
    /// Replaces the file of the source at position 0.
    #[arg(long)]
    pub first: Option<PathBuf>,
    /// Replaces the file of the source at position 1.
    #[arg(long)]
    pub second: Option<PathBuf>,
    /// Compare paths without their file extension.
    #[arg(long = "no-extension", short = 'e', action = ArgAction::SetTrue)]
    pub no_extension: bool,
    #[arg(long = "abs-threshold")]
    pub abs_threshold: Option<i64>,
    /// Relative threshold as a fraction (0.01 = 1%).
    #[arg(long = "pct-threshold")]
    pub pct_threshold: Option<f64>,
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
    /// Fail when any missing or differing path is reported.
    #[arg(long, action = ArgAction::SetTrue)]
    pub strict: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Jsonl,
}
