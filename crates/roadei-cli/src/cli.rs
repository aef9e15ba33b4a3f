//! CLI argument definitions for the road emissions inventory pipeline.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "roadei",
    version,
    about = "On-road emissions inventory post-processor",
    long_about = "Turn modeled on-road activity and emission rates into detailed,\n\
                  aggregated, and CERS reporting outputs for one scenario.\n\n\
                  A TOML run file selects the area, year, season, day type,\n\
                  counties, inventories, and the stages to run."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the pipeline for the scenario of a run file.
    Run(RunArgs),

    /// List the aggregation views and their grouping keys.
    Views(ViewsArgs),

    /// Resolve a run file and check its inputs without processing data.
    CheckConfig(CheckConfigArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// Path to the TOML run file.
    #[arg(value_name = "RUN_FILE")]
    pub run_file: PathBuf,

    /// Output directory (overrides `run.output_dir`).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Read the detailed tables back from the output directory instead of
    /// generating them.
    #[arg(long = "reuse-detailed")]
    pub reuse_detailed: bool,

    /// Skip the aggregate workbook.
    #[arg(long = "no-aggregate")]
    pub no_aggregate: bool,

    /// Skip the staging table and the reporting document.
    #[arg(long = "no-xml")]
    pub no_xml: bool,
}

#[derive(Parser)]
pub struct ViewsArgs {
    /// Run file whose `[[views]]` to list (built-in views when omitted).
    #[arg(value_name = "RUN_FILE")]
    pub run_file: Option<PathBuf>,
}

#[derive(Parser)]
pub struct CheckConfigArgs {
    /// Path to the TOML run file.
    #[arg(value_name = "RUN_FILE")]
    pub run_file: PathBuf,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
