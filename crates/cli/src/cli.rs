//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use contracts::ShutdownPolicy;
use std::path::PathBuf;

/// sortline - camera-driven sorting line
#[derive(Parser, Debug)]
#[command(
    name = "sortline",
    author,
    version,
    about = "Camera-driven sorting line",
    long_about = "Runs a sorting line: sensing workers read frames, detect items and decide,\n\
                  a dispatcher routes frames to the display and commands to the actuator."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "SORTLINE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "SORTLINE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the sorting line
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "sortline.toml", env = "SORTLINE_CONFIG")]
    pub config: PathBuf,

    /// Override the actuator with a device path (serial port, FIFO, file)
    #[arg(long, env = "SORTLINE_DEVICE")]
    pub device: Option<PathBuf>,

    /// Override the worker pacing in milliseconds
    #[arg(long, env = "SORTLINE_PACING_MS")]
    pub pacing_ms: Option<u64>,

    /// Override the shutdown policy
    #[arg(long, value_enum, env = "SORTLINE_SHUTDOWN_POLICY")]
    pub shutdown_policy: Option<PolicyArg>,

    /// Abort the line after this many seconds (0 = no limit)
    #[arg(long, default_value = "0", env = "SORTLINE_MAX_RUNTIME")]
    pub max_runtime: u64,

    /// Validate configuration and exit without running the line
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "SORTLINE_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "sortline.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "sortline.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show input, detector and decision of every source
    #[arg(long)]
    pub sources: bool,

    /// Show render and actuator configuration
    #[arg(long)]
    pub outputs: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

/// `--shutdown-policy` values
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolicyArg {
    /// Stop when the first source runs out of frames
    FirstFinished,
    /// Stop when every source has run out of frames
    AllFinished,
}

impl From<PolicyArg> for ShutdownPolicy {
    fn from(policy: PolicyArg) -> Self {
        match policy {
            PolicyArg::FirstFinished => Self::FirstFinished,
            PolicyArg::AllFinished => Self::AllFinished,
        }
    }
}
