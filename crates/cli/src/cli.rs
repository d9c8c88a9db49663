//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use contracts::SinkFailurePolicy;
use std::path::PathBuf;

/// fanout - copy standard input to several outputs at once
#[derive(Parser, Debug)]
#[command(
    name = "fanout",
    author,
    version,
    about = "Duplicate one byte stream into many sinks",
    long_about = "Reads a byte stream and writes every chunk to all configured sinks in lockstep.\n\n\
                  Without a configuration file it behaves like tee: standard input is copied \n\
                  to standard output and to every FILE given on the command line."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "FANOUT_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format (logs always go to stderr)
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "FANOUT_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log filter used when `RUST_LOG` is not set
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Copy the source into every sink
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Configuration file (TOML or JSON); without it, stdin is teed
    #[arg(short, long, env = "FANOUT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Extra files to write to, as with tee
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Append to FILEs instead of truncating them
    #[arg(short, long)]
    pub append: bool,

    /// Do not copy to standard output (tee mode only)
    #[arg(long)]
    pub no_stdout: bool,

    /// Reaction to a failed sink write (overrides the configuration)
    #[arg(long, value_enum, env = "FANOUT_ON_SINK_ERROR")]
    pub on_sink_error: Option<FailurePolicy>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "FANOUT_METRICS_PORT")]
    pub metrics_port: u16,

    /// Print the session report as JSON on stderr
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    pub fn metrics_port(&self) -> Option<u16> {
        (self.metrics_port != 0).then_some(self.metrics_port)
    }
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "fanout.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "fanout.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
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
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}

/// Sink failure policy as accepted on the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailurePolicy {
    /// End the session on the first failed write
    Abort,
    /// Drop the failed sink and keep going
    Detach,
}

impl From<FailurePolicy> for SinkFailurePolicy {
    fn from(policy: FailurePolicy) -> Self {
        match policy {
            FailurePolicy::Abort => SinkFailurePolicy::Abort,
            FailurePolicy::Detach => SinkFailurePolicy::Detach,
        }
    }
}
