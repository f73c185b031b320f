// pii-sanitizer/src/cli.rs
//! Command-line interface definition for the `pii-sanitizer` binary.
//! License: MIT OR Apache-2.0

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "pii-sanitizer",
    version = env!("CARGO_PKG_VERSION"),
    about = "Sanitize text with a PII rule snapshot",
    long_about = "Runs the PII Sanitizer rule engine headless: rewrites text with an ordered list of find/replace rules exactly as the in-page engine would, reports where the caret lands, and validates rule snapshots before they are shipped to the settings store.",
    arg_required_else_help = true
)]
pub struct Cli {
    /// Disable informational messages
    #[arg(long, short = 'q', global = true, help = "Suppress all informational and debug messages.")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, short = 'd', global = true, help = "Enable debug logging.")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sanitizes an input file or stdin.
    #[command(about = "Sanitizes an input file or stdin with a rule snapshot.")]
    Sanitize(SanitizeCommand),

    /// Validates a rule snapshot.
    #[command(about = "Validates a rule snapshot and reports every problem.")]
    Validate(ValidateCommand),

    /// Reports whether a snapshot's allow-list monitors a host.
    #[command(about = "Reports whether the engine would monitor a given hostname.")]
    Monitors(MonitorsCommand),
}

/// Arguments for the `sanitize` command.
#[derive(Parser, Debug)]
pub struct SanitizeCommand {
    /// Rule snapshot (JSON or YAML); the built-in rules are used if omitted.
    #[arg(long, short = 'r', value_name = "FILE", env = "PII_SANITIZER_RULES")]
    pub rules: Option<PathBuf>,

    /// Path to an input file (reads from stdin if not provided).
    #[arg(long, short = 'i', value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Caret offset, in characters, before the rewrite.
    #[arg(long, short = 'c', value_name = "N")]
    pub cursor: Option<usize>,

    /// Treat the input as a paste: the caret goes to the end.
    #[arg(long)]
    pub paste: bool,

    /// Print a unified diff of the rewrite to stderr.
    #[arg(long, short = 'D')]
    pub diff: bool,

    /// Print `{"text", "cursorPosition"}` as JSON instead of the bare text.
    #[arg(long)]
    pub json: bool,

    /// Suppress the caret and per-rule summary.
    #[arg(long = "no-summary")]
    pub no_summary: bool,
}

/// Arguments for the `validate` command.
#[derive(Parser, Debug)]
pub struct ValidateCommand {
    #[arg(long, short = 'r', value_name = "FILE", env = "PII_SANITIZER_RULES")]
    pub rules: PathBuf,
}

/// Arguments for the `monitors` command.
#[derive(Parser, Debug)]
pub struct MonitorsCommand {
    /// Rule snapshot (JSON or YAML); the built-in allow-list is used if omitted.
    #[arg(long, short = 'r', value_name = "FILE", env = "PII_SANITIZER_RULES")]
    pub rules: Option<PathBuf>,

    /// Page hostname to check, e.g. `claude.ai`.
    pub hostname: String,
}
