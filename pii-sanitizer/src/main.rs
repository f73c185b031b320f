// pii-sanitizer/src/main.rs
//! Entry point: parses arguments, sets up logging and dispatches to a command.

use anyhow::Result;
use clap::Parser;
use log::info;

use pii_sanitizer::cli::{Cli, Commands};
use pii_sanitizer::commands::{monitors, sanitize, validate};
use pii_sanitizer::logger;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init_logger(logger::level_from_flags(cli.quiet, cli.debug));
    info!("pii-sanitizer started. Version: {}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Sanitize(cmd) => sanitize::run(&cmd, cli.quiet),
        Commands::Validate(cmd) => validate::run(&cmd),
        Commands::Monitors(cmd) => monitors::run(&cmd),
    }
}
