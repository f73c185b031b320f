// pii-sanitizer/src/logger.rs
//! Logger setup for the CLI.
//!
//! Logs go to stderr so stdout only ever carries sanitized text. `RUST_LOG`
//! is honoured unless a level is forced from the command line.

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Initializes `env_logger`. Calling it more than once is harmless.
pub fn init_logger(level: Option<LevelFilter>) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("warn"));
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder.format_timestamp(None).format_target(true);
    let _ = builder.try_init();
}

/// The level implied by the global `--quiet`/`--debug` flags, if any.
pub fn level_from_flags(quiet: bool, debug: bool) -> Option<LevelFilter> {
    if quiet {
        Some(LevelFilter::Off)
    } else if debug {
        Some(LevelFilter::Debug)
    } else {
        None
    }
}
