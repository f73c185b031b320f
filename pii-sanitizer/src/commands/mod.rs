// pii-sanitizer/src/commands/mod.rs
//! Subcommand implementations.

pub mod monitors;
pub mod sanitize;
pub mod validate;

use anyhow::{Context, Result};
use log::debug;
use std::path::Path;

use pii_sanitizer_core::SettingsSnapshot;

/// Loads the snapshot at `path`, or the built-in one when no path is given.
///
/// Rules are not validated here: a broken rule is skipped by the compiler
/// and reported, the rest still apply. `validate` is the strict path.
pub fn load_snapshot(path: Option<&Path>) -> Result<SettingsSnapshot> {
    match path {
        Some(path) => SettingsSnapshot::parse_file(path)
            .with_context(|| format!("Failed to load rule snapshot {}", path.display())),
        None => {
            debug!("No rule snapshot given; using the built-in rules.");
            SettingsSnapshot::load_default_rules()
        }
    }
}
