// pii-sanitizer/src/commands/validate.rs
//! `validate`: checks a rule snapshot the way the rule editor does.

use anyhow::{bail, Context, Result};
use is_terminal::IsTerminal;
use log::info;
use std::io;

use pii_sanitizer_core::{compile_rules, SettingsSnapshot};

use crate::cli::ValidateCommand;
use crate::ui::output_format;

pub fn run(cmd: &ValidateCommand) -> Result<()> {
    let path = cmd.rules.as_path();
    info!("Validating rule snapshot {}.", path.display());
    let snapshot = SettingsSnapshot::load_from_file(path)
        .with_context(|| format!("Rule snapshot {} is invalid", path.display()))?;

    let compiled = compile_rules(&snapshot.rules);
    if !compiled.rejected.is_empty() {
        let problems: Vec<String> = compiled.rejected.iter().map(|e| e.to_string()).collect();
        bail!("Rule snapshot {} is invalid:\n{}", path.display(), problems.join("\n"));
    }

    let message = format!(
        "{} rules valid ({} enabled), {} allow-list entries.",
        snapshot.rules.len(),
        compiled.rules.len(),
        snapshot.allow_list.len()
    );
    output_format::print_success_message(&mut io::stdout(), &message, io::stdout().is_terminal())?;
    Ok(())
}
