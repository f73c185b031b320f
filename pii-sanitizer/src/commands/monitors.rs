// pii-sanitizer/src/commands/monitors.rs
//! `monitors`: reports whether a snapshot activates the engine on a host.

use anyhow::Result;
use std::io::{self, Write};

use pii_sanitizer_core::state::EngineState;

use crate::cli::MonitorsCommand;
use crate::commands::load_snapshot;

pub fn run(cmd: &MonitorsCommand) -> Result<()> {
    let state = EngineState::new(load_snapshot(cmd.rules.as_deref())?);
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", describe(&state, &cmd.hostname))?;
    Ok(())
}

/// One-line verdict for `hostname`.
pub fn describe(state: &EngineState, hostname: &str) -> String {
    match (state.should_monitor(hostname), state.is_paused()) {
        (true, false) => format!("{}: monitored", hostname),
        (true, true) => format!("{}: monitored (paused)", hostname),
        (false, _) => format!("{}: not monitored", hostname),
    }
}
