//! The engine's process-wide state, as one injectable object.
//!
//! Holds the latest settings snapshot, the rule engine compiled from it and
//! the re-entrancy flag. Settings are written only through `refresh`, which
//! mirrors the settings store's change notification; every event handler
//! reads whatever snapshot was current when it started.
//!
//! License: MIT OR Apache-2.0

use log::{debug, info};
use std::cell::Cell;
use std::rc::Rc;

use crate::config::{SettingsChange, SettingsSnapshot};
use crate::engines::rule_engine::RuleEngine;

/// What a `refresh` changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub rules_changed: bool,
    pub allow_list_changed: bool,
    pub pause_changed: bool,
}

#[derive(Debug)]
pub struct EngineState {
    settings: SettingsSnapshot,
    engine: RuleEngine,
    programmatic_update: Rc<Cell<bool>>,
}

impl EngineState {
    pub fn new(settings: SettingsSnapshot) -> Self {
        let engine = RuleEngine::new(&settings.rules);
        Self {
            settings,
            engine,
            programmatic_update: Rc::new(Cell::new(false)),
        }
    }

    /// Applies a change notification, recompiling rules when they changed.
    pub fn refresh(&mut self, change: SettingsChange) -> RefreshOutcome {
        let outcome = RefreshOutcome {
            rules_changed: change.rules.is_some(),
            allow_list_changed: change.allow_list.is_some(),
            pause_changed: change.paused.is_some(),
        };
        self.settings.apply(change);
        if outcome.rules_changed {
            self.engine = RuleEngine::new(&self.settings.rules);
            info!("Rule snapshot refreshed: {} rules.", self.settings.rules.len());
        }
        debug!("Settings refreshed: {:?}", outcome);
        outcome
    }

    pub fn settings(&self) -> &SettingsSnapshot {
        &self.settings
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    pub fn is_paused(&self) -> bool {
        self.settings.paused
    }

    pub fn should_monitor(&self, hostname: &str) -> bool {
        self.settings.allows_host(hostname)
    }

    /// True while the engine itself is writing to a surface.
    pub fn is_programmatic_update(&self) -> bool {
        self.programmatic_update.get()
    }

    /// Shared handle to the re-entrancy flag, for hosts that need to check
    /// it from their own event plumbing.
    pub fn programmatic_update_flag(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.programmatic_update)
    }

    /// Raises the re-entrancy flag until the returned guard is dropped.
    pub fn begin_programmatic_update(&self) -> ProgrammaticUpdate {
        self.programmatic_update.set(true);
        ProgrammaticUpdate { flag: Rc::clone(&self.programmatic_update) }
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::new(SettingsSnapshot::default())
    }
}

/// Clears the re-entrancy flag on drop, on every exit path.
#[must_use = "the flag is cleared as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ProgrammaticUpdate {
    flag: Rc<Cell<bool>>,
}

impl Drop for ProgrammaticUpdate {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SanitizationRule, Website};
    use crate::engine::SanitizationEngine;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    #[test]
    fn test_guard_clears_flag_on_drop() {
        let state = EngineState::default();
        {
            let _guard = state.begin_programmatic_update();
            assert!(state.is_programmatic_update());
        }
        assert!(!state.is_programmatic_update());
    }

    #[test]
    fn test_guard_clears_flag_when_unwinding() {
        let state = EngineState::default();
        let result = catch_unwind(AssertUnwindSafe(|| {
            let _guard = state.begin_programmatic_update();
            panic!("injection failed");
        }));
        assert!(result.is_err());
        assert!(!state.is_programmatic_update());
    }

    #[test]
    fn test_refresh_recompiles_rules() {
        let mut state = EngineState::default();
        assert_eq!(state.engine().sanitize("asd", None, false).text, "asd");

        let outcome = state.refresh(SettingsChange {
            rules: Some(vec![SanitizationRule::literal("asd", "asd", "X")]),
            ..Default::default()
        });
        assert!(outcome.rules_changed);
        assert!(!outcome.allow_list_changed);
        assert_eq!(state.engine().sanitize("asd", None, false).text, "X");
    }

    #[test]
    fn test_should_monitor_follows_allow_list() {
        let mut state = EngineState::default();
        assert!(!state.should_monitor("claude.ai"));
        state.refresh(SettingsChange {
            allow_list: Some(vec![Website { hostname: "claude.ai".into(), enabled: true }]),
            ..Default::default()
        });
        assert!(state.should_monitor("claude.ai"));
    }
}
