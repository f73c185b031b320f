//! The content monitor: the composed pipeline behind the host's event ports.
//!
//! The host forwards four kinds of events:
//!
//! * `on_qualifying_change` for structural-observer callbacks,
//! * `on_input` and `on_paste` for events on monitored surfaces,
//! * `on_timer` for tasks fired by the `Scheduler`.
//!
//! Settings change notifications arrive through `refresh`. Every handler runs
//! to completion synchronously; the only deferred work is the debounced
//! rescan, the periodic fallback and the one-tick paste deferral.
//!
//! License: MIT OR Apache-2.0

use log::{debug, info, warn};
use std::time::Duration;

use crate::config::{MonitorConfig, SettingsChange, SettingsSnapshot};
use crate::discovery::SurfaceDiscovery;
use crate::dom::{EditableElement, MutationRecord, Page};
use crate::editor::adapter::{extract, inject, read_state, render};
use crate::editor::{classify, is_hidden_keyboard_proxy, EditorKind};
use crate::engine::{SanitizationEngine, TransformResult};
use crate::redaction_match::loggable;
use crate::scheduler::{Scheduler, Task, VirtualClock};
use crate::state::EngineState;
use crate::style::monitored_stylesheet;

/// `data-*` key marking a surface that just received a paste.
pub const JUST_PASTED_KEY: &str = "just-pasted";

pub struct ContentMonitor<P: Page, S: Scheduler> {
    page: P,
    scheduler: S,
    state: EngineState,
    discovery: SurfaceDiscovery,
    active: bool,
}

impl<P: Page, S: Scheduler> ContentMonitor<P, S> {
    pub fn new(page: P, scheduler: S, settings: SettingsSnapshot, config: MonitorConfig) -> Self {
        Self {
            page,
            scheduler,
            state: EngineState::new(settings),
            discovery: SurfaceDiscovery::new(config),
            active: false,
        }
    }

    /// Activates monitoring if the page is allow-listed. Returns whether
    /// the monitor is active afterwards.
    pub fn start(&mut self) -> bool {
        self.activate_if_allowed();
        self.active
    }

    /// Applies a settings change notification. An allow-list change can
    /// activate a page that was not monitored before; it never deactivates.
    pub fn refresh(&mut self, change: SettingsChange) {
        let outcome = self.state.refresh(change);
        if outcome.allow_list_changed {
            self.activate_if_allowed();
        }
    }

    fn activate_if_allowed(&mut self) {
        if self.active {
            return;
        }
        let hostname = self.page.hostname();
        if !self.state.should_monitor(&hostname) {
            debug!("Host '{}' is not allow-listed; staying inactive.", hostname);
            return;
        }
        info!("Initializing monitoring on '{}'.", hostname);
        self.active = true;
        self.page.inject_style(&monitored_stylesheet(&self.discovery.config().monitored_class));
        self.discovery.scan(&self.page);
        self.page.observe_structure();
        self.discovery.start(&mut self.scheduler);
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn discovery(&self) -> &SurfaceDiscovery {
        &self.discovery
    }

    /// Structural-observer callback. Returns true if a rescan was armed.
    pub fn on_qualifying_change(&mut self, records: &[MutationRecord<P::Element>]) -> bool {
        if !self.active {
            return false;
        }
        self.discovery.on_qualifying_change(records, &mut self.scheduler)
    }

    /// `input` event on a monitored surface. Returns true if the surface was
    /// rewritten.
    pub fn on_input(&mut self, element: &P::Element) -> bool {
        if self.state.is_paused() || self.state.is_programmatic_update() {
            return false;
        }
        let Some(kind) = self.editor_kind(element) else {
            return false;
        };

        let surface = match read_state(kind, element) {
            Ok(surface) => surface,
            Err(e) => {
                debug!("Ignoring input on {:?}: {}", element.surface_id(), e);
                return false;
            }
        };
        let extracted = extract(&surface);
        let is_paste = element.data(JUST_PASTED_KEY).as_deref() == Some("true");
        debug!(
            "Input on {:?} ({:?}): text {}, cursor {:?}, paste {}.",
            element.surface_id(),
            kind,
            loggable(&extracted.text),
            extracted.cursor,
            is_paste
        );

        let result = self.state.engine().sanitize(&extracted.text, extracted.cursor, is_paste);
        let rewritten = result.text != extracted.text;
        if rewritten {
            self.write_back(kind, element, &result);
        }
        element.set_data(JUST_PASTED_KEY, None);
        rewritten
    }

    /// `paste` event on a monitored surface.
    ///
    /// Paragraph editors materialise pasted content only after the event, so
    /// their rewrite is deferred by one scheduling turn. Other surfaces are
    /// handled by the `input` event that follows the paste.
    pub fn on_paste(&mut self, element: &P::Element) {
        if self.state.is_paused() || self.state.is_programmatic_update() {
            return;
        }
        let Some(kind) = self.editor_kind(element) else {
            return;
        };

        element.set_data(JUST_PASTED_KEY, Some("true"));
        if kind.is_paragraph_structured() {
            debug!("Deferring paste processing for {:?}.", element.surface_id());
            self.scheduler.schedule(Duration::ZERO, Task::DeferredPaste(element.surface_id()));
        } else {
            debug!("Paste on {:?} left to the input handler.", element.surface_id());
        }
    }

    /// A task fired by the scheduler.
    pub fn on_timer(&mut self, task: Task) {
        match task {
            Task::DeferredPaste(id) => {
                let Some(element) = self.page.element(id) else {
                    debug!("Pasted-into surface {:?} is gone.", id);
                    return;
                };
                self.process_deferred_paste(&element);
            }
            Task::Rescan | Task::PeriodicRescan => {
                self.discovery.on_timer(task, &self.page, &mut self.scheduler);
            }
        }
    }

    fn process_deferred_paste(&mut self, element: &P::Element) {
        let kind = self.editor_kind(element).filter(|k| k.is_paragraph_structured());
        let Some(kind) = kind else {
            element.set_data(JUST_PASTED_KEY, None);
            return;
        };
        if self.state.is_paused() {
            element.set_data(JUST_PASTED_KEY, None);
            return;
        }

        match read_state(kind, element) {
            Ok(surface) => {
                let content = extract(&surface).text;
                let result = self.state.engine().sanitize(&content, None, true);
                if result.text != content {
                    self.write_back(kind, element, &result);
                }
            }
            Err(e) => warn!("Post-paste extraction failed on {:?}: {}", element.surface_id(), e),
        }
        element.set_data(JUST_PASTED_KEY, None);
    }

    /// Classifies a surface, ignoring the keyboard proxy.
    fn editor_kind(&self, element: &P::Element) -> Option<EditorKind> {
        let desc = element.describe();
        if is_hidden_keyboard_proxy(&desc) {
            return None;
        }
        classify(&desc, &self.page.hostname())
    }

    fn write_back(&self, kind: EditorKind, element: &P::Element, result: &TransformResult) {
        let _guard = self.state.begin_programmatic_update();
        let injection = render(kind, &result.text, result.cursor_position);
        inject(element, &injection);
    }
}

impl<P: Page> ContentMonitor<P, VirtualClock> {
    /// Advances virtual time, delivering every task that becomes due,
    /// including tasks armed while handling earlier ones.
    pub fn advance(&mut self, by: Duration) {
        let target = self.scheduler.now() + by;
        while let Some(task) = self.scheduler.pop_due(target) {
            self.on_timer(task);
        }
        self.scheduler.set_now(target);
    }
}
