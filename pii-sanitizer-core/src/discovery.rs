//! Surface discovery: keeps the set of monitored surfaces in step with the page.
//!
//! Structural changes never trigger a scan directly. They re-arm a single
//! trailing-edge debounce timer, so a burst of mutations produces one rescan
//! once the page has been quiet for the debounce delay. A periodic fallback
//! re-arms the same timer in case notifications were missed.

use log::{debug, info};

use crate::config::MonitorConfig;
use crate::dom::{EditableElement, MutationRecord, Page, OBSERVED_ATTRIBUTES};
use crate::editor::qualifies;
use crate::scheduler::{Scheduler, Task, TimerId};

#[derive(Debug)]
pub struct SurfaceDiscovery {
    config: MonitorConfig,
    pending_rescan: Option<TimerId>,
    periodic: Option<TimerId>,
}

impl SurfaceDiscovery {
    pub fn new(config: MonitorConfig) -> Self {
        Self { config, pending_rescan: None, periodic: None }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Whether a debounced rescan is waiting to fire.
    pub fn has_pending_rescan(&self) -> bool {
        self.pending_rescan.is_some()
    }

    /// Arms the periodic fallback rescan. Calling it again is a no-op.
    pub fn start<S: Scheduler>(&mut self, scheduler: &mut S) {
        if self.periodic.is_none() {
            self.periodic = Some(scheduler.schedule_repeating(self.config.fallback_rescan(), Task::PeriodicRescan));
        }
    }

    /// Scans the page and sets up every qualifying surface not yet monitored.
    /// Returns the number of newly monitored surfaces.
    pub fn scan<P: Page>(&self, page: &P) -> usize {
        let candidates = page.candidates();
        let attached = candidates.iter().filter(|element| self.setup_surface(*element)).count();
        debug!("Scanned {} candidate(s), {} newly monitored.", candidates.len(), attached);
        attached
    }

    /// Marks the element as monitored and wires its listeners, once.
    pub fn setup_surface<E: EditableElement>(&self, element: &E) -> bool {
        let class = self.config.monitored_class.as_str();
        if element.has_class(class) || !qualifies(&element.describe()) {
            return false;
        }
        info!("Setting up surface {:?}.", element.surface_id());
        element.add_class(class);
        element.detach_listeners();
        element.attach_listeners();
        true
    }

    /// Whether a mutation can have produced a new qualifying surface.
    pub fn is_qualifying_change<E: EditableElement>(record: &MutationRecord<E>) -> bool {
        match record {
            MutationRecord::ChildList { added } => *added > 0,
            MutationRecord::Attributes { target, attribute } => {
                OBSERVED_ATTRIBUTES.contains(attribute.as_str()) && qualifies(&target.describe())
            }
        }
    }

    /// Handles one observer callback. Returns true if a rescan was (re)armed.
    pub fn on_qualifying_change<E, S>(&mut self, records: &[MutationRecord<E>], scheduler: &mut S) -> bool
    where
        E: EditableElement,
        S: Scheduler,
    {
        if !records.iter().any(Self::is_qualifying_change) {
            return false;
        }
        self.request_rescan(scheduler);
        true
    }

    /// Re-arms the debounce timer, cancelling any pending rescan.
    pub fn request_rescan<S: Scheduler>(&mut self, scheduler: &mut S) {
        if let Some(pending) = self.pending_rescan.take() {
            scheduler.cancel(pending);
        }
        self.pending_rescan = Some(scheduler.schedule(self.config.debounce(), Task::Rescan));
    }

    /// Handles a fired discovery timer; other tasks are ignored.
    pub fn on_timer<P: Page, S: Scheduler>(&mut self, task: Task, page: &P, scheduler: &mut S) {
        match task {
            Task::Rescan => {
                self.pending_rescan = None;
                self.scan(page);
            }
            Task::PeriodicRescan => self.request_rescan(scheduler),
            Task::DeferredPaste(_) => {}
        }
    }
}
