//! Timer abstraction for the monitor's deferred work.
//!
//! The monitor never sleeps or spawns. It asks a `Scheduler` to deliver a
//! `Task` later, and the host calls `ContentMonitor::on_timer` when it fires.
//! `VirtualClock` is a deterministic scheduler driven by explicit `advance`
//! calls, used for tests and headless replays.

use std::time::Duration;

use crate::dom::SurfaceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// Deferred work the monitor can schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Debounced rescan after a burst of structural changes.
    Rescan,
    /// Fallback tick that re-arms the debounced rescan.
    PeriodicRescan,
    /// Post-paste processing for a paragraph editor.
    DeferredPaste(SurfaceId),
}

pub trait Scheduler {
    /// Delivers `task` once after `delay`.
    fn schedule(&mut self, delay: Duration, task: Task) -> TimerId;

    /// Delivers `task` every `period` until cancelled.
    fn schedule_repeating(&mut self, period: Duration, task: Task) -> TimerId;

    /// Cancels a timer. Unknown or already-fired ids are ignored.
    fn cancel(&mut self, id: TimerId);
}

#[derive(Debug, Clone)]
struct VirtualTimer {
    id: TimerId,
    due: Duration,
    period: Option<Duration>,
    task: Task,
}

/// A scheduler over virtual time.
#[derive(Debug, Default)]
pub struct VirtualClock {
    now: Duration,
    next_id: u64,
    timers: Vec<VirtualTimer>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of armed timers.
    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    /// Whether a timer carrying `task` is armed.
    pub fn is_scheduled(&self, task: Task) -> bool {
        self.timers.iter().any(|t| t.task == task)
    }

    /// Fires the earliest timer due at or before `until`, moving the clock to
    /// its due time. Ties fire in scheduling order.
    pub fn pop_due(&mut self, until: Duration) -> Option<Task> {
        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= until)
            .min_by_key(|(_, t)| (t.due, t.id))
            .map(|(i, _)| i)?;

        let VirtualTimer { due, period, task, .. } = self.timers[index].clone();
        self.now = self.now.max(due);
        match period {
            Some(period) => self.timers[index].due += period,
            None => {
                self.timers.remove(index);
            }
        }
        Some(task)
    }

    /// Moves the clock to `until` without firing anything.
    pub fn set_now(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }

    /// Advances by `by` and returns every task that fired, in order.
    ///
    /// Timers armed by whoever handles these tasks are not included; use
    /// `pop_due` in a loop when handlers schedule follow-up work.
    pub fn advance(&mut self, by: Duration) -> Vec<Task> {
        let target = self.now + by;
        let mut fired = Vec::new();
        while let Some(task) = self.pop_due(target) {
            fired.push(task);
        }
        self.set_now(target);
        fired
    }

    fn arm(&mut self, delay: Duration, period: Option<Duration>, task: Task) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.timers.push(VirtualTimer { id, due: self.now + delay, period, task });
        id
    }
}

impl Scheduler for VirtualClock {
    fn schedule(&mut self, delay: Duration, task: Task) -> TimerId {
        self.arm(delay, None, task)
    }

    fn schedule_repeating(&mut self, period: Duration, task: Task) -> TimerId {
        // A zero period would fire forever within a single advance.
        let period = period.max(Duration::from_millis(1));
        self.arm(period, Some(period), task)
    }

    fn cancel(&mut self, id: TimerId) {
        self.timers.retain(|t| t.id != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_shot_fires_once_at_due_time() {
        let mut clock = VirtualClock::new();
        clock.schedule(Duration::from_millis(100), Task::Rescan);
        assert!(clock.advance(Duration::from_millis(99)).is_empty());
        assert_eq!(clock.advance(Duration::from_millis(1)), vec![Task::Rescan]);
        assert!(clock.advance(Duration::from_secs(1)).is_empty());
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn test_cancel_prevents_firing() {
        let mut clock = VirtualClock::new();
        let id = clock.schedule(Duration::from_millis(10), Task::Rescan);
        clock.cancel(id);
        assert!(clock.advance(Duration::from_millis(50)).is_empty());
    }

    #[test]
    fn test_repeating_timer_fires_each_period() {
        let mut clock = VirtualClock::new();
        clock.schedule_repeating(Duration::from_secs(2), Task::PeriodicRescan);
        let fired = clock.advance(Duration::from_secs(7));
        assert_eq!(fired, vec![Task::PeriodicRescan; 3]);
        assert_eq!(clock.now(), Duration::from_secs(7));
    }

    #[test]
    fn test_ties_fire_in_scheduling_order() {
        let mut clock = VirtualClock::new();
        let paste = Task::DeferredPaste(SurfaceId(7));
        clock.schedule(Duration::ZERO, paste);
        clock.schedule(Duration::ZERO, Task::Rescan);
        assert_eq!(clock.advance(Duration::ZERO), vec![paste, Task::Rescan]);
    }
}
