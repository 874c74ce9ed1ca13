//! Cooperative periodic-task scheduler.
//!
//! Evaluated once per run-loop iteration.  Each task tracks its own
//! deadline; a task whose deadline has been reached fires through the
//! [`SchedulerDelegate`] and is rescheduled to `now + period`, measured
//! from the tick that fired it.  Late ticks stretch a period, they never
//! shrink the next one.
//!
//! ```text
//!            now ≥ next_due
//!   WAITING ───────────────▶ FIRING
//!      ▲                        │
//!      └──── next_due = now + period
//! ```
//!
//! Deadlines are compared with wrapping arithmetic, so the u32 millisecond
//! counter may roll over (every ~49.7 days) without a missed or early fire.

use heapless::Vec;
use log::info;

use crate::app::ports::{SchedulerDelegate, TaskAction};
use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════
//  Clock type
// ═══════════════════════════════════════════════════════════════

/// Monotonic millisecond timestamp that wraps at `u32::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Millis(pub u32);

impl Millis {
    pub const fn wrapping_add(self, ms: u32) -> Self {
        Self(self.0.wrapping_add(ms))
    }

    /// Signed distance from `earlier` to `self`, valid while the two are
    /// less than 2^31 ms (~24.8 days) apart.
    pub const fn since(self, earlier: Millis) -> i32 {
        self.0.wrapping_sub(earlier.0) as i32
    }

    /// `self >= deadline`, tolerant of counter wraparound.
    pub const fn has_reached(self, deadline: Millis) -> bool {
        self.since(deadline) >= 0
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tasks
// ═══════════════════════════════════════════════════════════════

/// Maximum number of registered tasks (stack-allocated).
pub const MAX_TASKS: usize = 4;

/// Longest period [`Millis::has_reached`] can tell from an overdue one.
pub const MAX_PERIOD_MS: u32 = i32::MAX as u32;

/// A repeating unit of work.
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub label: &'static str,
    pub action: TaskAction,
    /// Period in milliseconds.
    pub period_ms: u32,
    /// Deadline of the next firing.
    pub next_due: Millis,
}

/// The scheduler engine.
///
/// Decoupled from the task bodies: when a task fires, it invokes the
/// [`SchedulerDelegate`] with the task's action rather than running
/// anything itself.
#[derive(Debug, Default)]
pub struct Scheduler {
    tasks: Vec<ScheduledTask, MAX_TASKS>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task.  Tasks fire in registration order within a tick.
    ///
    /// The period must be in `1..=MAX_PERIOD_MS`: a longer deadline would
    /// read as already passed and the task would fire on every tick.
    pub fn register(
        &mut self,
        label: &'static str,
        action: TaskAction,
        period_ms: u32,
        first_due: Millis,
    ) -> Result<()> {
        if period_ms == 0 || period_ms > MAX_PERIOD_MS {
            return Err(Error::Config("task period out of range"));
        }
        self.tasks
            .push(ScheduledTask {
                label,
                action,
                period_ms,
                next_due: first_due,
            })
            .map_err(|_| Error::SchedulerFull)?;
        info!(
            "Scheduler: registered '{}' every {} ms (first due at {} ms)",
            label, period_ms, first_due.0
        );
        Ok(())
    }

    /// Evaluate every task once.  Returns the number of tasks fired.
    pub fn tick(&mut self, now: Millis, delegate: &mut dyn SchedulerDelegate) -> usize {
        let mut fired = 0;
        for task in self.tasks.iter_mut() {
            if !now.has_reached(task.next_due) {
                continue;
            }
            delegate.on_task_fired(task.label, task.action, now);
            task.next_due = now.wrapping_add(task.period_ms);
            fired += 1;
        }
        fired
    }

    /// Deadline of the task registered under `label`.
    pub fn next_due(&self, label: &str) -> Option<Millis> {
        self.tasks
            .iter()
            .find(|t| t.label == label)
            .map(|t| t.next_due)
    }

    pub fn tasks(&self) -> &[ScheduledTask] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
