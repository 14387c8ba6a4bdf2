//! Execution lane — fixed task table with round-robin dispatch
//!
//! A lane owns `N` task slots and runs at most one task per [`Lane::run`]
//! call. The cursor visits every occupied slot once per cycle, so no
//! ready task can starve another, and the cost of one call is bounded.
//!
//! Every operation runs inside the lane's critical section: a pair of
//! host hooks (typically interrupt disable/enable) bracketed by a guard
//! that releases on every exit path.
//!
//! Author: Moroya Sakamoto

use crate::error::{Result, SchedError};
use crate::stats::{StatSummary, Stopwatch};
use crate::task::Task;
use crate::timer::{Clock, Duration};

/// Host-supplied lock/unlock hooks
///
/// Must not block. Nested entry happens when [`ExecLane::locked`] calls
/// back into the lane, so the hooks have to tolerate it (e.g. a
/// save/restore interrupt mask).
#[derive(Debug, Clone, Copy)]
pub struct CriticalSection {
    lock: fn(),
    unlock: fn(),
}

impl CriticalSection {
    pub const fn new(lock: fn(), unlock: fn()) -> Self {
        Self { lock, unlock }
    }

    /// Lock now, unlock when the guard drops
    pub fn enter(&self) -> SectionGuard {
        (self.lock)();
        SectionGuard {
            unlock: self.unlock,
        }
    }
}

/// Held for the duration of a lane operation
pub struct SectionGuard {
    unlock: fn(),
}

impl Drop for SectionGuard {
    fn drop(&mut self) {
        (self.unlock)();
    }
}

/// Read-only view of a lane for dashboards
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneSnapshot {
    /// Occupied slots
    pub size: usize,
    pub capacity: usize,
    /// Wall time spent per dispatch call
    pub dispatch: StatSummary<Duration>,
}

/// Dispatch and control surface of a lane
///
/// Object safe, so the scheduler can hold lanes of different capacities.
pub trait Lane<'a> {
    /// Run at most one ready task
    fn run(&mut self, clock: &Clock<'_>);

    /// Copy `task` into the first free slot, returning the slot index
    fn try_add(&mut self, task: Task<'a>) -> Result<usize>;

    /// Copy `task` into the first free slot
    fn add(&mut self, task: Task<'a>) -> bool {
        self.try_add(task).is_ok()
    }

    /// Retire the first task addressed by `name`
    fn pkill(&mut self, name: &str) -> bool;

    /// Re-arm the first task addressed by `name`
    fn start(&mut self, name: &str, clock: &Clock<'_>) -> bool;

    /// Disable the first task addressed by `name`
    fn stop(&mut self, name: &str) -> bool;

    /// Clear every task's run-time statistic and the dispatch stopwatch
    fn reset_stats(&mut self);

    /// Occupied slots
    fn size(&self) -> usize;

    fn capacity(&self) -> usize;

    /// Dispatch-latency stopwatch
    fn watch(&self) -> &Stopwatch;

    /// All slots, including empty ones
    fn tasks(&self) -> &[Task<'a>];

    fn snapshot(&self) -> LaneSnapshot {
        LaneSnapshot {
            size: self.size(),
            capacity: self.capacity(),
            dispatch: self.watch().duration().summary(),
        }
    }
}

/// Lane with `N` task slots
pub struct ExecLane<'a, const N: usize> {
    tasks: [Task<'a>; N],
    cursor: usize,
    watch: Stopwatch,
    section: Option<CriticalSection>,
}

impl<'a, const N: usize> ExecLane<'a, N> {
    /// Empty, unsynchronized lane
    pub fn new() -> Self {
        Self {
            tasks: [Task::empty(); N],
            cursor: 0,
            watch: Stopwatch::new(),
            section: None,
        }
    }

    /// Empty lane guarded by `section`
    pub fn with_critical_section(section: CriticalSection) -> Self {
        Self {
            section: Some(section),
            ..Self::new()
        }
    }

    /// Install lock/unlock hooks
    pub fn set_critical_section(&mut self, lock: fn(), unlock: fn()) {
        self.section = Some(CriticalSection::new(lock, unlock));
    }

    /// Remove the hooks; operations become unsynchronized
    pub fn clear_critical_section(&mut self) {
        self.section = None;
    }

    /// Run `f` on the lane inside one critical section
    pub fn locked<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let _cs = self.enter();
        f(self)
    }

    fn enter(&self) -> Option<SectionGuard> {
        self.section.as_ref().map(CriticalSection::enter)
    }

    fn occupied(&self) -> usize {
        self.tasks.iter().filter(|t| t.is_valid()).count()
    }

    fn find(&mut self, name: &str) -> Option<&mut Task<'a>> {
        self.tasks
            .iter_mut()
            .find(|t| t.is_valid() && t.name().matches(name))
    }
}

impl<const N: usize> Default for ExecLane<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, const N: usize> Lane<'a> for ExecLane<'a, N> {
    fn run(&mut self, clock: &Clock<'_>) {
        let _cs = self.enter();
        if self.occupied() == 0 {
            return;
        }

        let _watch = self.watch.measure(clock);
        while !self.tasks[self.cursor].is_valid() {
            self.cursor = (self.cursor + 1) % N;
        }
        let task = &mut self.tasks[self.cursor];
        if task.is_ready(clock) && task.run(clock) {
            log::trace!("slot {}: ran {}", self.cursor, task.name());
        }
        self.cursor = (self.cursor + 1) % N;
    }

    fn try_add(&mut self, task: Task<'a>) -> Result<usize> {
        let _cs = self.enter();
        match self.tasks.iter().position(|t| !t.is_valid()) {
            Some(slot) => {
                self.tasks[slot] = task;
                log::debug!("task {} added to slot {}", task.name(), slot);
                Ok(slot)
            }
            None => {
                log::warn!("no free slot for task {} (capacity {})", task.name(), N);
                Err(SchedError::LaneFull)
            }
        }
    }

    fn pkill(&mut self, name: &str) -> bool {
        let _cs = self.enter();
        match self.find(name) {
            Some(task) => {
                log::debug!("pkill {}", task.name());
                task.invalidate();
                true
            }
            None => false,
        }
    }

    fn start(&mut self, name: &str, clock: &Clock<'_>) -> bool {
        let _cs = self.enter();
        match self.find(name) {
            Some(task) => {
                log::debug!("start {}", task.name());
                task.start(clock);
                true
            }
            None => false,
        }
    }

    fn stop(&mut self, name: &str) -> bool {
        let _cs = self.enter();
        match self.find(name) {
            Some(task) => {
                log::debug!("stop {}", task.name());
                task.stop();
                true
            }
            None => false,
        }
    }

    fn reset_stats(&mut self) {
        let _cs = self.enter();
        for task in self.tasks.iter_mut() {
            task.reset_run_time();
        }
        self.watch.reset();
    }

    fn size(&self) -> usize {
        let _cs = self.enter();
        self.occupied()
    }

    fn capacity(&self) -> usize {
        N
    }

    fn watch(&self) -> &Stopwatch {
        &self.watch
    }

    fn tasks(&self) -> &[Task<'a>] {
        &self.tasks
    }
}
