//! Task — static, no-alloc schedulable unit
//!
//! A task is a plain `Copy` value living in a lane slot. It carries its
//! own timing state and two stopwatches, and decides its own readiness.
//!
//! Two period semantics, selected by sign:
//! - `period > 0`: relative. The next deadline is `period` ticks after the
//!   last run started, so jitter never shortens an interval.
//! - `period < 0`: absolute. The task wakes on every multiple of
//!   `|period|` on the clock, found by watching `now % |period|` wrap.
//!   Tasks sharing a magnitude run in lockstep however late any one was.
//! - `period == 0`: ready on every poll.
//!
//! Author: Moroya Sakamoto

use core::fmt;

use crate::config::NAME_LEN;
use crate::stats::{RollingStatistic, StatSummary, Stopwatch};
use crate::timer::{Clock, Duration, Tick};

/// Task body — returns `true` to keep running, `false` to retire
pub type TaskFn<'a> = &'a dyn Fn() -> bool;

/// Fixed-size task name
///
/// Only the first [`NAME_LEN`] bytes are kept; two names sharing that
/// prefix are the same name to every control operation.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskName {
    bytes: [u8; NAME_LEN],
    len: u8,
}

impl TaskName {
    /// Truncate `name` to [`NAME_LEN`] bytes, backing off to a char boundary
    pub fn new(name: &str) -> Self {
        let mut len = name.len().min(NAME_LEN);
        while !name.is_char_boundary(len) {
            len -= 1;
        }
        let mut bytes = [0u8; NAME_LEN];
        bytes[..len].copy_from_slice(&name.as_bytes()[..len]);
        Self {
            bytes,
            len: len as u8,
        }
    }

    /// Does `query` address this name?
    pub fn matches(&self, query: &str) -> bool {
        *self == Self::new(query)
    }

    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Slot is empty or the task retired
    Invalid,
    /// Callback is executing
    Running,
    /// Disabled by the host, kept for reactivation
    Stopped,
    /// Waiting for the next deadline
    Paused,
    /// Missed its deadline (reported only, never stored)
    Delayed,
}

/// Last `now % |period|` sample of an absolute-period task
#[derive(Debug, Clone, Copy)]
struct PhaseSample {
    phase: Tick,
    at: Tick,
}

/// Schedulable unit
#[derive(Clone, Copy)]
pub struct Task<'a> {
    name: TaskName,
    callback: Option<TaskFn<'a>>,
    period: Duration,
    last_run: Tick,
    status: Status,
    /// Cached by the last readiness check
    time_left: Duration,
    phase: Option<PhaseSample>,
    /// Callback execution time
    run_time: Stopwatch,
    /// Time between consecutive runs
    exec_time: Stopwatch,
}

impl<'a> Task<'a> {
    /// Empty slot
    pub fn empty() -> Self {
        Self {
            name: TaskName::default(),
            callback: None,
            period: 0,
            last_run: 0,
            status: Status::Invalid,
            time_left: 0,
            phase: None,
            run_time: Stopwatch::new(),
            exec_time: Stopwatch::new(),
        }
    }

    /// New task, armed and waiting for its first deadline
    pub fn new(name: &str, period: Duration, callback: TaskFn<'a>) -> Self {
        Self {
            name: TaskName::new(name),
            callback: Some(callback),
            period,
            status: Status::Paused,
            ..Self::empty()
        }
    }

    /// Check readiness and cache the time left
    ///
    /// Absolute-period tasks sample their phase here, so this must be
    /// polled regularly for boundaries to be seen.
    pub fn is_ready(&mut self, clock: &Clock<'_>) -> bool {
        match self.status {
            Status::Invalid | Status::Stopped | Status::Running => false,
            Status::Paused | Status::Delayed => {
                self.time_left = self.compute_time_left(clock);
                self.time_left <= 0
            }
        }
    }

    fn compute_time_left(&mut self, clock: &Clock<'_>) -> Duration {
        if self.period >= 0 {
            return self.period - clock.elapsed(self.last_run);
        }

        let magnitude = self.period.unsigned_abs();
        let now = clock.now();
        let phase = now % magnitude;
        let crossed = match self.phase {
            // Wrapped, or a whole period went by between polls
            Some(prev) => phase < prev.phase || now.saturating_sub(prev.at) >= magnitude,
            None => false,
        };
        self.phase = Some(PhaseSample { phase, at: now });

        if crossed {
            -clock.elapsed(self.last_run)
        } else {
            (magnitude - phase) as Duration
        }
    }

    /// Execute the callback
    ///
    /// Only a `Paused` task runs; returns whether the callback was invoked.
    /// Call after [`is_ready`](Self::is_ready) returned `true`.
    pub fn run(&mut self, clock: &Clock<'_>) -> bool {
        if self.status != Status::Paused {
            return false;
        }
        let Some(callback) = self.callback else {
            return false;
        };

        self.exec_time.stop(clock);
        self.exec_time.start(clock);

        let now = clock.now();
        self.last_run = if self.period >= 0 {
            now
        } else {
            // Anchor to the boundary, not to when we got around to it
            now - now % self.period.unsigned_abs()
        };

        self.status = Status::Running;
        let keep = {
            let _watch = self.run_time.measure(clock);
            callback()
        };

        if keep {
            self.status = Status::Paused;
        } else {
            log::trace!("task {} retired", self.name);
            self.status = Status::Invalid;
        }
        true
    }

    /// Re-arm with a fresh timing baseline
    pub fn start(&mut self, clock: &Clock<'_>) {
        self.status = Status::Paused;
        self.run_time.reset();
        self.exec_time.reset();
        self.exec_time.start(clock);
    }

    /// Disable; statistics are kept
    pub fn stop(&mut self) {
        self.status = Status::Stopped;
    }

    /// Retire and free the slot
    pub fn invalidate(&mut self) {
        self.status = Status::Invalid;
    }

    /// Is the slot occupied?
    pub fn is_valid(&self) -> bool {
        self.status != Status::Invalid
    }

    pub fn name(&self) -> &TaskName {
        &self.name
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn last_run_tick(&self) -> Tick {
        self.last_run
    }

    /// Ticks until the next deadline, as of the last readiness check
    ///
    /// Negative means overdue. Zero for tasks that are not waiting and for
    /// zero-period tasks.
    pub fn time_left(&self) -> Duration {
        if self.status != Status::Paused || self.period == 0 {
            return 0;
        }
        self.time_left
    }

    /// Stored status, or `Delayed` when overdue
    pub fn status(&self) -> Status {
        if self.time_left() < 0 {
            return Status::Delayed;
        }
        self.status
    }

    /// Callback execution time
    pub fn run_time(&self) -> &RollingStatistic<Duration> {
        self.run_time.duration()
    }

    /// Observed interval between runs
    pub fn actual_period(&self) -> &RollingStatistic<Duration> {
        self.exec_time.duration()
    }

    pub fn reset_run_time(&mut self) {
        self.run_time.reset();
    }

    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            name: self.name,
            period: self.period,
            time_left: self.time_left(),
            status: self.status(),
            run_time: self.run_time().summary(),
        }
    }
}

impl Default for Task<'_> {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Task<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("period", &self.period)
            .field("status", &self.status())
            .field("time_left", &self.time_left())
            .field("last_run", &self.last_run)
            .finish()
    }
}

/// Read-only view of a task for dashboards
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskSnapshot {
    pub name: TaskName,
    pub period: Duration,
    pub time_left: Duration,
    pub status: Status,
    pub run_time: StatSummary<Duration>,
}
