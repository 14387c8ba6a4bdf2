//! Sub-stage machine — a task body written as ordered steps
//!
//! Each call to [`Stage::run`] executes the active step once. The step
//! decides where to go next, which gives a task body sequential-looking
//! logic (including waits via [`Stage::sleep`]) without ever blocking.
//!
//! Author: Moroya Sakamoto

use crate::timer::{Clock, Tick};

/// Where the machine goes after a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Advance to the following step (wraps past the last)
    Next,
    /// Repeat this step on the next run
    Stay,
    /// Back to step 0
    Reset,
}

/// Step function
pub type StepFn<const N: usize> = fn(&mut Stage<N>) -> Direction;

/// Step that only sleeps for a constant number of ticks
///
/// ```ignore
/// let steps: [StepFn<3>; 3] = [open_valve, sleep_step!(500), close_valve];
/// ```
#[macro_export]
macro_rules! sleep_step {
    ($ticks:expr) => {
        |stage| $crate::stage::Stage::sleep(stage, $ticks)
    };
}

/// Ordered set of `N` steps with one active index
#[derive(Clone, Copy)]
pub struct Stage<const N: usize> {
    steps: [StepFn<N>; N],
    index: usize,
    /// Tick at which the current step was entered
    now: Tick,
    sleeping: bool,
    deadline: Tick,
}

impl<const N: usize> Stage<N> {
    pub const fn new(steps: [StepFn<N>; N]) -> Self {
        Self {
            steps,
            index: 0,
            now: 0,
            sleeping: false,
            deadline: 0,
        }
    }

    /// Execute the active step once and apply its direction
    pub fn run(&mut self, clock: &Clock<'_>) -> Direction {
        if N == 0 {
            return Direction::Stay;
        }
        self.now = clock.now();
        let step = self.steps[self.index];
        let dir = step(self);
        match dir {
            Direction::Next => self.index = (self.index + 1) % N,
            Direction::Stay => {}
            Direction::Reset => self.index = 0,
        }
        dir
    }

    /// Wait `ticks` from the first call, then move on
    ///
    /// Call from a step and return its result.
    pub fn sleep(&mut self, ticks: Tick) -> Direction {
        if !self.sleeping {
            self.deadline = self.now.saturating_add(ticks);
            self.sleeping = true;
        }
        if self.now >= self.deadline {
            self.sleeping = false;
            return Direction::Next;
        }
        Direction::Stay
    }

    /// Active step index
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_sleeping(&self) -> bool {
        self.sleeping
    }

    /// Back to step 0, dropping any pending sleep
    pub fn rewind(&mut self) {
        self.index = 0;
        self.sleeping = false;
    }
}
