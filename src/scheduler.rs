//! Scheduler — lane registry and clock owner
//!
//! Holds up to [`MAX_LANES`] lanes, indexed by priority/registration
//! order, and forwards dispatch and control to them. Lanes stay owned by
//! the host; the scheduler only borrows them.
//!
//! Author: Moroya Sakamoto

use crate::config::MAX_LANES;
use crate::error::{Result, SchedError};
use crate::lane::Lane;
use crate::task::Task;
use crate::timer::{Clock, NowFn};

/// Lane registry
///
/// `'a` is the lifetime of the clock source and task callbacks, `'l` the
/// borrow of the host's lanes.
pub struct Scheduler<'a, 'l> {
    clock: Clock<'a>,
    lanes: [Option<&'l mut dyn Lane<'a>>; MAX_LANES],
}

impl<'a, 'l> Scheduler<'a, 'l> {
    /// Scheduler reading time from `now`
    pub fn new(now: NowFn<'a>) -> Self {
        Self::with_clock(Clock::new(now))
    }

    pub fn with_clock(clock: Clock<'a>) -> Self {
        Self {
            clock,
            lanes: core::array::from_fn(|_| None),
        }
    }

    pub fn clock(&self) -> &Clock<'a> {
        &self.clock
    }

    /// Register `lane` in the first free slot, returning its index
    pub fn try_add_lane(&mut self, lane: &'l mut dyn Lane<'a>) -> Result<usize> {
        match self.lanes.iter().position(Option::is_none) {
            Some(index) => {
                self.lanes[index] = Some(lane);
                log::debug!("lane {} registered", index);
                Ok(index)
            }
            None => {
                log::warn!("lane registry full ({} lanes)", MAX_LANES);
                Err(SchedError::RegistryFull)
            }
        }
    }

    /// Register `lane` in the first free slot
    pub fn add_lane(&mut self, lane: &'l mut dyn Lane<'a>) -> bool {
        self.try_add_lane(lane).is_ok()
    }

    /// Add `task` to lane `lane`, returning the slot index
    pub fn try_add_task(&mut self, task: Task<'a>, lane: usize) -> Result<usize> {
        match self.lanes.get_mut(lane) {
            Some(Some(l)) => l.try_add(task),
            _ => {
                log::warn!("task {} refused: no lane {}", task.name(), lane);
                Err(SchedError::NoSuchLane)
            }
        }
    }

    /// Add `task` to lane `lane`
    pub fn add_task(&mut self, task: Task<'a>, lane: usize) -> bool {
        self.try_add_task(task, lane).is_ok()
    }

    /// Dispatch lane `lane` once; unknown lanes are ignored
    pub fn run(&mut self, lane: usize) {
        if let Some(Some(l)) = self.lanes.get_mut(lane) {
            l.run(&self.clock);
        }
    }

    /// Retire the first task called `name`, searching lanes in order
    pub fn pkill(&mut self, name: &str) -> bool {
        self.lanes.iter_mut().flatten().any(|l| l.pkill(name))
    }

    /// Re-arm the first task called `name`, searching lanes in order
    pub fn start(&mut self, name: &str) -> bool {
        let clock = &self.clock;
        self.lanes.iter_mut().flatten().any(|l| l.start(name, clock))
    }

    /// Disable the first task called `name`, searching lanes in order
    pub fn stop(&mut self, name: &str) -> bool {
        self.lanes.iter_mut().flatten().any(|l| l.stop(name))
    }

    pub fn reset_stats(&mut self) {
        for lane in self.lanes.iter_mut().flatten() {
            lane.reset_stats();
        }
    }

    /// Lane registered at `index`
    pub fn lane(&self, index: usize) -> Option<&(dyn Lane<'a> + 'l)> {
        self.lanes.get(index)?.as_deref()
    }

    pub fn lane_mut(&mut self, index: usize) -> Option<&mut (dyn Lane<'a> + 'l)> {
        self.lanes.get_mut(index)?.as_deref_mut()
    }

    /// Registered lanes with their indices
    pub fn lanes(&self) -> impl Iterator<Item = (usize, &(dyn Lane<'a> + 'l))> + '_ {
        self.lanes
            .iter()
            .enumerate()
            .filter_map(|(i, l)| l.as_deref().map(|l| (i, l)))
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.iter().flatten().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lane::ExecLane;
    use crate::task::Status;
    use core::cell::Cell;

    fn keep() -> bool {
        true
    }

    #[test]
    fn test_periodic_scenario() {
        let ticks = Cell::new(0u64);
        let now = || ticks.get();
        let counter = Cell::new(0u32);
        let body = || {
            counter.set(counter.get() + 1);
            true
        };

        let mut lane = ExecLane::<4>::new();
        let mut sched = Scheduler::new(&now);
        assert!(sched.add_lane(&mut lane));
        assert!(sched.add_task(Task::new("t1", 10, &body), 0));

        for (t, expected) in [(0, 0), (5, 0), (10, 1), (15, 1), (20, 2)] {
            ticks.set(t);
            sched.run(0);
            assert_eq!(counter.get(), expected, "at tick {t}");
        }
        let task = &sched.lane(0).unwrap().tasks()[0];
        assert_eq!(task.last_run_tick(), 20);
    }

    #[test]
    fn test_registry_capacity() {
        let now = || 0u64;
        let mut lanes: [ExecLane<1>; MAX_LANES + 1] = core::array::from_fn(|_| ExecLane::new());
        let mut sched = Scheduler::new(&now);

        let (head, tail) = lanes.split_at_mut(MAX_LANES);
        for (i, lane) in head.iter_mut().enumerate() {
            assert_eq!(sched.try_add_lane(lane), Ok(i));
        }
        assert_eq!(sched.try_add_lane(&mut tail[0]), Err(SchedError::RegistryFull));
        assert_eq!(sched.lane_count(), MAX_LANES);
    }

    #[test]
    fn test_unknown_lane_ignored() {
        let now = || 0u64;
        let mut lane = ExecLane::<2>::new();
        let mut sched = Scheduler::new(&now);
        sched.add_lane(&mut lane);

        assert_eq!(
            sched.try_add_task(Task::new("x", 0, &keep), 3),
            Err(SchedError::NoSuchLane)
        );
        assert!(!sched.add_task(Task::new("x", 0, &keep), MAX_LANES + 5));
        sched.run(1);
        sched.run(200);
        assert_eq!(sched.lane(0).unwrap().size(), 0);
    }

    #[test]
    fn test_lane_full_reported() {
        let now = || 0u64;
        let mut lane = ExecLane::<1>::new();
        let mut sched = Scheduler::new(&now);
        sched.add_lane(&mut lane);
        assert_eq!(sched.try_add_task(Task::new("a", 0, &keep), 0), Ok(0));
        assert_eq!(
            sched.try_add_task(Task::new("b", 0, &keep), 0),
            Err(SchedError::LaneFull)
        );
    }

    #[test]
    fn test_broadcast_control() {
        let now = || 0u64;
        let mut fast = ExecLane::<2>::new();
        let mut slow = ExecLane::<2>::new();
        let mut sched = Scheduler::new(&now);
        sched.add_lane(&mut fast);
        sched.add_lane(&mut slow);

        sched.add_task(Task::new("shared", 10, &keep), 0);
        sched.add_task(Task::new("shared", 10, &keep), 1);
        sched.add_task(Task::new("logger", 10, &keep), 1);

        // First lane wins; the second copy is untouched
        assert!(sched.stop("shared"));
        assert_eq!(sched.lane(0).unwrap().tasks()[0].status(), Status::Stopped);
        assert_eq!(sched.lane(1).unwrap().tasks()[0].status(), Status::Paused);

        assert!(sched.stop("logger"));
        assert!(sched.start("logger"));
        assert_eq!(sched.lane(1).unwrap().tasks()[1].status(), Status::Paused);

        assert!(sched.pkill("shared"));
        assert!(sched.pkill("shared"));
        assert!(!sched.pkill("shared"));
        assert!(!sched.start("ghost"));
        assert!(!sched.stop("ghost"));
    }

    #[test]
    fn test_lanes_dispatch_independently() {
        let ticks = Cell::new(0u64);
        let now = || ticks.get();
        let a_hits = Cell::new(0u32);
        let b_hits = Cell::new(0u32);
        let a = || {
            a_hits.set(a_hits.get() + 1);
            true
        };
        let b = || {
            b_hits.set(b_hits.get() + 1);
            true
        };

        let mut high = ExecLane::<1>::new();
        let mut low = ExecLane::<1>::new();
        let mut sched = Scheduler::new(&now);
        sched.add_lane(&mut high);
        sched.add_lane(&mut low);
        sched.add_task(Task::new("a", 0, &a), 0);
        sched.add_task(Task::new("b", 0, &b), 1);

        for _ in 0..3 {
            sched.run(0);
        }
        sched.run(1);
        assert_eq!(a_hits.get(), 3);
        assert_eq!(b_hits.get(), 1);
    }

    #[test]
    fn test_reset_stats_broadcast() {
        let ticks = Cell::new(0u64);
        let now = || ticks.get();
        let mut first = ExecLane::<1>::new();
        let mut second = ExecLane::<1>::new();
        let mut sched = Scheduler::new(&now);
        sched.add_lane(&mut first);
        sched.add_lane(&mut second);
        sched.add_task(Task::new("a", 0, &keep), 0);
        sched.add_task(Task::new("b", 0, &keep), 1);
        sched.run(0);
        sched.run(1);

        sched.reset_stats();
        for (_, lane) in sched.lanes() {
            assert!(!lane.watch().duration().is_seeded());
            assert!(!lane.tasks()[0].run_time().is_seeded());
        }
    }

    #[test]
    fn test_unset_clock_freezes_time() {
        let hits = Cell::new(0u32);
        let body = || {
            hits.set(hits.get() + 1);
            true
        };
        let mut lane = ExecLane::<1>::new();
        let mut sched = Scheduler::with_clock(Clock::unset());
        sched.add_lane(&mut lane);
        sched.add_task(Task::new("p", 5, &body), 0);
        for _ in 0..10 {
            sched.run(0);
        }
        assert_eq!(hits.get(), 0);
        assert_eq!(sched.clock().now(), 0);
    }

    #[test]
    fn test_lane_mut_and_snapshot() {
        let now = || 0u64;
        let mut lane = ExecLane::<3>::new();
        let mut sched = Scheduler::new(&now);
        sched.add_lane(&mut lane);
        assert!(sched.lane_mut(0).unwrap().add(Task::new("direct", 0, &keep)));
        assert!(sched.lane_mut(1).is_none());

        let snap = sched.lane(0).unwrap().snapshot();
        assert_eq!(snap.size, 1);
        assert_eq!(snap.capacity, 3);
        let ids: usize = sched.lanes().map(|(i, _)| i).sum();
        assert_eq!(ids, 0);
    }
}
