//! Instrumentation — rolling min/max/mean and stopwatches
//!
//! Used for diagnostics only; nothing in the dispatch path depends on
//! these numbers. Fixed windows, no allocation.
//!
//! Author: Moroya Sakamoto

use num_traits::{Bounded, Num, NumCast};

use crate::config::STAT_WINDOW;
use crate::timer::{Clock, Duration, Tick};

/// Min/max/mean over the last `W` samples
///
/// The first sample after construction or [`reset`](Self::reset) fills the
/// whole ring, so the mean is meaningful from sample one instead of being
/// diluted by zeros. Min and max track every sample since the last reset,
/// not only those still in the ring.
#[derive(Debug, Clone, Copy)]
pub struct RollingStatistic<T, const W: usize = STAT_WINDOW> {
    min: T,
    max: T,
    mean: T,
    seeded: bool,
    index: usize,
    ring: [T; W],
}

/// Copy of a statistic's headline numbers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatSummary<T> {
    pub min: T,
    pub max: T,
    pub mean: T,
}

impl<T, const W: usize> RollingStatistic<T, W>
where
    T: Copy + PartialOrd + Bounded + Num + NumCast,
{
    /// Empty (unseeded) statistic
    pub fn new() -> Self {
        Self {
            min: T::max_value(),
            max: T::min_value(),
            mean: T::zero(),
            seeded: false,
            index: 0,
            ring: [T::zero(); W],
        }
    }

    /// Fold one sample in, overwriting the oldest
    pub fn add(&mut self, value: T) {
        if !self.seeded {
            self.ring = [value; W];
            self.seeded = true;
        }
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
        self.ring[self.index] = value;
        self.index = (self.index + 1) % W;

        let sum = self.ring.iter().fold(T::zero(), |acc, &v| acc + v);
        self.mean = match T::from(W) {
            Some(n) => sum / n,
            None => sum,
        };
    }

    /// Add `value` and return the updated mean
    pub fn record(&mut self, value: T) -> T {
        self.add(value);
        self.mean
    }

    /// Back to the unseeded state
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn min(&self) -> T {
        self.min
    }

    pub fn max(&self) -> T {
        self.max
    }

    pub fn mean(&self) -> T {
        self.mean
    }

    /// Has at least one sample been added since the last reset?
    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    /// Window length
    pub const fn window(&self) -> usize {
        W
    }

    pub fn summary(&self) -> StatSummary<T> {
        StatSummary {
            min: self.min,
            max: self.max,
            mean: self.mean,
        }
    }
}

impl<T, const W: usize> Default for RollingStatistic<T, W>
where
    T: Copy + PartialOrd + Bounded + Num + NumCast,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Start/stop timer feeding one [`RollingStatistic`]
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    start: Tick,
    duration: RollingStatistic<Duration>,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self {
            start: 0,
            duration: RollingStatistic::new(),
        }
    }

    /// Mark the start of a measurement
    pub fn start(&mut self, clock: &Clock<'_>) {
        self.start = clock.now();
    }

    /// Close the measurement and record ticks since [`start`](Self::start)
    pub fn stop(&mut self, clock: &Clock<'_>) {
        self.duration.add(clock.elapsed(self.start));
    }

    /// Measure until the returned guard is dropped
    pub fn measure<'w, 'a>(&'w mut self, clock: &Clock<'a>) -> Measure<'w, 'a> {
        self.start(clock);
        Measure {
            watch: self,
            clock: *clock,
        }
    }

    /// Forget every recorded sample
    pub fn reset(&mut self) {
        self.duration.reset();
    }

    pub fn duration(&self) -> &RollingStatistic<Duration> {
        &self.duration
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Scope guard returned by [`Stopwatch::measure`]; stops the watch on drop
pub struct Measure<'w, 'a> {
    watch: &'w mut Stopwatch,
    clock: Clock<'a>,
}

impl Drop for Measure<'_, '_> {
    fn drop(&mut self) {
        self.watch.stop(&self.clock);
    }
}
