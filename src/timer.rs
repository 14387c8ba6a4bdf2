//! Clock — injected tick source
//!
//! tickwork never reads hardware itself. The host hands over a `now`
//! function once (SysTick counter, RTC, MTIME, a test cell...) and every
//! duration in the crate is derived from it. The clock is a plain `Copy`
//! value passed by reference, never a global.
//!
//! Author: Moroya Sakamoto

use core::fmt;

/// Absolute time, in host ticks
pub type Tick = u64;

/// Signed tick difference
pub type Duration = i64;

/// Time source handed to the scheduler by the host
pub type NowFn<'a> = &'a dyn Fn() -> Tick;

/// Tick source wrapper
///
/// Size: two words. Without a source every read returns 0, so the
/// scheduler stays usable (if frozen) before the host finished wiring.
#[derive(Clone, Copy)]
pub struct Clock<'a> {
    source: Option<NowFn<'a>>,
}

impl<'a> Clock<'a> {
    /// Clock reading from `source`
    pub const fn new(source: NowFn<'a>) -> Self {
        Self {
            source: Some(source),
        }
    }

    /// Clock with no source; `now()` is always 0
    pub const fn unset() -> Self {
        Self { source: None }
    }

    /// Is a source installed?
    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    /// Current tick count
    pub fn now(&self) -> Tick {
        match self.source {
            Some(source) => source(),
            None => 0,
        }
    }

    /// Signed ticks since `start`
    ///
    /// Negative if the source went backwards.
    pub fn elapsed(&self, start: Tick) -> Duration {
        (self.now() as Duration).wrapping_sub(start as Duration)
    }

    /// Absolute tick `delay` ticks from now
    pub fn make_deadline(&self, delay: Tick) -> Tick {
        self.now().saturating_add(delay)
    }

    /// Has `deadline` been reached?
    pub fn is_expired(&self, deadline: Tick) -> bool {
        self.now() >= deadline
    }
}

impl Default for Clock<'_> {
    fn default() -> Self {
        Self::unset()
    }
}

impl fmt::Debug for Clock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clock")
            .field("has_source", &self.has_source())
            .finish()
    }
}

/// Millisecond source for hosted builds
///
/// Lets a desktop simulation drive the scheduler from wall time:
///
/// ```ignore
/// let mono = Monotonic::new();
/// let now = || mono.millis();
/// let sched = Scheduler::new(&now);
/// ```
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct Monotonic {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl Monotonic {
    /// Start counting from the moment of construction
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }

    /// Milliseconds since construction
    pub fn millis(&self) -> Tick {
        self.origin.elapsed().as_millis() as Tick
    }

    /// Microseconds since construction
    pub fn micros(&self) -> Tick {
        self.origin.elapsed().as_micros() as Tick
    }
}

#[cfg(feature = "std")]
impl Default for Monotonic {
    fn default() -> Self {
        Self::new()
    }
}
