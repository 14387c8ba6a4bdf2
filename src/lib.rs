//! tickwork — cooperative task scheduler for bare-metal targets
//!
//! Register periodic, one-shot and phase-aligned jobs and drive them from
//! your own tick source and main loop (or timer interrupt):
//! - Static task tables (no heap, no allocation, ever)
//! - One task per dispatch call, round-robin within a lane
//! - Relative (`period > 0`) or clock-aligned (`period < 0`) periods,
//!   with missed deadlines reported instead of silently absorbed
//! - Per-lane critical section hooks for interrupt-safe control
//!
//! ```ignore
//! let now = || SYSTICK.load(Ordering::Relaxed);
//! let mut lane = ExecLane::<8>::new();
//! let mut sched = Scheduler::new(&now);
//! sched.add_lane(&mut lane);
//! sched.add_task(Task::new("blink", 500, &blink), 0);
//! loop {
//!     sched.run(0);
//! }
//! ```
//!
//! Author: Moroya Sakamoto

#![no_std]

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod config;
pub mod error;
pub mod timer;
pub mod stats;
pub mod task;
pub mod stage;
pub mod lane;
pub mod scheduler;

pub use error::SchedError;
pub use timer::{Clock, Duration, Tick};
pub use stats::{RollingStatistic, StatSummary, Stopwatch};
pub use task::{Status, Task, TaskFn, TaskName, TaskSnapshot};
pub use stage::{Direction, Stage, StepFn};
pub use lane::{CriticalSection, ExecLane, Lane, LaneSnapshot};
pub use scheduler::Scheduler;
