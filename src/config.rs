//! Compile-time configuration
//!
//! Every capacity in tickwork is fixed at build time. Lane capacity is a
//! const generic on [`ExecLane`](crate::lane::ExecLane); the rest lives here.
//!
//! Author: Moroya Sakamoto

use static_assertions::const_assert;

/// Addressable task-name length (bytes)
///
/// Names longer than this are truncated on construction, and control
/// operations compare only this many bytes.
pub const NAME_LEN: usize = 8;

/// Lanes a [`Scheduler`](crate::scheduler::Scheduler) can register
pub const MAX_LANES: usize = 8;

/// Samples kept by a [`RollingStatistic`](crate::stats::RollingStatistic)
pub const STAT_WINDOW: usize = 32;

const_assert!(NAME_LEN > 0);
const_assert!(MAX_LANES > 0 && MAX_LANES <= u8::MAX as usize);
const_assert!(STAT_WINDOW > 0);
