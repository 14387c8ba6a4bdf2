//! Scheduler errors
//!
//! The control surface reports failure with `bool`; the `try_*` forms
//! return these instead so a caller can tell the reasons apart.

use core::fmt;

/// Result alias for the `try_*` operations
pub type Result<T> = core::result::Result<T, SchedError>;

/// Why an insertion was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedError {
    /// Every task slot in the lane is occupied
    LaneFull,
    /// Every scheduler registry slot holds a lane
    RegistryFull,
    /// Lane index out of range or not registered
    NoSuchLane,
}

impl fmt::Display for SchedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedError::LaneFull => f.write_str("lane has no free task slot"),
            SchedError::RegistryFull => f.write_str("scheduler lane registry is full"),
            SchedError::NoSuchLane => f.write_str("no lane registered at that index"),
        }
    }
}
