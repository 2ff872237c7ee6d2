//! Permit-bounded fan-out of target synchronizations.
//!
//! Admits at most C units at once via counting permits, joins on completion,
//! and folds each unit's timing and on-disk footprint into the shared
//! progress tally.

mod parallel;
mod permit;
mod progress;

pub use parallel::run_targets;
pub use permit::{SyncPermit, SyncPermits};
pub use progress::{ProgressSnapshot, ProgressTracker};
