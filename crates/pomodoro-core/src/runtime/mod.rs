//! `Scheduler` implementations.
//!
//! [`VirtualScheduler`] runs on a manually advanced clock and backs replays
//! and tests. [`LocalScheduler`] runs on a tokio current-thread runtime and
//! must be used from inside a `LocalSet`.

mod local;
mod virtual_clock;

pub use local::LocalScheduler;
pub use virtual_clock::VirtualScheduler;
