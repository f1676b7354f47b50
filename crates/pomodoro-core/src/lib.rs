pub mod collab;
pub mod config;
pub mod runtime;
pub mod scenario;
pub mod signal;
pub mod sim;

mod dialog;
mod error;

#[cfg(test)]
mod tests;

pub use dialog::{
    AutoOpenGuard, BreakDialog, BreakGuard, GuardContext, InputFilter, SkipReason, Verdict,
};
pub use error::{Error, Result};

pub use pomodoro_types::*;
