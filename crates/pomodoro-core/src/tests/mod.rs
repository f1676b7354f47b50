//! Test module for pomodoro-core
//!
//! Scenario tests for the break dialog on the simulated desktop:
//! - Lifecycle transitions and fade reversal
//! - Modal grab acquisition, retry and give-up
//! - Opening for idle users and closing for returning ones
//! - Input classification through the overlay
//! - Teardown and leak checks

// Test modules use exact float comparisons and test-specific casts
#![allow(clippy::float_cmp, clippy::cast_possible_truncation)]

mod modal_tests;
