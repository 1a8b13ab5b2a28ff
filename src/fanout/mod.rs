//! Fan-out executor module
//!
//! Runs a batch of independent work units concurrently, waits for all of
//! them, and returns results aligned with submission order:
//! - [`executor`]: batch ceiling, join barrier, index-aligned assembly
//! - [`units`]: the unit kinds used by functions (timed, fetch, transform)

pub mod executor;
pub mod units;

pub use executor::{batch_envelope, FanOut};
