// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod blob;
pub mod completion;
pub mod compose;
pub mod config;
pub mod error;
pub mod fetch;
pub mod normalize;
pub mod pipeline;
pub mod prompt;
pub mod publish;
pub mod reconcile;
pub mod slots;
pub mod validate;

// ---- Re-exports for stable public API ----
pub use crate::config::{ForecastConfig, Schema};
pub use crate::error::{AbortReason, SkipReason};
pub use crate::pipeline::{run, run_from_env, RunClock, RunOutcome};
