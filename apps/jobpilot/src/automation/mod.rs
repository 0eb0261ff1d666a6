//! Daily automation: the per-profile pipeline, the multi-user fan-out and
//! the scheduler that triggers them.

pub mod handlers;
pub mod pipeline;
pub mod scheduler;

pub use pipeline::{Pipeline, RunSummary, SearchOverrides};
pub use scheduler::{parse_schedule, run_daily};
