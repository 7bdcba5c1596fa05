//! tbm-counter - performance counter aggregation for benchmark runs
//!
//! Accumulates per-job measurements (cycles, cache events, pipeline stalls,
//! functional-unit utilization) into a running total and renders a
//! statistical report over the recorded observations.

pub mod cli;
pub mod config;
pub mod counter;
pub mod error;
pub mod jobs;
pub mod json_output;
pub mod report;
pub mod stats;
pub mod utilization;

pub use counter::{AmatModel, Counter};
pub use error::CounterError;
pub use utilization::Utilization;
