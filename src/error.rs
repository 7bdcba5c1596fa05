//! Error taxonomy for counter aggregation and report rendering
//!
//! Every variant is a broken precondition on the caller's side: none of them
//! are retried or masked inside the crate.

use thiserror::Error;

/// Errors raised while merging counters or rendering a report
#[derive(Error, Debug)]
pub enum CounterError {
    #[error("utilization size mismatch: {left:?} != {right:?}")]
    UtilizationSizeMismatch {
        left: Option<u64>,
        right: Option<u64>,
    },

    #[error("utilization size mismatch for unit '{unit}': {left:?} != {right:?}")]
    UtilizationSizeConflict {
        unit: String,
        left: Option<u64>,
        right: Option<u64>,
    },

    #[error("stall key mismatch: missing {missing:?}, unexpected {unexpected:?}")]
    StallKeyMismatch {
        /// Keys present in the receiver but absent from the operand
        missing: Vec<String>,
        /// Keys present in the operand but absent from the receiver
        unexpected: Vec<String>,
    },

    #[error("No execution times observed")]
    NoRuntimeObservations,

    #[error("no {series} observations recorded")]
    EmptyObservations { series: &'static str },

    #[error("missing utilization unit: {0}")]
    MissingUtilization(String),

    #[error("division by zero: {quantity} is zero")]
    ZeroDivisor { quantity: String },

    #[error("counter overflow: {field} exceeds u64")]
    Overflow { field: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),
}

/// Result type for counter operations
pub type Result<T> = std::result::Result<T, CounterError>;

/// `a + b`, or an overflow error naming `field`
pub(crate) fn checked_sum(field: &str, a: u64, b: u64) -> Result<u64> {
    a.checked_add(b).ok_or_else(|| CounterError::Overflow {
        field: field.to_string(),
    })
}
