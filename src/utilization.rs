//! Functional-unit occupancy accumulator

use crate::error::{checked_sum, CounterError, Result};
use serde::{Deserialize, Serialize};

/// Occupancy of one functional/pipeline unit over a measurement window
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Utilization {
    /// Capacity denominator (e.g. issue width). `None` normalizes per cycle.
    pub size: Option<u64>,
    /// Instructions issued/retired by the unit
    pub count: u64,
    /// Occupied slot-cycles
    pub occupied: u64,
}

impl Utilization {
    /// Create a zeroed unit with the given capacity
    pub fn new(size: Option<u64>) -> Self {
        Self {
            size,
            count: 0,
            occupied: 0,
        }
    }

    /// Percentage of available slot-cycles that were occupied.
    ///
    /// `cycles` must be non-zero; the caller owns that precondition.
    pub fn utilization_percent(&self, cycles: u64) -> f64 {
        debug_assert!(cycles > 0, "utilization_percent requires cycles > 0");
        match self.size {
            Some(size) => self.occupied as f64 * 100.0 / (cycles as f64 * size as f64),
            None => self.occupied as f64 * 100.0 / cycles as f64,
        }
    }

    /// Accumulate `other` into `self`.
    ///
    /// Both sides must describe the same unit configuration (equal `size`).
    /// On error the receiver is left unchanged.
    pub fn merge_in_place(&mut self, other: &Utilization) -> Result<&mut Self> {
        if self.size != other.size {
            return Err(CounterError::UtilizationSizeMismatch {
                left: self.size,
                right: other.size,
            });
        }

        let count = checked_sum("count", self.count, other.count)?;
        let occupied = checked_sum("occupied", self.occupied, other.occupied)?;

        self.count = count;
        self.occupied = occupied;

        Ok(self)
    }
}
