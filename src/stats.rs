//! Summary statistics over stored observation sequences
//!
//! Statistics are recomputed from the full sequence every time; no running
//! aggregates are kept.

use crate::error::{CounterError, Result};
use std::fmt;

/// A value that can appear in an observation series
pub trait Observation: Copy + PartialOrd + fmt::Debug {
    fn as_f64(self) -> f64;

    /// Text used when the series is listed
    fn repr(self) -> String;
}

impl Observation for u64 {
    fn as_f64(self) -> f64 {
        self as f64
    }

    fn repr(self) -> String {
        self.to_string()
    }
}

impl Observation for f64 {
    fn as_f64(self) -> f64 {
        self
    }

    fn repr(self) -> String {
        float_repr(self)
    }
}

/// Shortest round-trip form with a signed, two-digit exponent
/// (`2.0`, `1e+17`, `1.5e-07`)
pub fn float_repr(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    let debug = format!("{:?}", value);
    match debug.split_once('e') {
        Some((mantissa, exp)) => match exp.parse::<i32>() {
            Ok(exp) => format!(
                "{}e{}{:02}",
                mantissa,
                if exp < 0 { '-' } else { '+' },
                exp.unsigned_abs()
            ),
            Err(_) => debug,
        },
        None => debug,
    }
}

/// Max, min, mean and population standard deviation of a series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservationStats<T> {
    pub max: T,
    pub min: T,
    pub mean: f64,
    pub stdev: f64,
}

impl<T: Observation> ObservationStats<T> {
    /// Compute statistics for `values`; `series` names it in the error
    pub fn from_series(series: &'static str, values: &[T]) -> Result<Self> {
        let (&first, rest) = values
            .split_first()
            .ok_or(CounterError::EmptyObservations { series })?;

        let mut max = first;
        let mut min = first;
        for &v in rest {
            if v > max {
                max = v;
            }
            if v < min {
                min = v;
            }
        }

        let mean = mean(values);
        let stdev = population_stdev(values, mean);

        Ok(Self {
            max,
            min,
            mean,
            stdev,
        })
    }
}

fn mean<T: Observation>(values: &[T]) -> f64 {
    values.iter().map(|v| v.as_f64()).sum::<f64>() / values.len() as f64
}

fn population_stdev<T: Observation>(values: &[T], mean: f64) -> f64 {
    let variance = values
        .iter()
        .map(|v| {
            let d = v.as_f64() - mean;
            d * d
        })
        .sum::<f64>()
        / values.len() as f64;
    variance.sqrt()
}

/// Round to `decimals` places, ties to even on the exact binary value
/// (`1.125` -> `1.12`, `1.375` -> `1.38`)
pub fn round_to(value: f64, decimals: usize) -> f64 {
    format!("{:.*}", decimals, value).parse().unwrap_or(value)
}

/// Render a series as `[a, b, c]`
pub fn format_list<T: Observation>(values: &[T]) -> String {
    let items: Vec<String> = values.iter().map(|v| v.repr()).collect();
    format!("[{}]", items.join(", "))
}

/// Render a float series rounded to `decimals` places, e.g. `[2.0, 1.55]`
pub fn format_rounded_list(values: &[f64], decimals: usize) -> String {
    let rounded: Vec<f64> = values.iter().map(|&v| round_to(v, decimals)).collect();
    format_list(&rounded)
}
