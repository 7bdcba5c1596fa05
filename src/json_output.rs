//! JSON rendering of the counter report
//!
//! Carries the same sections, preconditions and early exits as the text
//! report. A section skipped by an early exit is omitted from the output.

use crate::config::ReportConfig;
use crate::counter::Counter;
use crate::error::{CounterError, Result};
use crate::report::{retired_per_fetched, stall_percent};
use crate::stats::{Observation, ObservationStats};
use serde::{Deserialize, Serialize};

/// An observation series with its summary statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonSeries<T> {
    pub observations: Vec<T>,
    pub max: T,
    pub min: T,
    pub mean: f64,
    pub stdev: f64,
}

impl<T: Observation> JsonSeries<T> {
    fn from_series(series: &'static str, values: &[T]) -> Result<Self> {
        let stats = ObservationStats::from_series(series, values)?;
        Ok(Self {
            observations: values.to_vec(),
            max: stats.max,
            min: stats.min,
            mean: stats.mean,
            stdev: stats.stdev,
        })
    }
}

/// Cache request totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonCacheAccesses {
    pub total: u64,
    pub reads: u64,
    pub writes: u64,
    pub per_job: JsonSeries<u64>,
}

/// Cache miss totals and derived access time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonCacheMisses {
    pub total: u64,
    pub per_job: JsonSeries<u64>,
    pub amat: JsonSeries<f64>,
}

/// Instruction throughput
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonInstructions {
    pub retired: u64,
    pub retired_per_cycle: f64,
    pub retired_per_fetched: f64,
    pub branch_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scalar_load_store_stall_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_load_store_stall_rate: Option<f64>,
}

/// One stall reason
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonStall {
    pub name: String,
    pub cycles: u64,
    /// Integer percentage of total cycles
    pub percent: u64,
}

/// One functional unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonUnit {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    pub count: u64,
    pub instructions_per_cycle: f64,
    pub utilization_percent: f64,
}

/// Root JSON report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonReport {
    /// Crate version that produced the report
    pub version: String,
    /// Format name
    pub format: String,
    pub job_count: usize,
    pub cycles: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<JsonSeries<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_accesses: Option<JsonCacheAccesses>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_misses: Option<JsonCacheMisses>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<JsonInstructions>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stalls: Vec<JsonStall>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub units: Vec<JsonUnit>,
}

impl JsonReport {
    /// Build the report for `counter`
    pub fn from_counter(counter: &Counter, config: &ReportConfig) -> Result<Self> {
        if counter.toi_runtime_observations.is_empty() {
            return Err(CounterError::NoRuntimeObservations);
        }

        let mut report = Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "tbm-counter-json-v1".to_string(),
            job_count: counter.job_count(),
            cycles: counter.cycles,
            runtime: None,
            cache_accesses: None,
            cache_misses: None,
            instructions: None,
            stalls: Vec::new(),
            units: Vec::new(),
        };

        if counter.cycles == 0 {
            return Ok(report);
        }
        report.runtime = Some(JsonSeries::from_series(
            "execution time",
            &counter.toi_runtime_observations,
        )?);

        let accesses = counter.cache_accesses();
        if accesses == 0 {
            return Ok(report);
        }
        report.cache_accesses = Some(JsonCacheAccesses {
            total: accesses,
            reads: counter.cache_read_reqs_count,
            writes: counter.cache_write_reqs_count,
            per_job: JsonSeries::from_series(
                "cache access",
                &counter.toi_cacheaccess_observations,
            )?,
        });

        if counter.cache_miss_count == 0 {
            return Ok(report);
        }
        let amats = counter.compute_amat_with(&config.amat)?;
        report.cache_misses = Some(JsonCacheMisses {
            total: counter.cache_miss_count,
            per_job: JsonSeries::from_series("cache miss", &counter.toi_cachemiss_observations)?,
            amat: JsonSeries::from_series("AMAT", &amats)?,
        });

        let cycles = counter.cycles as f64;
        let stall_rate = |issued: u64, stalled: u64| {
            (issued != 0).then(|| stalled as f64 / issued as f64)
        };
        report.instructions = Some(JsonInstructions {
            retired: counter.retired_instruction_count,
            retired_per_cycle: counter.retired_instruction_count as f64 / cycles,
            retired_per_fetched: retired_per_fetched(counter, &config.report.fetch_unit)?,
            branch_count: counter.branch_count,
            scalar_load_store_stall_rate: stall_rate(
                counter.scalar_load_store,
                counter.scalar_load_store_stall,
            ),
            vector_load_store_stall_rate: stall_rate(
                counter.vector_load_store,
                counter.vector_load_store_stall,
            ),
        });

        report.stalls = counter
            .stalls
            .iter()
            .map(|(name, &stall)| JsonStall {
                name: name.clone(),
                cycles: stall,
                percent: stall_percent(stall, counter.cycles),
            })
            .collect();

        report.units = counter
            .utilizations
            .iter()
            .map(|(name, util)| JsonUnit {
                name: name.clone(),
                size: util.size,
                count: util.count,
                instructions_per_cycle: util.count as f64 / cycles,
                utilization_percent: util.utilization_percent(counter.cycles),
            })
            .collect();

        Ok(report)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
