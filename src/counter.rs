//! Aggregation scope for one job or a running cross-job total
//!
//! A `Counter` owns its stall and utilization maps outright. Merging copies
//! values into the receiver and never aliases the operand's containers.

use crate::error::{checked_sum, CounterError, Result};
use crate::utilization::Utilization;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Latency model used to derive average memory access time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmatModel {
    /// Cycles for a cache hit
    pub hit_time: f64,
    /// Extra cycles paid on a miss
    pub miss_penalty: f64,
}

impl Default for AmatModel {
    fn default() -> Self {
        Self {
            hit_time: 1.0,
            miss_penalty: 10.0,
        }
    }
}

impl AmatModel {
    /// AMAT for one (misses, accesses) observation pair
    pub fn amat(&self, misses: u64, accesses: u64) -> Result<f64> {
        if accesses == 0 {
            return Err(CounterError::ZeroDivisor {
                quantity: "cache accesses".to_string(),
            });
        }
        let miss_rate = misses as f64 / accesses as f64;
        Ok(self.hit_time + miss_rate * self.miss_penalty)
    }
}

/// Performance counters for one aggregation scope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Counter {
    pub cycles: u64,

    pub toi_runtime_observations: Vec<u64>,
    pub toi_cachemiss_observations: Vec<u64>,
    pub toi_cacheaccess_observations: Vec<u64>,
    // Window bookkeeping owned by the driver; never transitioned here
    pub toi_start: u64,
    pub toi_end1: u64,
    pub toi_end2: u64,
    pub is_in_toi: bool,

    pub retired_instruction_count: u64,

    pub branch_count: u64,

    pub cache_miss_count: u64,
    pub cache_read_reqs_count: u64,
    pub cache_write_reqs_count: u64,

    /// Stall reason -> stalled cycles, in insertion order
    pub stalls: IndexMap<String, u64>,

    /// Unit name -> occupancy, in insertion order
    pub utilizations: IndexMap<String, Utilization>,

    pub scalar_load_store: u64,
    pub scalar_load_store_stall: u64,

    pub vector_load_store: u64,
    pub vector_load_store_stall: u64,
}

impl Counter {
    /// Create an empty counter
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed every expected stall key to zero
    pub fn with_stall_keys<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reset_stalls(names);
        self
    }

    /// Seed a zeroed utilization unit
    pub fn with_utilization(mut self, name: impl Into<String>, size: Option<u64>) -> Self {
        self.utilizations.insert(name.into(), Utilization::new(size));
        self
    }

    /// Replace the stall map with the given keys, all zeroed.
    ///
    /// Every scope that will be merged together must be reset with the same
    /// key set.
    pub fn reset_stalls<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stalls = names.into_iter().map(|n| (n.into(), 0)).collect();
    }

    /// Number of jobs observed (one runtime observation per job)
    pub fn job_count(&self) -> usize {
        self.toi_runtime_observations.len()
    }

    /// Total cache requests (reads + writes)
    pub fn cache_accesses(&self) -> u64 {
        self.cache_read_reqs_count.saturating_add(self.cache_write_reqs_count)
    }

    /// Mark the start of a time-of-interest window
    pub fn enter_toi(&mut self, start: u64) {
        self.toi_start = start;
        self.is_in_toi = true;
    }

    /// Mark the end of the current time-of-interest window
    pub fn exit_toi(&mut self, end1: u64, end2: u64) {
        self.toi_end1 = end1;
        self.toi_end2 = end2;
        self.is_in_toi = false;
    }

    /// Append one job's observations recorded inside the window
    pub fn record_toi_observation(&mut self, runtime: u64, cache_misses: u64, cache_accesses: u64) {
        self.toi_runtime_observations.push(runtime);
        self.toi_cachemiss_observations.push(cache_misses);
        self.toi_cacheaccess_observations.push(cache_accesses);
    }

    /// Accumulate `other` into `self`.
    ///
    /// Preconditions, checked before anything is mutated:
    /// - `stalls` key sets are identical on both sides (seeded by
    ///   [`Counter::reset_stalls`]); they are never unioned.
    /// - utilization units present on both sides have equal `size`.
    /// - no accumulated value exceeds `u64`.
    ///
    /// Units only present in `other` are adopted. Observation sequences, cache
    /// event counters and window bookkeeping are left to the driver.
    pub fn merge_in_place(&mut self, other: &Counter) -> Result<&mut Self> {
        self.check_stall_keys(other)?;
        self.check_utilization_sizes(other)?;

        let cycles = checked_sum("cycles", self.cycles, other.cycles)?;
        let retired = checked_sum(
            "retired_instruction_count",
            self.retired_instruction_count,
            other.retired_instruction_count,
        )?;
        let branches = checked_sum("branch_count", self.branch_count, other.branch_count)?;
        let scalar = checked_sum(
            "scalar_load_store",
            self.scalar_load_store,
            other.scalar_load_store,
        )?;
        let scalar_stall = checked_sum(
            "scalar_load_store_stall",
            self.scalar_load_store_stall,
            other.scalar_load_store_stall,
        )?;
        let vector = checked_sum(
            "vector_load_store",
            self.vector_load_store,
            other.vector_load_store,
        )?;
        let vector_stall = checked_sum(
            "vector_load_store_stall",
            self.vector_load_store_stall,
            other.vector_load_store_stall,
        )?;

        let stalls = other
            .stalls
            .iter()
            .map(|(key, &val)| {
                let current = self.stalls.get(key).copied().unwrap_or(0);
                checked_sum(&format!("stalls.{}", key), current, val).map(|sum| (key, sum))
            })
            .collect::<Result<Vec<_>>>()?;

        let units = other
            .utilizations
            .iter()
            .map(|(name, util)| -> Result<(&String, Utilization)> {
                let mut merged = match self.utilizations.get(name) {
                    Some(existing) => existing.clone(),
                    None => Utilization::new(util.size),
                };
                merged.merge_in_place(util).map_err(|e| match e {
                    CounterError::Overflow { field } => CounterError::Overflow {
                        field: format!("utilizations.{}.{}", name, field),
                    },
                    err => err,
                })?;
                Ok((name, merged))
            })
            .collect::<Result<Vec<_>>>()?;

        self.cycles = cycles;

        self.retired_instruction_count = retired;

        self.branch_count = branches;

        for (key, val) in stalls {
            if let Some(stall) = self.stalls.get_mut(key) {
                *stall = val;
            }
        }

        for (name, util) in units {
            if !self.utilizations.contains_key(name) {
                trace!(unit = %name, "adopting utilization unit");
            }
            self.utilizations.insert(name.clone(), util);
        }

        self.scalar_load_store = scalar;
        self.scalar_load_store_stall = scalar_stall;

        self.vector_load_store = vector;
        self.vector_load_store_stall = vector_stall;

        debug!(
            cycles = other.cycles,
            total_cycles = self.cycles,
            units = self.utilizations.len(),
            "merged counter"
        );

        Ok(self)
    }

    fn check_stall_keys(&self, other: &Counter) -> Result<()> {
        let missing: Vec<String> = self
            .stalls
            .keys()
            .filter(|k| !other.stalls.contains_key(*k))
            .cloned()
            .collect();
        let unexpected: Vec<String> = other
            .stalls
            .keys()
            .filter(|k| !self.stalls.contains_key(*k))
            .cloned()
            .collect();

        if missing.is_empty() && unexpected.is_empty() {
            Ok(())
        } else {
            Err(CounterError::StallKeyMismatch {
                missing,
                unexpected,
            })
        }
    }

    fn check_utilization_sizes(&self, other: &Counter) -> Result<()> {
        for (name, util) in &other.utilizations {
            if let Some(existing) = self.utilizations.get(name) {
                if existing.size != util.size {
                    return Err(CounterError::UtilizationSizeConflict {
                        unit: name.clone(),
                        left: existing.size,
                        right: util.size,
                    });
                }
            }
        }
        Ok(())
    }

    /// Average memory access time per observation, with the default model
    /// (hit time 1, miss penalty 10).
    pub fn compute_amat(&self) -> Result<Vec<f64>> {
        self.compute_amat_with(&AmatModel::default())
    }

    /// Average memory access time per paired (miss, access) observation.
    ///
    /// Pairs are taken index by index; the result has the length of the
    /// shorter sequence.
    pub fn compute_amat_with(&self, model: &AmatModel) -> Result<Vec<f64>> {
        let amats = self
            .toi_cachemiss_observations
            .iter()
            .zip(&self.toi_cacheaccess_observations)
            .map(|(&misses, &accesses)| model.amat(misses, accesses))
            .collect::<Result<Vec<f64>>>()?;
        trace!(observations = amats.len(), "computed AMAT");
        Ok(amats)
    }
}
