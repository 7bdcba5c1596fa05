//! Job loading and cross-job accumulation
//!
//! Each job is a JSON-serialized [`Counter`]. The aggregator merges every job
//! into a running total with [`Counter::merge_in_place`] and then, on the
//! driver side, appends the job's window observations and cache event counts,
//! which the merge itself leaves alone.

use crate::counter::Counter;
use crate::error::checked_sum;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Parse one job counter from a JSON file
pub fn load_job<P: AsRef<Path>>(path: P) -> Result<Counter> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read job file {}", path.display()))?;
    parse_job(&contents).with_context(|| format!("Invalid job file {}", path.display()))
}

/// Parse one job counter from JSON text
pub fn parse_job(contents: &str) -> Result<Counter> {
    serde_json::from_str(contents).context("Invalid job counter JSON")
}

/// Running total across jobs
#[derive(Debug, Default)]
pub struct JobAggregator {
    total: Option<Counter>,
    jobs: usize,
}

impl JobAggregator {
    /// Create an empty aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a pre-seeded total (stall keys and units already reset)
    pub fn with_total(total: Counter) -> Self {
        Self {
            total: Some(total),
            jobs: 0,
        }
    }

    /// Accumulate one job.
    ///
    /// Without a seeded total, the first job's stall keys become the
    /// expected key set for every later job.
    pub fn add_job(&mut self, job: &Counter) -> Result<()> {
        let total = self.total.get_or_insert_with(|| {
            let mut seed = Counter::new();
            seed.reset_stalls(job.stalls.keys().cloned());
            seed
        });

        // Driver-side sums are checked up front so a failed job changes nothing
        let job_number = self.jobs + 1;
        let context = || format!("Failed to merge job {}", job_number);
        let misses = checked_sum("cache_miss_count", total.cache_miss_count, job.cache_miss_count)
            .with_context(context)?;
        let reads = checked_sum(
            "cache_read_reqs_count",
            total.cache_read_reqs_count,
            job.cache_read_reqs_count,
        )
        .with_context(context)?;
        let writes = checked_sum(
            "cache_write_reqs_count",
            total.cache_write_reqs_count,
            job.cache_write_reqs_count,
        )
        .with_context(context)?;

        total.merge_in_place(job).with_context(context)?;

        total
            .toi_runtime_observations
            .extend_from_slice(&job.toi_runtime_observations);
        total
            .toi_cachemiss_observations
            .extend_from_slice(&job.toi_cachemiss_observations);
        total
            .toi_cacheaccess_observations
            .extend_from_slice(&job.toi_cacheaccess_observations);

        total.cache_miss_count = misses;
        total.cache_read_reqs_count = reads;
        total.cache_write_reqs_count = writes;

        self.jobs += 1;
        debug!(job = self.jobs, cycles = job.cycles, "accumulated job");
        Ok(())
    }

    /// Load and accumulate every job file in order
    pub fn add_job_files<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<()> {
        for path in paths {
            let job = load_job(path)?;
            self.add_job(&job)?;
        }
        info!(jobs = self.jobs, "loaded job counters");
        Ok(())
    }

    /// Number of jobs accumulated so far
    pub fn job_count(&self) -> usize {
        self.jobs
    }

    /// The running total, if any job (or seed) has been added
    pub fn total(&self) -> Option<&Counter> {
        self.total.as_ref()
    }

    /// Consume the aggregator, returning the total
    pub fn into_total(self) -> Counter {
        self.total.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn job(cycles: u64, runtime: u64) -> Counter {
        let mut c = Counter::new().with_stall_keys(["lsu", "fetch"]);
        c.cycles = cycles;
        c.record_toi_observation(runtime, 1, 10);
        c.cache_read_reqs_count = 10;
        c.cache_miss_count = 1;
        c
    }

    #[test]
    fn test_aggregates_two_jobs() {
        let mut agg = JobAggregator::new();
        agg.add_job(&job(100, 5)).unwrap();
        agg.add_job(&job(200, 7)).unwrap();

        assert_eq!(agg.job_count(), 2);
        let total = agg.into_total();
        assert_eq!(total.cycles, 300);
        assert_eq!(total.toi_runtime_observations, vec![5, 7]);
        assert_eq!(total.toi_cacheaccess_observations, vec![10, 10]);
        assert_eq!(total.cache_read_reqs_count, 20);
        assert_eq!(total.cache_miss_count, 2);
        assert_eq!(total.stalls.keys().collect::<Vec<_>>(), vec!["lsu", "fetch"]);
    }

    #[test]
    fn test_first_job_fixes_stall_keys() {
        let mut agg = JobAggregator::new();
        agg.add_job(&job(100, 5)).unwrap();

        let mut odd = job(100, 5);
        odd.reset_stalls(["lsu"]);
        let err = agg.add_job(&odd).unwrap_err();
        assert!(format!("{:#}", err).contains("stall key mismatch"));
        assert_eq!(agg.job_count(), 1);
    }

    #[test]
    fn test_cache_count_overflow_rejects_job() {
        let mut agg = JobAggregator::new();
        let mut first = job(100, 5);
        first.cache_read_reqs_count = u64::MAX;
        agg.add_job(&first).unwrap();

        let err = agg.add_job(&job(200, 7)).unwrap_err();
        assert!(format!("{:#}", err).contains("counter overflow: cache_read_reqs_count"));
        assert_eq!(agg.job_count(), 1);

        let total = agg.into_total();
        assert_eq!(total.cycles, 100);
        assert_eq!(total.toi_runtime_observations, vec![5]);
    }

    #[test]
    fn test_seeded_total() {
        let seed = Counter::new()
            .with_stall_keys(["lsu", "fetch"])
            .with_utilization("FE", Some(1));
        let mut agg = JobAggregator::with_total(seed);
        agg.add_job(&job(10, 1)).unwrap();
        assert!(agg.total().unwrap().utilizations.contains_key("FE"));
    }

    #[test]
    fn test_empty_aggregator_total_is_default() {
        assert_eq!(JobAggregator::new().into_total(), Counter::default());
    }

    #[test]
    fn test_parse_job_partial_fields() {
        let c = parse_job(r#"{"cycles": 12, "stalls": {"b": 1, "a": 2}}"#).unwrap();
        assert_eq!(c.cycles, 12);
        assert_eq!(c.stalls.keys().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn test_parse_job_invalid() {
        assert!(parse_job("{not json").is_err());
        assert!(parse_job(r#"{"cycles": -1}"#).is_err());
    }

    #[test]
    fn test_load_job_files() {
        let mut first = NamedTempFile::new().unwrap();
        write!(first, "{}", serde_json::to_string(&job(100, 5)).unwrap()).unwrap();
        let mut second = NamedTempFile::new().unwrap();
        write!(second, "{}", serde_json::to_string(&job(200, 7)).unwrap()).unwrap();

        let mut agg = JobAggregator::new();
        agg.add_job_files(&[first.path(), second.path()]).unwrap();
        assert_eq!(agg.total().unwrap().cycles, 300);
    }

    #[test]
    fn test_load_missing_job_file() {
        let err = load_job("/nonexistent/job.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read job file"));
    }
}
