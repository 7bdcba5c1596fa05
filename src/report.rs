//! Human-readable counter report
//!
//! The report is strictly sequential: a section whose driving count is zero
//! ends the report early. It is rendered into memory first and only written
//! to the destination once every section has succeeded, so a broken
//! precondition never leaves partial output behind.
//!
//! Numeric formatting per line is part of the output contract (integer
//! stall percentages, 2 decimals for ratios, 3 for summary statistics).

use crate::config::ReportConfig;
use crate::counter::Counter;
use crate::error::{CounterError, Result};
use crate::stats::{format_list, format_rounded_list, ObservationStats};
use std::fmt::Write as _;
use std::io::Write;
use tracing::debug;

/// Integer percentage of `cycles` spent stalled (floor division).
///
/// Saturates at `u64::MAX` when `stall` exceeds `cycles` by enough.
pub fn stall_percent(stall: u64, cycles: u64) -> u64 {
    u64::try_from(u128::from(stall) * 100 / u128::from(cycles)).unwrap_or(u64::MAX)
}

/// Retired instructions over the fetch unit's instruction count
pub fn retired_per_fetched(counter: &Counter, fetch_unit: &str) -> Result<f64> {
    let fetched = counter
        .utilizations
        .get(fetch_unit)
        .ok_or_else(|| CounterError::MissingUtilization(fetch_unit.to_string()))?
        .count;
    if fetched == 0 {
        return Err(CounterError::ZeroDivisor {
            quantity: format!("{} instruction count", fetch_unit),
        });
    }
    Ok(counter.retired_instruction_count as f64 / fetched as f64)
}

impl Counter {
    /// Print the report with the default configuration
    pub fn print_report<W: Write>(&self, destination: &mut W) -> Result<()> {
        self.print_report_with(destination, &ReportConfig::default())
    }

    /// Print the report using `config`
    pub fn print_report_with<W: Write>(
        &self,
        destination: &mut W,
        config: &ReportConfig,
    ) -> Result<()> {
        let report = self.render_report(config)?;
        destination.write_all(report.as_bytes())?;
        destination.flush()?;
        Ok(())
    }

    /// Render the full report as a string
    pub fn render_report(&self, config: &ReportConfig) -> Result<String> {
        if self.toi_runtime_observations.is_empty() {
            return Err(CounterError::NoRuntimeObservations);
        }

        let mut out = String::new();
        write_sections(&mut out, self, config)?;
        Ok(out)
    }
}

fn write_sections(out: &mut String, c: &Counter, config: &ReportConfig) -> Result<()> {
    writeln!(out, "*** number of jobs: {}", c.job_count())?;

    writeln!(out, "\n*** cycles: {}", c.cycles)?;
    if c.cycles == 0 {
        debug!("zero cycles, report ends after cycle count");
        return Ok(());
    }
    write_observations(out, "execution time", &c.toi_runtime_observations)?;

    let accesses = c.cache_accesses();
    writeln!(out, "\n*** cache accesses: {}", accesses)?;
    if accesses == 0 {
        debug!("no cache accesses, report ends after cache access count");
        return Ok(());
    }
    writeln!(out, "  reads: {}", c.cache_read_reqs_count)?;
    writeln!(out, "  writes: {}", c.cache_write_reqs_count)?;
    write_observations(out, "cache access", &c.toi_cacheaccess_observations)?;

    writeln!(out, "\n*** cache misses: {}", c.cache_miss_count)?;
    if c.cache_miss_count == 0 {
        debug!("no cache misses, report ends after cache miss count");
        return Ok(());
    }
    write_observations(out, "cache miss", &c.toi_cachemiss_observations)?;

    let amats = c.compute_amat_with(&config.amat)?;
    writeln!(out, "\n*** AMAT observations: {}", format_rounded_list(&amats, 2))?;
    let stats = ObservationStats::from_series("AMAT", &amats)?;
    write_summary(
        out,
        &format!("{:.3}", stats.max),
        &format!("{:.3}", stats.min),
        &stats,
    )?;

    writeln!(
        out,
        "\n*** retired instructions per cycle: {:.2} ({})",
        c.retired_instruction_count as f64 / c.cycles as f64,
        c.retired_instruction_count
    )?;

    writeln!(
        out,
        "*** retired / fetched instructions: {:.2}",
        retired_per_fetched(c, &config.report.fetch_unit)?
    )?;

    writeln!(out, "*** branch count: {}", c.branch_count)?;

    if c.scalar_load_store != 0 {
        writeln!(
            out,
            "*** scalar load/store stall rate: {:.2} stalls per-instruction",
            c.scalar_load_store_stall as f64 / c.scalar_load_store as f64
        )?;
    }

    if c.vector_load_store != 0 {
        writeln!(
            out,
            "*** vector load/store stall rate: {:.2} stalls per-instruction",
            c.vector_load_store_stall as f64 / c.vector_load_store as f64
        )?;
    }

    writeln!(out)?;
    writeln!(out, "*** stall cycles:")?;
    for (name, &stall) in &c.stalls {
        writeln!(out, "  {}: {}% ({})", name, stall_percent(stall, c.cycles), stall)?;
    }

    writeln!(out)?;
    writeln!(out, "*** instructions per cycle:")?;
    for (name, util) in &c.utilizations {
        let ipc = util.count as f64 / c.cycles as f64;
        writeln!(out, "  {}: {:.2} ({})", name, ipc, util.count)?;
    }

    writeln!(out)?;
    writeln!(out, "*** utilization:")?;
    for (name, util) in &c.utilizations {
        writeln!(
            out,
            "  {}: {:.0}% ({})",
            name,
            util.utilization_percent(c.cycles),
            util.count
        )?;
    }

    Ok(())
}

/// Observation list followed by its summary statistics
fn write_observations(out: &mut String, series: &'static str, values: &[u64]) -> Result<()> {
    writeln!(out, "*** {} observations: {}", series, format_list(values))?;
    let stats = ObservationStats::from_series(series, values)?;
    write_summary(out, &stats.max.to_string(), &stats.min.to_string(), &stats)
}

fn write_summary<T>(out: &mut String, max: &str, min: &str, stats: &ObservationStats<T>) -> Result<()> {
    writeln!(out, "*** max. observation: {}", max)?;
    writeln!(out, "*** min. observation: {}", min)?;
    writeln!(out, "*** mean: {:.3}", stats.mean)?;
    writeln!(out, "*** stdev: {:.3}", stats.stdev)?;
    Ok(())
}
