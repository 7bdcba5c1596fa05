#![no_main]

use libfuzzer_sys::fuzz_target;
use tbm_counter::config::ReportConfig;
use tbm_counter::jobs::{parse_job, JobAggregator};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Malformed jobs must be rejected, never panic
        if let Ok(job) = parse_job(input) {
            let mut aggregator = JobAggregator::new();
            if aggregator.add_job(&job).is_ok() {
                let _ = aggregator.into_total().render_report(&ReportConfig::default());
            }
        }
    }
});
