use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use tbm_counter::cli::{Cli, OutputFormat};
use tbm_counter::config::ReportConfig;
use tbm_counter::jobs::JobAggregator;
use tbm_counter::json_output::JsonReport;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Render the report in the requested format
fn render(
    total: &tbm_counter::Counter,
    config: &ReportConfig,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(total.render_report(config)?),
        OutputFormat::Json => {
            let mut json = JsonReport::from_counter(total, config)?.to_json()?;
            json.push('\n');
            Ok(json)
        }
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let config = match &args.config {
        Some(path) => ReportConfig::from_file(path)?,
        None => ReportConfig::default(),
    };

    let mut aggregator = JobAggregator::new();
    aggregator.add_job_files(args.jobs.as_slice())?;
    let total = aggregator.into_total();

    // Render fully before touching the destination
    let report = render(&total, &config, args.format)?;

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            writer.write_all(report.as_bytes())?;
            writer.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(report.as_bytes())?;
            handle.flush()?;
        }
    }

    Ok(())
}
