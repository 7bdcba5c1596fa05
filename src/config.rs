//! Report configuration loaded from TOML
//!
//! # Example tbm-counter.toml
//!
//! ```toml
//! [amat]
//! hit_time = 1.0
//! miss_penalty = 10.0
//!
//! [report]
//! fetch_unit = "FE"
//! ```
//!
//! Every key is optional; defaults reproduce the built-in report.

use crate::counter::AmatModel;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Utilization unit whose `count` is the fetched-instruction total
pub const DEFAULT_FETCH_UNIT: &str = "FE";

/// Report layout options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSection {
    /// Unit used as the denominator of the retired/fetched ratio
    pub fetch_unit: String,
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            fetch_unit: DEFAULT_FETCH_UNIT.to_string(),
        }
    }
}

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub amat: AmatModel,
    pub report: ReportSection,
}

impl ReportConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML")
    }
}
