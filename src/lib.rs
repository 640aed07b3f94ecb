//! # load-inspector
//!
//! Post-processing for the load inspector instrumentation tool. The tool
//! dumps flat `key value` counters describing every memory load it observed;
//! this crate turns them into a single figure of five pie charts:
//!
//! 1. vector vs non-vector loads
//! 2. loads by access width (1B .. 64B)
//! 3. loads by addressing mode (PC-, stack-, register-relative)
//! 4. global-stable vs non-global-stable loads
//! 5. global-stable loads by addressing mode
//!
//! ## Pipeline
//!
//! [`StatRecord`] (parse) → [`AggregateCounters`] (sum key groups) →
//! [`PieChart`]s → image file ([`render_figure`]).
//!
//! ```no_run
//! use load_inspector::{run, RunConfig};
//!
//! let config = RunConfig::new("inspector.stats.txt", "inspector.stats.png");
//! let counters = run(&config)?;
//! println!("{} vector loads", counters.vector_loads);
//! # Ok::<(), load_inspector::InspectorError>(())
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod render;   // Pie geometry and plotters output
pub mod stats;    // `key value` stats file loading
pub mod summary;  // Counter aggregation

pub use render::{render_figure, FigureConfig, PieChart, RenderError, Slice};
pub use stats::{StatRecord, StatsError};
pub use summary::{AddressingMode, AggregateCounters, ConsistencyIssue, LoadSize, SummaryError};

use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Errors that abort a run.
#[derive(Error, Debug)]
pub enum InspectorError {
    /// Stats file could not be read or parsed.
    #[error(transparent)]
    Stats(#[from] StatsError),

    /// Stats file lacks a key needed by the charts.
    #[error(transparent)]
    Summary(#[from] SummaryError),

    /// Figure could not be written.
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Inputs of one post-processing run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Stats file written by the instrumentation.
    pub input: PathBuf,
    /// Image to produce; `.svg` selects vector output.
    pub output: PathBuf,
    /// Figure geometry.
    pub figure: FigureConfig,
}

impl RunConfig {
    /// Configuration with the default figure geometry.
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            figure: FigureConfig::default(),
        }
    }
}

/// Parse, aggregate and render in one pass.
///
/// All required keys are checked before anything is drawn, so a failed run
/// never leaves a partial image behind.
pub fn run(config: &RunConfig) -> Result<AggregateCounters, InspectorError> {
    let record = StatRecord::from_path(&config.input)?;

    let missing = summary::missing_keys(&record);
    if let Some(first) = missing.first() {
        for key in &missing {
            error!(key = %key, "required stats key missing");
        }
        return Err(SummaryError::MissingKey { key: first.clone() }.into());
    }

    let unused = summary::unused_keys(&record);
    if !unused.is_empty() {
        debug!(count = unused.len(), keys = ?unused, "stats keys not charted");
    }

    let counters = AggregateCounters::from_record(&record)?;
    for issue in counters.consistency_issues() {
        warn!("inconsistent stats: {issue}");
    }
    log_counters(&counters);

    render_figure(&counters.charts(), &config.output, &config.figure)?;
    Ok(counters)
}

fn log_counters(counters: &AggregateCounters) {
    info!(
        vector = counters.vector_loads,
        non_vector = counters.non_vector_loads,
        global_stable = counters.global_stable_loads,
        non_global_stable = counters.non_global_stable_loads,
        "load totals"
    );
    for mode in AddressingMode::ALL {
        info!(
            mode = %mode,
            loads = counters.loads_for_mode(mode),
            global_stable = counters.global_stable_for_mode(mode),
            "loads by addressing mode"
        );
    }
    for size in LoadSize::ALL {
        info!(size = %size, loads = counters.loads_for_size(size), "loads by size");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_config_uses_default_figure() {
        let config = RunConfig::new("in.txt", "out.png");
        assert_eq!(config.figure, FigureConfig::default());
        assert_eq!(config.output, PathBuf::from("out.png"));
    }

    #[test]
    fn missing_input_surfaces_as_stats_error() {
        let config = RunConfig::new("/no/such/dir/stats.txt", "/no/such/dir/out.png");
        let err = run(&config).unwrap_err();
        assert!(matches!(err, InspectorError::Stats(StatsError::NotFound { .. })));
    }
}
