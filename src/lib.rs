//! # Scheduling Experiment Analyzer Library
//!
//! Turns the per-request timing logs of a scheduling simulator into
//! comparative performance statistics: response and waiting time
//! distributions, throughput, parallel speedup and efficiency, and Jain's
//! fairness index.
//!
//! ## Supported Schedulers
//!
//! - **FCFS**: first-come-first-served
//! - **SJF**: shortest job first
//! - **RR**: round robin, optionally labelled with its time quantum
//!
//! ## Architecture Overview
//!
//! The analysis engine is pure and never touches disk or terminal:
//!
//! - `record`: request records and their batch validation
//! - `experiment`: typed run identities and experiment runs
//! - `metrics`: per-run statistics, computed in parallel with rayon
//! - `comparison`: ordered series, servers speedup/efficiency, baseline ranking
//! - `collection`: grouping of runs and the full analysis report
//!
//! Around it sits a thin I/O layer:
//!
//! - `loader`: simulator CSV logs into raw records
//! - `cli`: command-line arguments and validated configuration
//! - `results`: JSON document and CSV tables
//! - `report`: console tables
//!
//! ## Usage Example
//!
//! ```rust
//! use sched_analyzer::{Dimension, MetricsEngine, RawIdentity, RunCollectionBuilder, Scheduler};
//!
//! # fn main() -> sched_analyzer::Result<()> {
//! let mut builder = RunCollectionBuilder::new();
//! builder.add(
//!     &RawIdentity::new("fcfs", "baseline", None),
//!     vec![(0i64, 0i64, 10_000_000i64), (0, 0, 30_000_000)],
//! )?;
//! builder.mark_missing(Scheduler::Sjf, Dimension::Baseline);
//!
//! let report = builder.build().analyze(&MetricsEngine::new());
//! let fcfs = &report.baseline.as_ref().unwrap().entries[0];
//! assert_eq!(fcfs.metrics.mean_response_ms(), Some(20.0));
//! assert_eq!(fcfs.metrics.fairness_index(), Some(0.8));
//! assert_eq!(report.warnings.len(), 1);
//! # Ok(())
//! # }
//! ```

/// Run grouping and the analysis report
///
/// Groups runs by (scheduler, dimension), keeps baseline runs apart by
/// policy, tracks duplicate and missing groups, and drives the metrics
/// engine and aggregator over everything in one pass.
pub mod collection;

/// Comparative series and baseline ranking
///
/// Orders per-run metrics by the swept value, computes speedup and
/// efficiency for server sweeps, and picks per-metric winners among
/// baseline policies.
pub mod comparison;

/// Command-line interface and configuration
///
/// Parses `--run SCHED:DIM[:VALUE][:qQUANTUM]=PATH` arguments and converts
/// them into a validated `AnalysisConfig`.
pub mod cli;

pub mod error;

/// Run identities: scheduler, swept dimension and value
pub mod experiment;

/// Simulator CSV loading
pub mod loader;

pub mod logging;

/// Per-run derived metrics
///
/// Descriptive statistics over response times, linear-interpolation
/// percentiles, window throughput and Jain's fairness index. Empty runs
/// produce explicitly undefined statistics rather than zeros.
pub mod metrics;

/// Request records and batch validation
pub mod record;

/// Console report rendering
pub mod report;

/// JSON and CSV output
///
/// Writes the results document with reproducibility metadata, plus the
/// optional baseline summary and series tables.
pub mod results;

pub mod utils;

pub use collection::{AnalysisReport, RunCollection, RunCollectionBuilder, RunWarning};
pub use comparison::{BaselineComparison, BaselineEntry, ComparativeSeries, Scaling, SeriesPoint};
pub use error::{AnalysisError, Result};
pub use experiment::{Dimension, ExperimentId, ExperimentRun, RawIdentity, Scheduler};
pub use metrics::{compute_run_metrics, MetricsEngine, ResponsePercentiles, RunMetrics};
pub use record::{validate_batch, RawRecord, RequestKind, RequestRecord};
pub use results::ResultsManager;

/// The current version of the analyzer
///
/// Populated from Cargo.toml and recorded in every results document.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration values
pub mod defaults {
    /// Default output file name
    ///
    /// Results are written in JSON format for easy parsing by external tools.
    pub const OUTPUT_FILE: &str = "analysis_results.json";

    /// Response-time percentiles reported for every run.
    pub const REPORTED_PERCENTILES: [f64; 4] = [50.0, 90.0, 95.0, 99.0];
}
