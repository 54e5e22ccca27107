//! Persisting analysis output.
//!
//! [`ResultsManager`] writes the JSON results document and, when requested,
//! two CSV tables: a baseline policy summary and a flat dump of every series
//! point.

use crate::collection::AnalysisReport;
use crate::comparison::{BaselineComparison, ComparativeSeries};
use crate::experiment::{Dimension, Scheduler};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A run that could not be loaded or validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRun {
    /// The run as named on the command line.
    pub run: String,
    pub error: String,
}

/// System information for reproducibility
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os: String,
    pub architecture: String,
    pub cpu_cores: usize,
    pub analyzer_version: String,
}

impl SystemInfo {
    pub fn collect() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            architecture: std::env::consts::ARCH.to_string(),
            cpu_cores: num_cpus::get(),
            analyzer_version: crate::VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub total_runs: usize,
    pub system_info: SystemInfo,
}

/// Top-level JSON results document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisDocument {
    pub metadata: AnalysisMetadata,
    pub report: AnalysisReport,
    pub rejected: Vec<RejectedRun>,
}

/// One row of the baseline summary table.
#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    #[serde(rename = "Policy")]
    policy: &'a str,
    #[serde(rename = "Requests")]
    requests: usize,
    #[serde(rename = "Mean Response (ms)")]
    mean_response: String,
    #[serde(rename = "Median Response (ms)")]
    median_response: String,
    #[serde(rename = "Std Dev (ms)")]
    std_dev: String,
    #[serde(rename = "Mean Waiting (ms)")]
    mean_waiting: String,
    #[serde(rename = "Throughput (req/s)")]
    throughput: String,
}

/// One row of the flat series table.
#[derive(Debug, Serialize)]
struct SeriesRow {
    scheduler: Scheduler,
    dimension: Dimension,
    value: u64,
    requests: usize,
    mean_response_ms: Option<f64>,
    median_response_ms: Option<f64>,
    std_dev_response_ms: Option<f64>,
    p95_response_ms: Option<f64>,
    p99_response_ms: Option<f64>,
    mean_waiting_ms: Option<f64>,
    mean_service_ms: Option<f64>,
    throughput_req_per_s: f64,
    fairness_index: Option<f64>,
    speedup: Option<f64>,
    efficiency: Option<f64>,
}

/// Results manager for the JSON document and CSV tables
pub struct ResultsManager {
    output_file: PathBuf,
    summary_csv: Option<PathBuf>,
    series_csv: Option<PathBuf>,
    rejected: Vec<RejectedRun>,
}

impl ResultsManager {
    pub fn new(output_file: &Path) -> Self {
        Self {
            output_file: output_file.to_path_buf(),
            summary_csv: None,
            series_csv: None,
            rejected: Vec::new(),
        }
    }

    /// Also write the baseline policy summary table to `path`.
    pub fn with_summary_csv<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.summary_csv = Some(path.as_ref().to_path_buf());
        self
    }

    /// Also write every series point to `path`.
    pub fn with_series_csv<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.series_csv = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn add_rejected(&mut self, run: impl Into<String>, error: impl Into<String>) {
        self.rejected.push(RejectedRun {
            run: run.into(),
            error: error.into(),
        });
    }

    pub fn rejected(&self) -> &[RejectedRun] {
        &self.rejected
    }

    /// Write every configured output.
    pub fn finalize(&self, report: &AnalysisReport) -> Result<()> {
        info!("Finalizing analysis results");

        self.write_document(report)?;
        info!("Results written to: {:?}", self.output_file);

        if let Some(path) = &self.summary_csv {
            match &report.baseline {
                Some(baseline) => {
                    write_summary_csv(path, baseline)?;
                    info!("Summary table written to: {:?}", path);
                }
                None => debug!("No baseline runs, skipping summary table"),
            }
        }

        if let Some(path) = &self.series_csv {
            write_series_csv(path, &report.series)?;
            info!("Series table written to: {:?}", path);
        }
        Ok(())
    }

    fn write_document(&self, report: &AnalysisReport) -> Result<()> {
        let document = AnalysisDocument {
            metadata: AnalysisMetadata {
                version: crate::VERSION.to_string(),
                timestamp: chrono::Utc::now(),
                total_runs: report.total_runs(),
                system_info: SystemInfo::collect(),
            },
            report: report.clone(),
            rejected: self.rejected.clone(),
        };

        let json = serde_json::to_string_pretty(&document)?;
        std::fs::write(&self.output_file, json)
            .with_context(|| format!("Failed to write {}", self.output_file.display()))?;
        Ok(())
    }
}

fn fixed(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{:.*}", precision, v))
        .unwrap_or_default()
}

/// Write the baseline comparison as a policy summary table.
///
/// Undefined statistics (empty runs) are left blank.
pub fn write_summary_csv(path: &Path, baseline: &BaselineComparison) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for entry in &baseline.entries {
        let m = &entry.metrics;
        wtr.serialize(SummaryRow {
            policy: &entry.label,
            requests: m.count,
            mean_response: fixed(m.mean_response_ms(), 3),
            median_response: fixed(m.median_response_ms(), 3),
            std_dev: fixed(m.std_dev_response_ms(), 3),
            mean_waiting: fixed(m.mean_waiting_ms(), 3),
            throughput: format!("{:.2}", m.throughput_req_per_s),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write one row per series point.
pub fn write_series_csv(path: &Path, series: &[ComparativeSeries]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for s in series {
        for point in &s.points {
            let m = &point.metrics;
            let percentiles = m.percentiles();
            wtr.serialize(SeriesRow {
                scheduler: s.scheduler,
                dimension: s.dimension,
                value: point.dimension_value,
                requests: m.count,
                mean_response_ms: m.mean_response_ms(),
                median_response_ms: m.median_response_ms(),
                std_dev_response_ms: m.std_dev_response_ms(),
                p95_response_ms: percentiles.map(|p| p.p95_ms),
                p99_response_ms: percentiles.map(|p| p.p99_ms),
                mean_waiting_ms: m.mean_waiting_ms(),
                mean_service_ms: m.mean_service_ms(),
                throughput_req_per_s: m.throughput_req_per_s,
                fairness_index: m.fairness_index(),
                speedup: point.speedup(),
                efficiency: point.efficiency(),
            })?;
        }
    }
    wtr.flush()?;
    Ok(())
}
