//! # Run Collection
//!
//! Groups heterogeneous input runs into the shape the aggregator consumes:
//! one ordered series per (scheduler, dimension), plus the baseline runs kept
//! apart by policy.
//!
//! ## Usage
//!
//! ```rust
//! use sched_analyzer::{MetricsEngine, RawIdentity, RunCollectionBuilder};
//!
//! let mut builder = RunCollectionBuilder::new();
//! builder.add(&RawIdentity::new("fcfs", "servers", Some(1)), vec![(0i64, 0i64, 100_000_000i64)])?;
//! builder.add(&RawIdentity::new("FCFS", "servers", Some(2)), vec![(0i64, 0i64, 50_000_000i64)])?;
//!
//! let report = builder.build().analyze(&MetricsEngine::new());
//! assert_eq!(report.series.len(), 1);
//! assert_eq!(report.series[0].points[1].speedup(), Some(2.0));
//! # Ok::<(), sched_analyzer::AnalysisError>(())
//! ```

use crate::comparison::{build_series, BaselineComparison, ComparativeSeries};
use crate::error::Result;
use crate::experiment::{Dimension, ExperimentId, ExperimentRun, RawIdentity, Scheduler};
use crate::metrics::{MetricsEngine, RunMetrics};
use crate::record::RawRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, info, warn};

/// Non-fatal finding attached to an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunWarning {
    /// The run had no records; its statistics are undefined.
    EmptyRun { run: ExperimentId },
    /// A later run with the same identity replaced an earlier one.
    DuplicateRun { run: ExperimentId },
    /// The caller reported that this group has no data.
    MissingGroup {
        scheduler: Scheduler,
        dimension: Dimension,
    },
}

impl fmt::Display for RunWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunWarning::EmptyRun { run } => write!(f, "run {} has no records", run),
            RunWarning::DuplicateRun { run } => {
                write!(f, "run {} was supplied more than once, last one kept", run)
            }
            RunWarning::MissingGroup {
                scheduler,
                dimension,
            } => write!(f, "no data for {} {}", scheduler, dimension),
        }
    }
}

type SeriesKey = (Scheduler, Dimension);
type PolicyKey = (Scheduler, Option<u64>);

/// Accumulates runs before analysis.
#[derive(Debug, Default)]
pub struct RunCollectionBuilder {
    series: BTreeMap<SeriesKey, BTreeMap<u64, ExperimentRun>>,
    baseline: BTreeMap<PolicyKey, ExperimentRun>,
    missing: BTreeSet<SeriesKey>,
    warnings: Vec<RunWarning>,
}

impl RunCollectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `identity`, validate `raw` and add the resulting run.
    ///
    /// Nothing is added when either step fails.
    pub fn add<I>(&mut self, identity: &RawIdentity, raw: I) -> Result<ExperimentId>
    where
        I: IntoIterator,
        I::Item: Into<RawRecord>,
    {
        let id = identity.parse()?;
        let run = ExperimentRun::from_raw(id, raw)?;
        Ok(self.add_run(run))
    }

    /// Add an already validated run.
    pub fn add_run(&mut self, run: ExperimentRun) -> ExperimentId {
        let id = *run.id();
        let replaced = match id.dimension_value() {
            None => self.baseline.insert((id.scheduler(), id.quantum()), run),
            Some(value) => self
                .series
                .entry((id.scheduler(), id.dimension()))
                .or_default()
                .insert(value, run),
        };

        if replaced.is_some() {
            warn!(run = %id, "Duplicate run identity, keeping the last one");
            self.warnings.push(RunWarning::DuplicateRun { run: id });
        } else {
            debug!(run = %id, "Added run");
        }
        id
    }

    /// Record that the caller has no data for a group.
    pub fn mark_missing(&mut self, scheduler: Scheduler, dimension: Dimension) -> &mut Self {
        self.missing.insert((scheduler, dimension));
        self
    }

    pub fn build(self) -> RunCollection {
        RunCollection {
            series: self.series,
            baseline: self.baseline,
            missing: self.missing,
            warnings: self.warnings,
        }
    }
}

/// Grouped runs, ready to analyze.
#[derive(Debug)]
pub struct RunCollection {
    series: BTreeMap<SeriesKey, BTreeMap<u64, ExperimentRun>>,
    baseline: BTreeMap<PolicyKey, ExperimentRun>,
    missing: BTreeSet<SeriesKey>,
    warnings: Vec<RunWarning>,
}

impl RunCollection {
    pub fn builder() -> RunCollectionBuilder {
        RunCollectionBuilder::new()
    }

    /// Total number of distinct runs held.
    pub fn run_count(&self) -> usize {
        self.baseline.len() + self.series.values().map(BTreeMap::len).sum::<usize>()
    }

    /// (scheduler, dimension) groups present, in report order.
    pub fn groups(&self) -> Vec<(Scheduler, Dimension)> {
        self.series.keys().copied().collect()
    }

    fn has_group(&self, scheduler: Scheduler, dimension: Dimension) -> bool {
        match dimension {
            Dimension::Baseline => self.baseline.keys().any(|(s, _)| *s == scheduler),
            _ => self.series.contains_key(&(scheduler, dimension)),
        }
    }

    /// Compute metrics for every run and assemble the full report.
    pub fn analyze(&self, engine: &MetricsEngine) -> AnalysisReport {
        info!(
            runs = self.run_count(),
            groups = self.series.len(),
            baseline_policies = self.baseline.len(),
            "Analyzing experiment runs"
        );

        // Baseline runs first, then every series in key order.
        let runs: Vec<&ExperimentRun> = self
            .baseline
            .values()
            .chain(self.series.values().flat_map(BTreeMap::values))
            .collect();
        let metrics = engine.compute_batch(&runs);

        let mut warnings = self.warnings.clone();
        warnings.extend(
            runs.iter()
                .zip(&metrics)
                .filter(|(_, m)| m.count == 0)
                .map(|(run, _)| RunWarning::EmptyRun { run: *run.id() }),
        );

        let mut computed = metrics.into_iter();
        let baseline_metrics: Vec<(ExperimentId, RunMetrics)> = self
            .baseline
            .values()
            .zip(computed.by_ref())
            .map(|(run, m)| (*run.id(), m))
            .collect();

        let series: Vec<ComparativeSeries> = self
            .series
            .iter()
            .map(|(&(scheduler, dimension), runs)| {
                let points: Vec<(u64, RunMetrics)> =
                    runs.keys().copied().zip(computed.by_ref()).collect();
                build_series(scheduler, dimension, points)
            })
            .collect();

        for &(scheduler, dimension) in &self.missing {
            if self.has_group(scheduler, dimension) {
                debug!(
                    scheduler = %scheduler,
                    dimension = %dimension,
                    "Group marked missing but runs were supplied"
                );
                continue;
            }
            warn!(scheduler = %scheduler, dimension = %dimension, "Missing experiment group");
            warnings.push(RunWarning::MissingGroup {
                scheduler,
                dimension,
            });
        }

        let baseline =
            (!baseline_metrics.is_empty()).then(|| BaselineComparison::from_runs(baseline_metrics));

        info!(
            series = series.len(),
            warnings = warnings.len(),
            "Analysis complete"
        );

        AnalysisReport {
            series,
            baseline,
            warnings,
        }
    }
}

/// Everything the analysis produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Ordered by (scheduler, dimension).
    pub series: Vec<ComparativeSeries>,
    pub baseline: Option<BaselineComparison>,
    pub warnings: Vec<RunWarning>,
}

impl AnalysisReport {
    pub fn series_for(&self, scheduler: Scheduler, dimension: Dimension) -> Option<&ComparativeSeries> {
        self.series
            .iter()
            .find(|s| s.scheduler == scheduler && s.dimension == dimension)
    }

    /// Number of runs the report covers.
    pub fn total_runs(&self) -> usize {
        let baseline = self.baseline.as_ref().map_or(0, |b| b.entries.len());
        baseline + self.series.iter().map(|s| s.points.len()).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;

    /// One request arriving and starting at 0, finishing after `response_ms`.
    fn req(response_ms: i64) -> Vec<(i64, i64, i64)> {
        vec![(0, 0, response_ms * 1_000_000)]
    }

    #[test]
    fn test_groups_by_scheduler_and_dimension() {
        let mut builder = RunCollectionBuilder::new();
        builder
            .add(&RawIdentity::new("sjf", "clients", Some(8)), req(4))
            .unwrap();
        builder
            .add(&RawIdentity::new("fcfs", "clients", Some(2)), req(1))
            .unwrap();
        builder
            .add(&RawIdentity::new("fcfs", "clients", Some(1)), req(2))
            .unwrap();

        let collection = builder.build();
        assert_eq!(collection.run_count(), 3);
        assert_eq!(
            collection.groups(),
            vec![
                (Scheduler::Fcfs, Dimension::Clients),
                (Scheduler::Sjf, Dimension::Clients)
            ]
        );

        let report = collection.analyze(&MetricsEngine::new());
        let fcfs = report.series_for(Scheduler::Fcfs, Dimension::Clients).unwrap();
        assert_eq!(fcfs.values(), vec![1, 2]);
        assert_eq!(fcfs.points[0].metrics.mean_response_ms(), Some(2.0));
        assert!(report.baseline.is_none());
        assert!(report.warnings.is_empty());
        assert_eq!(report.total_runs(), 3);
    }

    #[test]
    fn test_unknown_tokens_rejected() {
        let mut builder = RunCollectionBuilder::new();
        let err = builder
            .add(&RawIdentity::new("lottery", "clients", Some(1)), vec![(0i64, 0i64, 1i64)])
            .unwrap_err();
        assert_eq!(err, AnalysisError::UnknownScheduler("lottery".to_string()));

        let err = builder
            .add(&RawIdentity::new("fcfs", "cores", Some(1)), vec![(0i64, 0i64, 1i64)])
            .unwrap_err();
        assert_eq!(err, AnalysisError::UnknownDimension("cores".to_string()));

        assert_eq!(builder.build().run_count(), 0);
    }

    #[test]
    fn test_invalid_records_add_nothing() {
        let mut builder = RunCollectionBuilder::new();
        let err = builder
            .add(&RawIdentity::new("fcfs", "servers", Some(1)), vec![(0i64, 10i64, 5i64)])
            .unwrap_err();
        assert!(matches!(err, AnalysisError::DataIntegrity { .. }));
        assert_eq!(builder.build().run_count(), 0);
    }

    #[test]
    fn test_duplicate_identity_last_wins() {
        let mut builder = RunCollectionBuilder::new();
        let identity = RawIdentity::new("rr", "quantum", Some(5));
        builder.add(&identity, req(10)).unwrap();
        let id = builder.add(&identity, req(20)).unwrap();

        let report = builder.build().analyze(&MetricsEngine::new());
        let series = report
            .series_for(Scheduler::RoundRobin, Dimension::Quantum)
            .unwrap();
        assert_eq!(series.points.len(), 1);
        assert_eq!(series.points[0].metrics.mean_response_ms(), Some(20.0));
        assert_eq!(report.warnings, vec![RunWarning::DuplicateRun { run: id }]);
    }

    #[test]
    fn test_quantum_on_swept_run_rejected() {
        let mut builder = RunCollectionBuilder::new();
        builder
            .add(&RawIdentity::new("rr", "clients", Some(8)), req(3))
            .unwrap();
        for raw in [
            RawIdentity::new("rr", "clients", Some(8)).with_quantum(10),
            RawIdentity::new("rr", "quantum", Some(5)).with_quantum(10),
        ] {
            let err = builder.add(&raw, req(7)).unwrap_err();
            assert!(matches!(err, AnalysisError::InvalidIdentity(_)));
        }

        let collection = builder.build();
        assert_eq!(collection.run_count(), 1);
        let report = collection.analyze(&MetricsEngine::new());
        let series = report.series_for(Scheduler::RoundRobin, Dimension::Clients).unwrap();
        assert_eq!(series.points[0].metrics.mean_response_ms(), Some(3.0));
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_baseline_runs_keyed_by_policy() {
        let mut builder = RunCollectionBuilder::new();
        builder
            .add(&RawIdentity::new("rr", "baseline", None).with_quantum(10), req(30))
            .unwrap();
        builder
            .add(&RawIdentity::new("rr", "baseline", None).with_quantum(5), req(20))
            .unwrap();
        builder
            .add(&RawIdentity::new("fcfs", "baseline", None), req(40))
            .unwrap();

        let report = builder.build().analyze(&MetricsEngine::new());
        assert!(report.series.is_empty());

        let baseline = report.baseline.unwrap();
        let labels: Vec<&str> = baseline.entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["FCFS", "RR (Q=5)", "RR (Q=10)"]);
        assert_eq!(baseline.best_mean_response.as_deref(), Some("RR (Q=5)"));
    }

    #[test]
    fn test_empty_run_warning() {
        let mut builder = RunCollectionBuilder::new();
        let empty: Vec<(i64, i64, i64)> = Vec::new();
        let id = builder
            .add(&RawIdentity::new("fcfs", "packet_size", Some(512)), empty)
            .unwrap();

        let report = builder.build().analyze(&MetricsEngine::new());
        assert_eq!(report.warnings, vec![RunWarning::EmptyRun { run: id }]);
        assert!(!report.series[0].points[0].metrics.is_defined());
    }

    #[test]
    fn test_missing_groups_reported_only_when_absent() {
        let mut builder = RunCollectionBuilder::new();
        builder
            .add(&RawIdentity::new("fcfs", "servers", Some(1)), req(1))
            .unwrap();
        builder
            .mark_missing(Scheduler::Sjf, Dimension::Servers)
            .mark_missing(Scheduler::Fcfs, Dimension::Servers);

        let report = builder.build().analyze(&MetricsEngine::new());
        assert_eq!(
            report.warnings,
            vec![RunWarning::MissingGroup {
                scheduler: Scheduler::Sjf,
                dimension: Dimension::Servers
            }]
        );
    }

    #[test]
    fn test_warning_display_and_serde() {
        let warning = RunWarning::MissingGroup {
            scheduler: Scheduler::Sjf,
            dimension: Dimension::PacketSize,
        };
        assert_eq!(warning.to_string(), "no data for SJF packet_size");

        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["kind"], "missing_group");
        assert_eq!(json["dimension"], "packet_size");
    }
}
