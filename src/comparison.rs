//! # Comparative Aggregation
//!
//! Folds per-run metrics into comparable series along one swept dimension and
//! ranks baseline policies against each other.
//!
//! ## Scaling Model
//!
//! Only the `servers` dimension has a parallelism baseline. The run with the
//! smallest server count is the reference point and gets speedup and
//! efficiency of exactly `1.0`; every other point is measured relative to it:
//!
//! - `speedup = baseline_mean / mean` (0 when `mean` is not positive)
//! - `efficiency = speedup / servers` (0 when `servers` is 0)
//!
//! An undefined mean (empty run) counts as 0 in both positions.

use crate::experiment::{Dimension, ExperimentId, Scheduler};
use crate::metrics::RunMetrics;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Baseline-relative scaling of one point in a `servers` series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scaling {
    pub speedup: f64,
    pub efficiency: f64,
}

impl Scaling {
    /// Scaling of the reference point itself.
    pub const IDENTITY: Scaling = Scaling {
        speedup: 1.0,
        efficiency: 1.0,
    };

    /// Scaling of a run with `mean_ms` at `servers`, against `baseline_mean_ms`.
    pub fn relative_to(baseline_mean_ms: f64, mean_ms: f64, servers: u64) -> Self {
        let speedup = if mean_ms > 0.0 {
            baseline_mean_ms / mean_ms
        } else {
            0.0
        };
        let efficiency = if servers > 0 {
            speedup / servers as f64
        } else {
            0.0
        };
        Self {
            speedup,
            efficiency,
        }
    }
}

/// One point of a comparative series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub dimension_value: u64,
    pub metrics: RunMetrics,
    /// Present only for the `servers` dimension.
    pub scaling: Option<Scaling>,
}

impl SeriesPoint {
    pub fn speedup(&self) -> Option<f64> {
        self.scaling.map(|s| s.speedup)
    }

    pub fn efficiency(&self) -> Option<f64> {
        self.scaling.map(|s| s.efficiency)
    }
}

/// Ordered metrics of one (scheduler, dimension) sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparativeSeries {
    pub scheduler: Scheduler,
    pub dimension: Dimension,
    /// Strictly ascending by `dimension_value`.
    pub points: Vec<SeriesPoint>,
}

impl ComparativeSeries {
    pub fn values(&self) -> Vec<u64> {
        self.points.iter().map(|p| p.dimension_value).collect()
    }

    pub fn point(&self, dimension_value: u64) -> Option<&SeriesPoint> {
        self.points
            .binary_search_by_key(&dimension_value, |p| p.dimension_value)
            .ok()
            .map(|i| &self.points[i])
    }
}

/// Build the comparative series of one (scheduler, dimension) group.
///
/// Input order does not matter; output is sorted by ascending value. When two
/// inputs share a value the one seen last replaces the earlier one, and the
/// overwrite is logged.
pub fn build_series<I>(scheduler: Scheduler, dimension: Dimension, runs: I) -> ComparativeSeries
where
    I: IntoIterator<Item = (u64, RunMetrics)>,
{
    let mut by_value: BTreeMap<u64, RunMetrics> = BTreeMap::new();
    for (value, metrics) in runs {
        if by_value.insert(value, metrics).is_some() {
            warn!(
                scheduler = %scheduler,
                dimension = %dimension,
                value,
                "Duplicate run for the same dimension value, keeping the last one"
            );
        }
    }

    let baseline_mean = by_value
        .values()
        .next()
        .map(|m| m.mean_response_ms().unwrap_or(0.0));

    let points = by_value
        .into_iter()
        .enumerate()
        .map(|(index, (dimension_value, metrics))| {
            let scaling = match (dimension.has_scaling(), baseline_mean) {
                (true, _) if index == 0 => Some(Scaling::IDENTITY),
                (true, Some(baseline)) => Some(Scaling::relative_to(
                    baseline,
                    metrics.mean_response_ms().unwrap_or(0.0),
                    dimension_value,
                )),
                _ => None,
            };
            SeriesPoint {
                dimension_value,
                metrics,
                scaling,
            }
        })
        .collect();

    ComparativeSeries {
        scheduler,
        dimension,
        points,
    }
}

/// One policy in the baseline comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineEntry {
    pub label: String,
    pub scheduler: Scheduler,
    pub quantum: Option<u64>,
    pub metrics: RunMetrics,
}

/// Side-by-side comparison of baseline runs with per-metric winners.
///
/// Winners are policy labels. Empty runs never win; on ties the entry listed
/// first wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineComparison {
    pub entries: Vec<BaselineEntry>,
    pub best_mean_response: Option<String>,
    pub best_median_response: Option<String>,
    pub most_consistent: Option<String>,
    pub best_throughput: Option<String>,
    pub fairest: Option<String>,
}

impl BaselineComparison {
    /// Rank baseline runs. Entries keep the order they are given in.
    pub fn from_runs<I>(runs: I) -> Self
    where
        I: IntoIterator<Item = (ExperimentId, RunMetrics)>,
    {
        let entries: Vec<BaselineEntry> = runs
            .into_iter()
            .map(|(id, metrics)| BaselineEntry {
                label: id.policy_label(),
                scheduler: id.scheduler(),
                quantum: id.quantum(),
                metrics,
            })
            .collect();

        Self {
            best_mean_response: pick(&entries, |m| m.mean_response_ms(), Prefer::Lower),
            best_median_response: pick(&entries, |m| m.median_response_ms(), Prefer::Lower),
            most_consistent: pick(&entries, |m| m.std_dev_response_ms(), Prefer::Lower),
            best_throughput: pick(
                &entries,
                |m| m.is_defined().then_some(m.throughput_req_per_s),
                Prefer::Higher,
            ),
            fairest: pick(&entries, |m| m.fairness_index(), Prefer::Higher),
            entries,
        }
    }

    pub fn entry(&self, label: &str) -> Option<&BaselineEntry> {
        self.entries.iter().find(|e| e.label == label)
    }
}

#[derive(Clone, Copy)]
enum Prefer {
    Lower,
    Higher,
}

fn pick<F>(entries: &[BaselineEntry], key: F, prefer: Prefer) -> Option<String>
where
    F: Fn(&RunMetrics) -> Option<f64>,
{
    let mut best: Option<(&BaselineEntry, f64)> = None;
    for entry in entries {
        let Some(value) = key(&entry.metrics) else {
            continue;
        };
        let better = match (best, prefer) {
            (None, _) => true,
            (Some((_, current)), Prefer::Lower) => value < current,
            (Some((_, current)), Prefer::Higher) => value > current,
        };
        if better {
            best = Some((entry, value));
        }
    }
    best.map(|(entry, _)| entry.label.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{ResponsePercentiles, RunSummary};

    fn metrics_with_mean(mean: f64) -> RunMetrics {
        metrics_with(mean, 0.0, 1.0, 100.0)
    }

    fn metrics_with(mean: f64, std_dev: f64, fairness: f64, throughput: f64) -> RunMetrics {
        RunMetrics {
            count: 10,
            throughput_req_per_s: throughput,
            time_span_s: 1.0,
            summary: Some(RunSummary {
                mean_response_ms: mean,
                median_response_ms: mean,
                std_dev_response_ms: std_dev,
                min_response_ms: mean,
                max_response_ms: mean,
                mean_waiting_ms: 0.0,
                mean_service_ms: mean,
                percentiles: ResponsePercentiles {
                    p50_ms: mean,
                    p90_ms: mean,
                    p95_ms: mean,
                    p99_ms: mean,
                },
                fairness_index: fairness,
            }),
        }
    }

    #[test]
    fn test_servers_speedup_and_efficiency() {
        let series = build_series(
            Scheduler::Fcfs,
            Dimension::Servers,
            vec![(2, metrics_with_mean(50.0)), (1, metrics_with_mean(100.0))],
        );

        assert_eq!(series.values(), vec![1, 2]);
        assert_eq!(series.points[0].scaling, Some(Scaling::IDENTITY));
        assert_eq!(series.points[1].speedup(), Some(2.0));
        assert_eq!(series.points[1].efficiency(), Some(1.0));
    }

    #[test]
    fn test_baseline_identity_is_exact() {
        let series = build_series(
            Scheduler::Sjf,
            Dimension::Servers,
            vec![(3, metrics_with_mean(0.3)), (5, metrics_with_mean(0.1))],
        );
        let baseline = series.point(3).unwrap();
        assert_eq!(baseline.speedup(), Some(1.0));
        assert_eq!(baseline.efficiency(), Some(1.0));
    }

    #[test]
    fn test_non_servers_dimension_has_no_scaling() {
        let series = build_series(
            Scheduler::RoundRobin,
            Dimension::Quantum,
            vec![(10, metrics_with_mean(5.0)), (5, metrics_with_mean(6.0))],
        );
        assert_eq!(series.values(), vec![5, 10]);
        assert!(series.points.iter().all(|p| p.scaling.is_none()));
    }

    #[test]
    fn test_duplicate_value_last_wins() {
        let series = build_series(
            Scheduler::Fcfs,
            Dimension::Clients,
            vec![
                (4, metrics_with_mean(1.0)),
                (4, metrics_with_mean(2.0)),
                (2, metrics_with_mean(3.0)),
            ],
        );
        assert_eq!(series.values(), vec![2, 4]);
        assert_eq!(series.point(4).unwrap().metrics.mean_response_ms(), Some(2.0));
    }

    #[test]
    fn test_degenerate_scaling_falls_back_to_zero() {
        assert_eq!(
            Scaling::relative_to(100.0, 0.0, 4),
            Scaling {
                speedup: 0.0,
                efficiency: 0.0
            }
        );
        assert_eq!(Scaling::relative_to(100.0, 50.0, 0).efficiency, 0.0);

        let series = build_series(
            Scheduler::Fcfs,
            Dimension::Servers,
            vec![(1, metrics_with_mean(100.0)), (2, RunMetrics::undefined())],
        );
        assert_eq!(series.points[1].speedup(), Some(0.0));
        assert_eq!(series.points[1].efficiency(), Some(0.0));
    }

    #[test]
    fn test_empty_baseline_run() {
        let series = build_series(
            Scheduler::Fcfs,
            Dimension::Servers,
            vec![(1, RunMetrics::undefined()), (2, metrics_with_mean(10.0))],
        );
        assert_eq!(series.points[0].scaling, Some(Scaling::IDENTITY));
        assert_eq!(series.points[1].speedup(), Some(0.0));
    }

    #[test]
    fn test_baseline_comparison_winners() {
        let fcfs = ExperimentId::baseline(Scheduler::Fcfs, None).unwrap();
        let sjf = ExperimentId::baseline(Scheduler::Sjf, None).unwrap();
        let rr = ExperimentId::baseline(Scheduler::RoundRobin, Some(5)).unwrap();

        let comparison = BaselineComparison::from_runs(vec![
            (fcfs, metrics_with(30.0, 5.0, 0.7, 90.0)),
            (sjf, metrics_with(20.0, 9.0, 0.6, 80.0)),
            (rr, metrics_with(25.0, 2.0, 0.9, 95.0)),
        ]);

        assert_eq!(comparison.entries.len(), 3);
        assert_eq!(comparison.best_mean_response.as_deref(), Some("SJF"));
        assert_eq!(comparison.best_median_response.as_deref(), Some("SJF"));
        assert_eq!(comparison.most_consistent.as_deref(), Some("RR (Q=5)"));
        assert_eq!(comparison.best_throughput.as_deref(), Some("RR (Q=5)"));
        assert_eq!(comparison.fairest.as_deref(), Some("RR (Q=5)"));
        assert!(comparison.entry("FCFS").is_some());
    }

    #[test]
    fn test_empty_runs_never_win() {
        let fcfs = ExperimentId::baseline(Scheduler::Fcfs, None).unwrap();
        let sjf = ExperimentId::baseline(Scheduler::Sjf, None).unwrap();

        let comparison = BaselineComparison::from_runs(vec![
            (fcfs, RunMetrics::undefined()),
            (sjf, metrics_with(20.0, 1.0, 0.5, 0.0)),
        ]);
        assert_eq!(comparison.best_mean_response.as_deref(), Some("SJF"));
        assert_eq!(comparison.best_throughput.as_deref(), Some("SJF"));

        let only_empty = BaselineComparison::from_runs(vec![(fcfs, RunMetrics::undefined())]);
        assert_eq!(only_empty.best_mean_response, None);
        assert_eq!(only_empty.fairest, None);
    }
}
