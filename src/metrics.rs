//! # Run Metrics Engine
//!
//! Turns one [`ExperimentRun`] into one [`RunMetrics`]: descriptive statistics
//! over response times, mean waiting/service times, linear-interpolation
//! percentiles, window throughput and Jain's fairness index.
//!
//! Computation is pure: the same run always yields bit-identical metrics, and
//! nothing here touches shared state. [`MetricsEngine::compute_batch`] fans
//! independent runs out over rayon and returns results in input order.

use crate::defaults::REPORTED_PERCENTILES;
use crate::experiment::ExperimentRun;
use crate::record::{RequestRecord, NS_PER_SEC};
use crate::utils::{
    jain_fairness_index, mean, percentile_sorted, sample_std_dev, sorted_copy, window_throughput,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Response-time percentiles reported for every run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResponsePercentiles {
    pub p50_ms: f64,
    pub p90_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
}

impl ResponsePercentiles {
    /// Percentiles as `(level, value)` pairs, in ascending level order.
    pub fn as_pairs(&self) -> [(f64, f64); 4] {
        let [p50, p90, p95, p99] = REPORTED_PERCENTILES;
        [
            (p50, self.p50_ms),
            (p90, self.p90_ms),
            (p95, self.p95_ms),
            (p99, self.p99_ms),
        ]
    }
}

/// Statistics that only exist for a non-empty run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub mean_response_ms: f64,
    pub median_response_ms: f64,
    pub std_dev_response_ms: f64,
    pub min_response_ms: f64,
    pub max_response_ms: f64,
    pub mean_waiting_ms: f64,
    pub mean_service_ms: f64,
    pub percentiles: ResponsePercentiles,
    pub fairness_index: f64,
}

/// Derived metrics for one experiment run
///
/// `summary` is `None` for an empty run: every statistic is explicitly
/// undefined and callers must check [`RunMetrics::count`] (or
/// [`RunMetrics::is_defined`]) before reading them. Throughput is always
/// defined and is `0.0` for empty runs and zero-length windows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub count: usize,
    pub throughput_req_per_s: f64,
    /// Observation window: latest finish minus earliest arrival.
    pub time_span_s: f64,
    pub summary: Option<RunSummary>,
}

impl RunMetrics {
    /// Metrics of an empty run.
    pub fn undefined() -> Self {
        Self {
            count: 0,
            throughput_req_per_s: 0.0,
            time_span_s: 0.0,
            summary: None,
        }
    }

    pub fn is_defined(&self) -> bool {
        self.summary.is_some()
    }

    pub fn mean_response_ms(&self) -> Option<f64> {
        self.summary.map(|s| s.mean_response_ms)
    }

    pub fn median_response_ms(&self) -> Option<f64> {
        self.summary.map(|s| s.median_response_ms)
    }

    pub fn std_dev_response_ms(&self) -> Option<f64> {
        self.summary.map(|s| s.std_dev_response_ms)
    }

    pub fn mean_waiting_ms(&self) -> Option<f64> {
        self.summary.map(|s| s.mean_waiting_ms)
    }

    pub fn mean_service_ms(&self) -> Option<f64> {
        self.summary.map(|s| s.mean_service_ms)
    }

    pub fn percentiles(&self) -> Option<ResponsePercentiles> {
        self.summary.map(|s| s.percentiles)
    }

    pub fn fairness_index(&self) -> Option<f64> {
        self.summary.map(|s| s.fairness_index)
    }
}

/// Compute the metrics of a single run.
pub fn compute_run_metrics(run: &ExperimentRun) -> RunMetrics {
    let records = run.records();
    let Some(summary) = summarize(records) else {
        warn!(run = %run.id(), "Empty run, statistics are undefined");
        return RunMetrics::undefined();
    };

    let time_span_s = observation_window_ns(records) as f64 / NS_PER_SEC;
    let metrics = RunMetrics {
        count: records.len(),
        throughput_req_per_s: window_throughput(records.len(), time_span_s),
        time_span_s,
        summary: Some(summary),
    };

    debug!(
        run = %run.id(),
        count = metrics.count,
        mean_response_ms = summary.mean_response_ms,
        throughput = metrics.throughput_req_per_s,
        fairness = summary.fairness_index,
        "Computed run metrics"
    );
    metrics
}

/// Statistics over a non-empty record slice, `None` when empty.
fn summarize(records: &[RequestRecord]) -> Option<RunSummary> {
    let response: Vec<f64> = records.iter().map(|r| r.response_time_ms()).collect();
    let waiting: Vec<f64> = records.iter().map(|r| r.waiting_time_ms()).collect();
    let service: Vec<f64> = records.iter().map(|r| r.service_time_ms()).collect();

    let sorted = sorted_copy(&response);
    let [p50, p90, p95, p99] = REPORTED_PERCENTILES;
    let percentiles = ResponsePercentiles {
        p50_ms: percentile_sorted(&sorted, p50)?,
        p90_ms: percentile_sorted(&sorted, p90)?,
        p95_ms: percentile_sorted(&sorted, p95)?,
        p99_ms: percentile_sorted(&sorted, p99)?,
    };

    Some(RunSummary {
        mean_response_ms: mean(&response)?,
        median_response_ms: percentiles.p50_ms,
        std_dev_response_ms: sample_std_dev(&response)?,
        min_response_ms: *sorted.first()?,
        max_response_ms: *sorted.last()?,
        mean_waiting_ms: mean(&waiting)?,
        mean_service_ms: mean(&service)?,
        percentiles,
        fairness_index: jain_fairness_index(&response)?,
    })
}

/// Latest finish minus earliest arrival, in nanoseconds.
fn observation_window_ns(records: &[RequestRecord]) -> u64 {
    let first_arrival = records.iter().map(|r| r.arrival_time_ns()).min();
    let last_finish = records.iter().map(|r| r.finish_time_ns()).max();
    match (first_arrival, last_finish) {
        // Every record finishes no earlier than it arrives, so this never underflows.
        (Some(first), Some(last)) => last - first,
        _ => 0,
    }
}

/// Batch front-end over [`compute_run_metrics`].
#[derive(Debug, Clone, Default)]
pub struct MetricsEngine {
    threads: Option<usize>,
}

impl MetricsEngine {
    /// Engine using rayon's global pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine using a dedicated pool of `threads` workers.
    pub fn with_threads(threads: usize) -> Self {
        Self {
            threads: Some(threads),
        }
    }

    pub fn compute(&self, run: &ExperimentRun) -> RunMetrics {
        compute_run_metrics(run)
    }

    /// Compute metrics for many runs in parallel. Output order matches input order.
    pub fn compute_batch(&self, runs: &[&ExperimentRun]) -> Vec<RunMetrics> {
        let work = || {
            runs.par_iter()
                .map(|run| compute_run_metrics(run))
                .collect::<Vec<_>>()
        };

        match self.threads {
            Some(threads) => match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => pool.install(work),
                Err(e) => {
                    warn!("Failed to build a {}-thread pool ({}), using the global pool", threads, e);
                    work()
                }
            },
            None => work(),
        }
    }
}
