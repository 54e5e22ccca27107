//! # Statistical and Formatting Utilities
//!
//! Numeric building blocks for the metrics engine plus the small formatters
//! used by the console report.
//!
//! ## Key Functionality Categories
//!
//! - **Statistics**: mean, sample standard deviation, linear-interpolation
//!   percentiles, Jain's fairness index and window throughput
//! - **Formatting**: human-readable latencies, request rates and undefined values
//! - **Display Helpers**: fixed-width table rows and separators
//!
//! ## Degenerate Inputs
//!
//! Statistics over an empty slice are undefined and return `None` rather than
//! a fabricated zero. Divisions that can legitimately hit zero (throughput over
//! a zero-length window, fairness over all-zero samples) resolve to fixed
//! fallback values documented on each function.
//!
//! ## Usage Examples
//!
//! ```rust
//! use sched_analyzer::utils::*;
//!
//! let values = vec![10.0, 30.0];
//! assert_eq!(mean(&values), Some(20.0));
//! assert_eq!(jain_fairness_index(&values), Some(0.8));
//! assert_eq!(format_optional(None, 2), "n/a");
//! ```

use std::fmt::Write;

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation
///
/// Uses the unbiased sample formula:
/// s = √(Σ(x - x̄)² / (N - 1))
///
/// ## Small Samples
///
/// - **N = 0**: undefined, returns `None`
/// - **N = 1**: defined as `0.0` (a single observation has no spread)
///
/// ## Examples
///
/// ```rust
/// # use sched_analyzer::utils::sample_std_dev;
/// let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
/// let std_dev = sample_std_dev(&values).unwrap();
/// assert!((std_dev - 1.5811388300841898).abs() < 1e-12);
/// assert_eq!(sample_std_dev(&[7.0]), Some(0.0));
/// ```
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    if values.len() == 1 {
        return Some(0.0);
    }
    let sum_sq = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Sort a copy of `values` ascending, ready for [`percentile_sorted`].
pub fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Percentile of already-sorted data using linear interpolation
///
/// ## Algorithm Details
///
/// 1. **Index Calculation**: For percentile P over N values, pos = (P/100) * (N-1)
/// 2. **Interpolation**: Linear between the values at floor(pos) and ceil(pos)
/// 3. **Boundary Handling**: Indices are clamped to [0, N-1]
///
/// This is the conventional "linear" percentile method, so the 50th percentile
/// is the usual median (mean of the two middle values for even N).
///
/// ## Examples
///
/// ```rust
/// # use sched_analyzer::utils::percentile_sorted;
/// let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
/// assert_eq!(percentile_sorted(&values, 50.0), Some(3.0));
/// assert_eq!(percentile_sorted(&values, 95.0), Some(4.8));
/// assert_eq!(percentile_sorted(&[], 95.0), None);
/// ```
pub fn percentile_sorted(sorted: &[f64], percentile: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }

    let last = sorted.len() - 1;
    let position = (percentile / 100.0 * last as f64).clamp(0.0, last as f64);
    let lower_index = position.floor() as usize;
    let upper_index = (position.ceil() as usize).min(last);

    let lower_value = sorted[lower_index];
    if lower_index == upper_index {
        return Some(lower_value);
    }
    let upper_value = sorted[upper_index];
    let weight = position - lower_index as f64;
    // Rounding must not carry the result past the upper neighbour.
    Some((lower_value + weight * (upper_value - lower_value)).min(upper_value))
}

/// Jain's fairness index
///
/// J = (Σx)² / (N · Σx²), in (0, 1] for non-negative samples.
///
/// ## Special Cases
///
/// - **Empty input**: undefined, returns `None`
/// - **All samples equal** (including all zero): exactly `1.0`. The all-zero
///   case is 0/0 under the formula and is treated as degenerate-equal.
/// - **Any two samples differ**: strictly below `1.0`, capped at
///   [`UNEQUAL_FAIRNESS_CAP`] when near-equal samples round up to one.
///
/// Samples whose squares underflow or overflow are rescaled by their largest
/// magnitude and the index recomputed.
///
/// ```rust
/// # use sched_analyzer::utils::jain_fairness_index;
/// assert_eq!(jain_fairness_index(&[5.0, 5.0]), Some(1.0));
/// assert!(jain_fairness_index(&[1000.0, 1000.00001]).unwrap() < 1.0);
/// ```
pub fn jain_fairness_index(values: &[f64]) -> Option<f64> {
    let first = *values.first()?;
    if values.iter().all(|&x| x == first) {
        return Some(1.0);
    }

    let mut index = raw_jain(values, 1.0);
    if !index.is_finite() {
        let scale = values.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()));
        index = raw_jain(values, scale);
    }
    Some(index.min(UNEQUAL_FAIRNESS_CAP))
}

fn raw_jain(values: &[f64], scale: f64) -> f64 {
    let sum: f64 = values.iter().map(|x| x / scale).sum();
    let sum_sq: f64 = values.iter().map(|x| (x / scale).powi(2)).sum();
    (sum * sum) / (values.len() as f64 * sum_sq)
}

/// Largest `f64` below `1.0`; the ceiling of the fairness index for unequal samples.
pub const UNEQUAL_FAIRNESS_CAP: f64 = 1.0 - f64::EPSILON / 2.0;

/// Completed requests per second over a single observation window.
///
/// Returns `0.0` when the window is empty or has no positive length.
pub fn window_throughput(count: usize, span_secs: f64) -> f64 {
    if count == 0 || span_secs <= 0.0 {
        return 0.0;
    }
    count as f64 / span_secs
}

/// Format an optional statistic, rendering undefined values as `"n/a"`.
pub fn format_optional(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", precision, v),
        None => "n/a".to_string(),
    }
}

/// Format a request rate in a human-readable way
///
/// Uses decimal scaling (powers of 1000):
/// - Requests/sec: < 1,000 (e.g., "750.00 req/s")
/// - Thousands: < 1,000,000 (e.g., "15.50K req/s")
/// - Millions: ≥ 1,000,000 (e.g., "2.30M req/s")
///
/// ## Examples
///
/// ```rust
/// # use sched_analyzer::utils::format_request_rate;
/// assert_eq!(format_request_rate(750.0), "750.00 req/s");
/// assert_eq!(format_request_rate(15500.0), "15.50K req/s");
/// assert_eq!(format_request_rate(2300000.0), "2.30M req/s");
/// ```
pub fn format_request_rate(requests_per_second: f64) -> String {
    if requests_per_second < 1000.0 {
        format!("{:.2} req/s", requests_per_second)
    } else if requests_per_second < 1_000_000.0 {
        format!("{:.2}K req/s", requests_per_second / 1000.0)
    } else {
        format!("{:.2}M req/s", requests_per_second / 1_000_000.0)
    }
}

/// Format a table row
///
/// Left-aligns each column within its width and separates columns with pipe
/// characters. Columns beyond the width list fall back to a width of 10.
///
/// ## Examples
///
/// ```rust
/// # use sched_analyzer::utils::{format_table_row, format_table_separator};
/// let widths = [8, 6];
/// assert_eq!(format_table_separator(&widths), "+----------+--------+");
/// assert_eq!(format_table_row(&["FCFS", "1.50"], &widths), "| FCFS     | 1.50   |");
/// ```
pub fn format_table_row(columns: &[&str], widths: &[usize]) -> String {
    let mut row = String::from("|");
    for (i, column) in columns.iter().enumerate() {
        let width = widths.get(i).copied().unwrap_or(10);
        let _ = write!(row, " {:width$} |", column, width = width);
    }
    row
}

/// Format a table separator matching the column widths of [`format_table_row`].
pub fn format_table_separator(widths: &[usize]) -> String {
    let mut line = String::from("+");
    for &width in widths {
        line.push_str(&"-".repeat(width + 2));
        line.push('+');
    }
    line
}
