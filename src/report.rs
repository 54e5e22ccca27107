//! Console rendering of an [`AnalysisReport`].
//!
//! Produces the same comparison the plotting scripts summarize: a baseline
//! policy table with per-metric winners, one table per swept series, and the
//! list of warnings. Rendering returns a `String`; printing is left to the
//! caller.

use crate::collection::AnalysisReport;
use crate::comparison::{BaselineComparison, ComparativeSeries};
use crate::experiment::Dimension;
use crate::utils::{format_optional, format_request_rate, format_table_row, format_table_separator};
use colored::*;
use std::fmt::Write;

const BASELINE_WIDTHS: [usize; 7] = [10, 8, 10, 10, 10, 10, 14];
const SERIES_WIDTHS: [usize; 9] = [11, 8, 10, 10, 10, 10, 14, 8, 10];

/// Render the full report.
pub fn render_report(report: &AnalysisReport) -> String {
    let mut out = String::new();

    if let Some(baseline) = &report.baseline {
        render_baseline(&mut out, baseline);
    }
    for series in &report.series {
        render_series(&mut out, series);
    }

    if !report.warnings.is_empty() {
        let _ = writeln!(out, "{}", "Warnings".yellow().bold());
        for warning in &report.warnings {
            let _ = writeln!(out, "  - {}", warning);
        }
    }
    out
}

fn render_baseline(out: &mut String, baseline: &BaselineComparison) {
    let _ = writeln!(out, "{}", "Baseline Comparison".bold());
    let _ = writeln!(out, "{}", format_table_separator(&BASELINE_WIDTHS));
    let _ = writeln!(
        out,
        "{}",
        format_table_row(
            &["Policy", "Requests", "Mean ms", "Median ms", "Std Dev", "Waiting ms", "Throughput"],
            &BASELINE_WIDTHS
        )
    );
    let _ = writeln!(out, "{}", format_table_separator(&BASELINE_WIDTHS));

    for entry in &baseline.entries {
        let m = &entry.metrics;
        let count = m.count.to_string();
        let mean = format_optional(m.mean_response_ms(), 3);
        let median = format_optional(m.median_response_ms(), 3);
        let std_dev = format_optional(m.std_dev_response_ms(), 3);
        let waiting = format_optional(m.mean_waiting_ms(), 3);
        let throughput = format_request_rate(m.throughput_req_per_s);
        let _ = writeln!(
            out,
            "{}",
            format_table_row(
                &[&entry.label, &count, &mean, &median, &std_dev, &waiting, &throughput],
                &BASELINE_WIDTHS
            )
        );
    }
    let _ = writeln!(out, "{}", format_table_separator(&BASELINE_WIDTHS));

    let winners = [
        ("Best mean response", &baseline.best_mean_response),
        ("Best median response", &baseline.best_median_response),
        ("Most consistent", &baseline.most_consistent),
        ("Best throughput", &baseline.best_throughput),
        ("Fairest", &baseline.fairest),
    ];
    for (title, winner) in winners {
        let name = winner.as_deref().unwrap_or("n/a");
        let _ = writeln!(out, "  {:<22} {}", format!("{}:", title), name.green());
    }
    out.push('\n');
}

fn render_series(out: &mut String, series: &ComparativeSeries) {
    let title = format!("{} by {}", series.scheduler, series.dimension.axis_label());
    let _ = writeln!(out, "{}", title.bold());
    let _ = writeln!(out, "{}", format_table_separator(&SERIES_WIDTHS));

    // Packet-size runs are compared on service time, everything else on response time.
    let mean_column = match series.dimension {
        Dimension::PacketSize => "Service ms",
        _ => "Mean ms",
    };
    let _ = writeln!(
        out,
        "{}",
        format_table_row(
            &[
                series.dimension.axis_label(),
                "Requests",
                mean_column,
                "P95 ms",
                "P99 ms",
                "Waiting ms",
                "Throughput",
                "Fairness",
                "Speedup",
            ],
            &SERIES_WIDTHS
        )
    );
    let _ = writeln!(out, "{}", format_table_separator(&SERIES_WIDTHS));

    for point in &series.points {
        let m = &point.metrics;
        let value = point.dimension_value.to_string();
        let count = m.count.to_string();
        let mean = match series.dimension {
            Dimension::PacketSize => format_optional(m.mean_service_ms(), 3),
            _ => format_optional(m.mean_response_ms(), 3),
        };
        let p95 = format_optional(m.percentiles().map(|p| p.p95_ms), 3);
        let p99 = format_optional(m.percentiles().map(|p| p.p99_ms), 3);
        let waiting = format_optional(m.mean_waiting_ms(), 3);
        let throughput = format_request_rate(m.throughput_req_per_s);
        let fairness = format_optional(m.fairness_index(), 4);
        let speedup = match point.scaling {
            Some(s) => format!("{:.2}x", s.speedup),
            None => "-".to_string(),
        };
        let _ = writeln!(
            out,
            "{}",
            format_table_row(
                &[&value, &count, &mean, &p95, &p99, &waiting, &throughput, &fairness, &speedup],
                &SERIES_WIDTHS
            )
        );
    }
    let _ = writeln!(out, "{}", format_table_separator(&SERIES_WIDTHS));
    out.push('\n');
}
