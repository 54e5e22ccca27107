use crate::experiment::{Dimension, RawIdentity, Scheduler};
use anyhow::{bail, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Scheduling Experiment Analyzer - derived metrics and comparisons for simulator runs
#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
pub struct Args {
    /// Experiment run to analyze, as SCHED:DIM[:VALUE][:qQUANTUM]=PATH (repeatable)
    ///
    /// Examples: fcfs:baseline=exp1_fcfs.csv, rr:baseline:q5=exp1_rr_q5.csv,
    /// sjf:servers:4=exp3_sjf_s4.csv
    #[clap(short = 'r', long = "run", value_parser = parse_run_spec, help_heading = "Input")]
    pub runs: Vec<RunSpec>,

    /// Group known to have no data, as SCHED:DIM (repeatable)
    #[clap(long = "missing", value_parser = parse_group_spec, help_heading = "Input")]
    pub missing: Vec<GroupSpec>,

    /// Output file for results (JSON format)
    #[clap(short = 'o', long, default_value = crate::defaults::OUTPUT_FILE, help_heading = "Output")]
    pub output_file: PathBuf,

    /// Write the baseline policy summary table to this CSV file
    #[clap(long, help_heading = "Output")]
    pub summary_csv: Option<PathBuf>,

    /// Write every series point to this CSV file
    #[clap(long, help_heading = "Output")]
    pub series_csv: Option<PathBuf>,

    /// Worker threads for metric computation (default: one per core)
    #[clap(short = 't', long)]
    pub threads: Option<usize>,

    /// Keep analyzing the remaining runs when one fails to load or validate
    #[clap(long, default_value_t = false)]
    pub continue_on_error: bool,

    /// Verbose output
    #[clap(short = 'v', long, default_value_t = false, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print warnings and errors
    #[clap(short = 'q', long, default_value_t = false)]
    pub quiet: bool,
}

/// One `--run` argument: an identity and the metrics file it was recorded in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSpec {
    pub identity: RawIdentity,
    pub path: PathBuf,
}

impl fmt::Display for RunSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.identity, self.path.display())
    }
}

/// One `--missing` argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub scheduler: Scheduler,
    pub dimension: Dimension,
}

/// Validated configuration for one analysis
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub runs: Vec<RunSpec>,
    pub missing: Vec<GroupSpec>,
    pub output_file: PathBuf,
    pub summary_csv: Option<PathBuf>,
    pub series_csv: Option<PathBuf>,
    pub threads: Option<usize>,
    pub continue_on_error: bool,
}

impl AnalysisConfig {
    pub fn from_args(args: &Args) -> Result<Self> {
        if args.runs.is_empty() {
            bail!("No runs given; pass at least one --run SCHED:DIM[:VALUE]=PATH");
        }
        if args.threads == Some(0) {
            bail!("--threads must be at least 1");
        }

        Ok(Self {
            runs: args.runs.clone(),
            missing: args.missing.clone(),
            output_file: args.output_file.clone(),
            summary_csv: args.summary_csv.clone(),
            series_csv: args.series_csv.clone(),
            threads: args.threads,
            continue_on_error: args.continue_on_error,
        })
    }
}

/// Parse a run spec (e.g. "fcfs:servers:4=exp3.csv", "rr:baseline:q5=exp1.csv")
///
/// Scheduler and dimension tokens are kept verbatim here; unknown tokens are
/// reported by the analysis so they can be skipped with `--continue-on-error`.
fn parse_run_spec(s: &str) -> Result<RunSpec, String> {
    let (identity, path) = s
        .split_once('=')
        .ok_or_else(|| format!("Expected SCHED:DIM[:VALUE][:qQUANTUM]=PATH, got '{}'", s))?;

    let path = path.trim();
    if path.is_empty() {
        return Err(format!("Missing file path in '{}'", s));
    }

    let mut parts = identity.split(':').map(str::trim);
    let scheduler = parts.next().filter(|p| !p.is_empty());
    let dimension = parts.next().filter(|p| !p.is_empty());
    let (Some(scheduler), Some(dimension)) = (scheduler, dimension) else {
        return Err(format!("Expected SCHED:DIM before '=', got '{}'", identity));
    };

    let mut raw = RawIdentity::new(scheduler, dimension, None);
    for part in parts {
        if let Some(quantum) = part.strip_prefix(['q', 'Q']) {
            if raw.quantum.is_some() {
                return Err(format!("Quantum given twice in '{}'", identity));
            }
            raw.quantum = Some(
                quantum
                    .parse()
                    .map_err(|_| format!("Invalid quantum: {}", quantum))?,
            );
        } else {
            if raw.dimension_value.is_some() {
                return Err(format!("Dimension value given twice in '{}'", identity));
            }
            raw.dimension_value = Some(
                part.parse()
                    .map_err(|_| format!("Invalid dimension value: {}", part))?,
            );
        }
    }

    Ok(RunSpec {
        identity: raw,
        path: PathBuf::from(path),
    })
}

/// Parse a group spec (e.g. "sjf:servers")
fn parse_group_spec(s: &str) -> Result<GroupSpec, String> {
    let (scheduler, dimension) = s
        .split_once(':')
        .ok_or_else(|| format!("Expected SCHED:DIM, got '{}'", s))?;
    Ok(GroupSpec {
        scheduler: scheduler.parse().map_err(|e| format!("{}", e))?,
        dimension: dimension.parse().map_err(|e| format!("{}", e))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_spec() {
        let spec = parse_run_spec("fcfs:servers:4=results/exp3_fcfs_s4.csv").unwrap();
        assert_eq!(spec.identity, RawIdentity::new("fcfs", "servers", Some(4)));
        assert_eq!(spec.path, PathBuf::from("results/exp3_fcfs_s4.csv"));

        let spec = parse_run_spec("rr:baseline:q10=exp1_rr_q10.csv").unwrap();
        assert_eq!(
            spec.identity,
            RawIdentity::new("rr", "baseline", None).with_quantum(10)
        );
        assert_eq!(spec.to_string(), "rr:baseline:q10=exp1_rr_q10.csv");

        let spec = parse_run_spec("RR:clients:8:q5=c.csv").unwrap();
        assert_eq!(spec.identity.dimension_value, Some(8));
        assert_eq!(spec.identity.quantum, Some(5));
    }

    #[test]
    fn test_parse_run_spec_keeps_unknown_tokens() {
        let spec = parse_run_spec("lottery:clients:2=x.csv").unwrap();
        assert_eq!(spec.identity.scheduler, "lottery");
    }

    #[test]
    fn test_parse_run_spec_errors() {
        assert!(parse_run_spec("fcfs:servers:4").is_err());
        assert!(parse_run_spec("fcfs:servers:4=").is_err());
        assert!(parse_run_spec("fcfs=x.csv").is_err());
        assert!(parse_run_spec("fcfs:servers:four=x.csv").is_err());
        assert!(parse_run_spec("fcfs:servers:4:8=x.csv").is_err());
        assert!(parse_run_spec("rr:baseline:q5:q10=x.csv").is_err());
        assert!(parse_run_spec("rr:baseline:qx=x.csv").is_err());
    }

    #[test]
    fn test_parse_group_spec() {
        assert_eq!(
            parse_group_spec("sjf:packet_size").unwrap(),
            GroupSpec {
                scheduler: Scheduler::Sjf,
                dimension: Dimension::PacketSize
            }
        );
        assert!(parse_group_spec("sjf").is_err());
        assert!(parse_group_spec("edf:servers").is_err());
    }

    #[test]
    fn test_config_from_args() {
        let args = Args::parse_from([
            "sched-analyzer",
            "--run",
            "fcfs:baseline=a.csv",
            "-r",
            "sjf:baseline=b.csv",
            "--missing",
            "rr:servers",
            "--threads",
            "2",
        ]);
        let config = AnalysisConfig::from_args(&args).unwrap();
        assert_eq!(config.runs.len(), 2);
        assert_eq!(config.missing.len(), 1);
        assert_eq!(config.threads, Some(2));
        assert_eq!(config.output_file, PathBuf::from(crate::defaults::OUTPUT_FILE));
        assert!(!config.continue_on_error);
    }

    #[test]
    fn test_config_rejects_bad_args() {
        let args = Args::parse_from(["sched-analyzer"]);
        assert!(AnalysisConfig::from_args(&args).is_err());

        let args = Args::parse_from(["sched-analyzer", "-r", "fcfs:baseline=a.csv", "-t", "0"]);
        assert!(AnalysisConfig::from_args(&args).is_err());
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Args::try_parse_from(["sched-analyzer", "-v", "-q"]).is_err());
    }
}
